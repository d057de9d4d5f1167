use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;
use tracing::{debug, info};

use ledger_desk::{
    Binding, Company, DashboardMetrics, DispatchOptions, Fetch, Formatter, KeyBus, KeyPress,
    Ledger, RecordSource, ShortcutDispatcher, Shortcuts, StockItem, Voucher, VoucherItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Ledgers,
    Vouchers,
    Inventory,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Dashboard, Page::Ledgers, Page::Vouchers, Page::Inventory];

    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Ledgers,
            Page::Ledgers => Page::Vouchers,
            Page::Vouchers => Page::Inventory,
            Page::Inventory => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Inventory,
            Page::Ledgers => Page::Dashboard,
            Page::Vouchers => Page::Ledgers,
            Page::Inventory => Page::Vouchers,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Ledgers => "Ledgers",
            Page::Vouchers => "Vouchers",
            Page::Inventory => "Inventory",
        }
    }

    fn shortcut(&self) -> &str {
        match self {
            Page::Dashboard => "F1",
            Page::Ledgers => "F2",
            Page::Vouchers => "F3",
            Page::Inventory => "F4",
        }
    }
}

/// What a shortcut callback asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Show(Page),
    NextPage,
    PreviousPage,
    Reload,
    ToggleDetail,
    ToggleAmounts,
}

/// Callbacks only queue actions; the event loop applies them afterwards
pub fn dashboard_shortcuts(queue: &Rc<RefCell<Vec<Action>>>) -> Shortcuts {
    let bindings = [
        (Binding::F1, Action::Show(Page::Dashboard)),
        (Binding::F2, Action::Show(Page::Ledgers)),
        (Binding::F3, Action::Show(Page::Vouchers)),
        (Binding::F4, Action::Show(Page::Inventory)),
        (Binding::F5, Action::Reload),
        (Binding::F6, Action::ToggleDetail),
        (Binding::F7, Action::ToggleAmounts),
        (Binding::F8, Action::PreviousPage),
        (Binding::F9, Action::NextPage),
        (Binding::CtrlG, Action::Show(Page::Dashboard)),
        (Binding::AltR, Action::Reload),
        (Binding::AltG, Action::ToggleDetail),
    ];

    bindings
        .into_iter()
        .fold(Shortcuts::new(), |shortcuts, (binding, action)| {
            let queue = Rc::clone(queue);
            shortcuts.on(binding, move || queue.borrow_mut().push(action))
        })
}

/// Translate a terminal key event into the host key identifiers the
/// dispatcher matches on ("F1", "g", "Enter", ...)
pub fn key_press_from(key: &KeyEvent) -> Option<KeyPress> {
    let name = match key.code {
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Tab | KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        _ => return None,
    };

    let mut press = KeyPress::new(name);
    press.ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    press.alt = key.modifiers.contains(KeyModifiers::ALT);
    press.shift =
        key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab;
    Some(press)
}

pub struct App {
    pub company: Option<Company>,
    pub companies: Fetch<Company>,
    pub ledgers: Fetch<Ledger>,
    pub vouchers: Fetch<Voucher>,
    pub voucher_items: Fetch<VoucherItem>,
    pub stock: Fetch<StockItem>,
    pub metrics: DashboardMetrics,
    pub current_page: Page,
    pub ledger_state: TableState,
    pub voucher_state: TableState,
    pub stock_state: TableState,
    pub show_detail: bool,
    /// Abbreviated (1.23 Cr) or full (1,23,45,678.00) amounts in tables
    pub abbreviate: bool,
    pub formatter: Formatter,
    pub status: Option<String>,
    preferred_company: Option<String>,
    items_for: Option<String>,
}

impl App {
    pub fn new(formatter: Formatter, preferred_company: Option<String>) -> Self {
        Self {
            company: None,
            companies: Fetch::Loading,
            ledgers: Fetch::Loading,
            vouchers: Fetch::Loading,
            voucher_items: Fetch::Ready(Vec::new()),
            stock: Fetch::Loading,
            metrics: DashboardMetrics::default(),
            current_page: Page::Dashboard,
            ledger_state: TableState::default(),
            voucher_state: TableState::default(),
            stock_state: TableState::default(),
            show_detail: false,
            abbreviate: true,
            formatter,
            status: None,
            preferred_company,
            items_for: None,
        }
    }

    /// Fetch every collection for the selected company
    pub fn reload(&mut self, source: &dyn RecordSource) {
        self.companies = Fetch::from_result(source.companies());

        let company = {
            let companies = self.companies.data();
            self.preferred_company
                .as_ref()
                .and_then(|id| companies.iter().find(|c| &c.id == id))
                .or_else(|| companies.first())
                .cloned()
        };

        match &company {
            Some(company) => {
                self.ledgers = Fetch::from_result(source.ledgers(&company.id));
                self.vouchers = Fetch::from_result(source.vouchers(&company.id));
                self.stock = Fetch::from_result(source.stock_items(&company.id));
                self.formatter = Formatter::new(company.currency_symbol.clone())
                    .with_rounding(self.formatter.rounding());
                self.status = None;
                info!(company = %company.name, vouchers = self.vouchers.data().len(), "books loaded");
            }
            None => {
                self.ledgers = Fetch::Ready(Vec::new());
                self.vouchers = Fetch::Ready(Vec::new());
                self.stock = Fetch::Ready(Vec::new());
                self.status = Some(match self.companies.error() {
                    Some(err) => format!("Load failed: {}", err),
                    None => "No companies found. Run `ledger-desk import --dir <csv dir>`".to_string(),
                });
            }
        }

        self.company = company;
        self.metrics = DashboardMetrics::compute(self.ledgers.data(), self.vouchers.data(), self.stock.data());

        reset_selection(&mut self.ledger_state, self.ledgers.data().len());
        reset_selection(&mut self.voucher_state, self.vouchers.data().len());
        reset_selection(&mut self.stock_state, self.stock.data().len());

        self.items_for = None;
        self.sync_detail(source);
    }

    pub fn apply(&mut self, action: Action, source: &dyn RecordSource) {
        debug!(?action, "applying action");
        match action {
            Action::Show(page) => self.current_page = page,
            Action::NextPage => self.current_page = self.current_page.next(),
            Action::PreviousPage => self.current_page = self.current_page.previous(),
            Action::Reload => self.reload(source),
            Action::ToggleDetail => self.show_detail = !self.show_detail,
            Action::ToggleAmounts => self.abbreviate = !self.abbreviate,
        }
        self.sync_detail(source);
    }

    /// Keep the voucher-items panel in step with the selected voucher
    pub fn sync_detail(&mut self, source: &dyn RecordSource) {
        if !self.show_detail || self.current_page != Page::Vouchers {
            return;
        }

        let selected = self.selected_voucher().map(|v| v.id.clone());
        if selected == self.items_for {
            return;
        }

        self.voucher_items = match &selected {
            Some(id) => Fetch::from_result(source.voucher_items(id)),
            None => Fetch::Ready(Vec::new()),
        };
        self.items_for = selected;
    }

    pub fn selected_voucher(&self) -> Option<&Voucher> {
        self.voucher_state
            .selected()
            .and_then(|i| self.vouchers.data().get(i))
    }

    pub fn ledger_name(&self, ledger_id: &str) -> Option<&str> {
        self.ledgers
            .data()
            .iter()
            .find(|l| l.id == ledger_id)
            .map(|l| l.name.as_str())
    }

    pub fn stock_name(&self, stock_item_id: &str) -> Option<&str> {
        self.stock
            .data()
            .iter()
            .find(|s| s.id == stock_item_id)
            .map(|s| s.name.as_str())
    }

    /// Amount in the current display mode
    pub fn amount(&self, value: f64) -> String {
        if self.abbreviate {
            self.formatter.format(value)
        } else {
            self.formatter.format_full(value)
        }
    }

    fn current_table(&mut self) -> Option<(&mut TableState, usize)> {
        match self.current_page {
            Page::Dashboard => None,
            Page::Ledgers => Some((&mut self.ledger_state, self.ledgers.data().len())),
            Page::Vouchers => Some((&mut self.voucher_state, self.vouchers.data().len())),
            Page::Inventory => Some((&mut self.stock_state, self.stock.data().len())),
        }
    }

    pub fn next(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(i) if i >= len - 1 => 0,
                Some(i) => i + 1,
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(0) => len - 1,
                Some(i) => i - 1,
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn page_down(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len == 0 {
                return;
            }
            let i = state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
            state.select(Some(i));
        }
    }

    pub fn page_up(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len == 0 {
                return;
            }
            let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
            state.select(Some(i));
        }
    }

    pub fn home(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len > 0 {
                state.select(Some(0));
            }
        }
    }

    pub fn end(&mut self) {
        if let Some((state, len)) = self.current_table() {
            if len > 0 {
                state.select(Some(len - 1));
            }
        }
    }
}

fn reset_selection(state: &mut TableState, len: usize) {
    state.select(if len == 0 { None } else { Some(0) });
}

pub fn run_ui(app: &mut App, source: &dyn RecordSource, options: DispatchOptions) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, source, options);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    source: &dyn RecordSource,
    options: DispatchOptions,
) -> Result<()> {
    let bus = KeyBus::new();
    let queue: Rc<RefCell<Vec<Action>>> = Rc::default();

    // Released when this function returns
    let mut dispatcher = ShortcutDispatcher::new(bus.clone(), options);
    dispatcher.start(dashboard_shortcuts(&queue));

    app.reload(source);

    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let mut suppressed = false;
        if let Some(mut press) = key_press_from(&key) {
            bus.emit(&mut press);
            suppressed = press.default_prevented();
        }

        let actions: Vec<Action> = queue.borrow_mut().drain(..).collect();
        for action in actions {
            app.apply(action, source);
        }

        if suppressed {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Enter => app.apply(Action::ToggleDetail, source),
            KeyCode::BackTab => app.apply(Action::PreviousPage, source),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    app.apply(Action::PreviousPage, source);
                } else {
                    app.apply(Action::NextPage, source);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => app.home(),
            KeyCode::End => app.end(),
            _ => {}
        }

        app.sync_detail(source);
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Vouchers {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_vouchers(f, content_chunks[0], app);
        render_voucher_detail(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Dashboard => render_dashboard(f, chunks[1], app),
            Page::Ledgers => render_ledgers(f, chunks[1], app),
            Page::Vouchers => render_vouchers(f, chunks[1], app),
            Page::Inventory => render_inventory(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|h| Cell::from(*h).style(header_style())))
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn titled_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(format!("{} {}", page.shortcut(), page.title()), style));
    }

    tab_spans.push(Span::raw("  |  "));
    match &app.company {
        Some(company) => {
            tab_spans.push(Span::styled(company.name.clone(), Style::default().fg(Color::White)));
            tab_spans.push(Span::raw("  "));
            tab_spans.push(Span::styled(
                format!("FY {}", company.financial_year_label()),
                Style::default().fg(Color::Cyan),
            ));
        }
        None => tab_spans.push(Span::styled("No company", Style::default().fg(Color::Red))),
    }

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    if app.ledgers.is_loading() || app.vouchers.is_loading() || app.stock.is_loading() {
        f.render_widget(Paragraph::new("  Loading…").block(titled_block(" Dashboard ".to_string())), area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    let cards = app.metrics.cards(&app.formatter);
    for (row_index, row_cards) in cards.chunks(3).enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[row_index]);

        for (column, (label, value)) in row_cards.iter().enumerate() {
            let card = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  {}", value),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(format!(" {} ", label)),
            );
            f.render_widget(card, columns[column]);
        }
    }

    let margin = app.metrics.gross_margin();
    let summary = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Vouchers: ", Style::default().fg(Color::Cyan)),
            Span::raw(app.metrics.voucher_count.to_string()),
            Span::raw("    "),
            Span::styled("Low stock items: ", Style::default().fg(Color::Cyan)),
            Span::styled(
                app.metrics.low_stock_count.to_string(),
                Style::default().fg(if app.metrics.low_stock_count > 0 { Color::Red } else { Color::Green }),
            ),
            Span::raw("    "),
            Span::styled("Sales - Purchases: ", Style::default().fg(Color::Cyan)),
            Span::styled(
                app.formatter.format(margin),
                Style::default().fg(if margin < 0.0 { Color::Red } else { Color::Green }),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(summary).block(titled_block(" Summary ".to_string())), rows[2]);
}

fn render_ledgers(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .ledgers
        .data()
        .iter()
        .map(|ledger| {
            let color = if ledger.closing_balance < 0.0 { Color::Red } else { Color::Green };
            Row::new(vec![
                Cell::from(truncate(&ledger.name, 30)),
                Cell::from(truncate(ledger.group.as_str(), 22)),
                Cell::from(app.amount(ledger.opening_balance)),
                Cell::from(app.amount(ledger.closing_balance)).style(Style::default().fg(color)),
                Cell::from(ledger.balance_side()).style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(24),
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Length(4),
        ],
    )
    .header(header_row(&["Ledger", "Group", "Opening", "Closing", ""]))
    .block(titled_block(fetch_title("Ledgers", &app.ledgers)))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.ledger_state);
}

fn render_vouchers(f: &mut Frame, area: Rect, app: &mut App) {
    let party_names: HashMap<&str, &str> = app
        .ledgers
        .data()
        .iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect();

    let rows: Vec<Row> = app
        .vouchers
        .data()
        .iter()
        .map(|voucher| {
            let party = voucher
                .party_ledger_id
                .as_deref()
                .and_then(|id| party_names.get(id).copied())
                .unwrap_or("-");
            Row::new(vec![
                Cell::from(voucher.date.format("%d-%m-%Y").to_string()),
                Cell::from(truncate(&voucher.voucher_number, 16)),
                Cell::from(voucher.voucher_type.as_str()),
                Cell::from(truncate(party, 28)),
                Cell::from(app.amount(voucher.amount)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(30),
            Constraint::Length(20),
        ],
    )
    .header(header_row(&["Date", "Number", "Type", "Party", "Amount"]))
    .block(titled_block(fetch_title("Vouchers", &app.vouchers)))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.voucher_state);
}

fn render_voucher_detail(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Voucher Details ");

    let Some(voucher) = app.selected_voucher() else {
        f.render_widget(Paragraph::new("No voucher selected").block(block), area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![label("  Number: "), Span::raw(voucher.voucher_number.clone())]),
        Line::from(vec![label("  Type: "), Span::raw(voucher.voucher_type.as_str())]),
        Line::from(vec![label("  Date: "), Span::raw(voucher.date.format("%d %b %Y").to_string())]),
        Line::from(vec![
            label("  Amount: "),
            Span::styled(app.formatter.format_full(voucher.amount), Style::default().fg(Color::Green)),
        ]),
    ];

    if let Some(party) = voucher.party_ledger_id.as_deref() {
        content.push(Line::from(vec![
            label("  Party: "),
            Span::raw(app.ledger_name(party).unwrap_or(party).to_string()),
        ]));
    }
    if !voucher.narration.is_empty() {
        content.push(Line::from(vec![
            label("  Narration: "),
            Span::styled(
                voucher.narration.clone(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(Span::styled(
        "  ITEMS",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )));
    content.push(Line::from(""));

    if app.voucher_items.is_loading() {
        content.push(Line::from("  Loading…"));
    } else if let Some(err) = app.voucher_items.error() {
        content.push(Line::from(Span::styled(format!("  {}", err), Style::default().fg(Color::Red))));
    } else if app.voucher_items.data().is_empty() {
        content.push(Line::from("  No line items"));
    }

    for item in app.voucher_items.data() {
        let name = match (&item.stock_item_id, &item.ledger_id) {
            (Some(id), _) => app.stock_name(id).unwrap_or(id),
            (None, Some(id)) => app.ledger_name(id).unwrap_or(id),
            (None, None) => "-",
        };
        let mut spans = vec![Span::raw(format!("  {} ", truncate(name, 22)))];
        if item.is_stock_line() {
            spans.push(Span::styled(
                format!("{} × {} ", item.quantity, app.formatter.format_full(item.rate)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::styled(app.formatter.format_full(item.amount), Style::default().fg(Color::Green)));
        content.push(Line::from(spans));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_inventory(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .stock
        .data()
        .iter()
        .map(|item| {
            let (status, color) = if item.is_low() {
                ("LOW", Color::Red)
            } else {
                ("OK", Color::Green)
            };
            Row::new(vec![
                Cell::from(truncate(&item.name, 30)),
                Cell::from(item.unit.clone()),
                Cell::from(format!("{}", item.quantity)),
                Cell::from(app.amount(item.rate)),
                Cell::from(app.amount(item.value())),
                Cell::from(status).style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(6),
        ],
    )
    .header(header_row(&["Item", "Unit", "Qty", "Rate", "Value", ""]))
    .block(titled_block(fetch_title("Inventory", &app.stock)))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.stock_state);
}

fn fetch_title<T>(name: &str, fetch: &Fetch<T>) -> String {
    match fetch {
        Fetch::Loading => format!(" {} (loading…) ", name),
        Fetch::Ready(rows) => format!(" {} ({}) ", name, rows.len()),
        Fetch::Failed(err) => format!(" {} (error: {}) ", name, err),
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Dashboard => (0, 0),
        Page::Ledgers => (app.ledger_state.selected().map(|i| i + 1).unwrap_or(0), app.ledgers.data().len()),
        Page::Vouchers => (app.voucher_state.selected().map(|i| i + 1).unwrap_or(0), app.vouchers.data().len()),
        Page::Inventory => (app.stock_state.selected().map(|i| i + 1).unwrap_or(0), app.stock.data().len()),
    };

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut status_spans = vec![];
    if app.current_page != Page::Dashboard {
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected, total),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if let Some(status) = &app.status {
        status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.extend([
        key("F1-F4"),
        Span::raw(" Pages | "),
        key("F5"),
        Span::raw(" Reload | "),
        key("F6"),
        Span::raw(" Details | "),
        key("F7"),
        Span::raw(if app.abbreviate { " Full amounts | " } else { " Short amounts | " }),
        key("↑/↓"),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ]);

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
