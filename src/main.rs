// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use ledger_desk::{
    logging::{self, LogTarget},
    open_source, verify_count, Config, DashboardMetrics, Formatter, RecordSource, Rounding,
    SqliteStore,
};

#[derive(Parser)]
#[command(name = "ledger-desk", version = ledger_desk::VERSION, about = "Terminal dashboard for company books")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the terminal dashboard (default)
    Ui,
    /// Import companies, ledgers, vouchers and stock from a directory of CSV exports
    Import {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Print the dashboard figures for one company
    Metrics {
        /// Company id; the configured company or the first one when omitted
        #[arg(long)]
        company: Option<String>,
    },
    /// Abbreviate an amount the way the dashboard does
    Format {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        #[arg(long)]
        rounding: Option<Rounding>,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Write a commented config file if none exists
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => run_ui_mode(&config),
        Command::Import { dir } => {
            let _guard = logging::init(&config, LogTarget::Stderr)?;
            run_import(&config, &dir)
        }
        Command::Metrics { company } => {
            let _guard = logging::init(&config, LogTarget::Stderr)?;
            run_metrics(&config, company)
        }
        Command::Format { amount, rounding, prefix } => {
            let formatter = Formatter::new(prefix.unwrap_or_else(|| config.currency_symbol.clone()))
                .with_rounding(rounding.unwrap_or(config.rounding));
            let abbreviated = formatter.try_format(amount)?;
            println!("{}", abbreviated);
            println!("{}", formatter.format_full(amount));
            Ok(())
        }
        Command::InitConfig => {
            match Config::ensure_config_exists()? {
                Some(path) => println!("✓ Wrote {}", path.display()),
                None => println!("Config file already exists (or no home directory)"),
            }
            Ok(())
        }
    }
}

fn run_import(config: &Config, dir: &std::path::Path) -> Result<()> {
    println!("🗄️  Importing books from {}", dir.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let summary = store
        .import_dir(dir)
        .with_context(|| format!("importing {}", dir.display()))?;

    let rows = [
        ("companies", summary.companies),
        ("ledgers", summary.ledgers),
        ("stock_items", summary.stock_items),
        ("vouchers", summary.vouchers),
        ("voucher_items", summary.voucher_items),
    ];
    for (table, count) in rows {
        let stored = verify_count(store.connection(), table)?;
        println!(
            "✓ {:<14} {:>6} inserted  {:>6} duplicates  {:>8} stored",
            table, count.inserted, count.duplicates, stored
        );
    }

    info!(inserted = summary.total_inserted(), db = %config.db_path.display(), "import complete");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {} new records", summary.total_inserted());
    Ok(())
}

fn run_metrics(config: &Config, company: Option<String>) -> Result<()> {
    let source = open_source(config)?;

    let companies = source.companies()?;
    let wanted = company.or_else(|| config.company_id.clone());
    let company = match &wanted {
        Some(id) => companies
            .iter()
            .find(|c| &c.id == id)
            .with_context(|| format!("company '{}' not found", id))?,
        None => companies
            .first()
            .context("no companies found; run `ledger-desk import --dir <csv dir>` first")?,
    };

    let metrics = DashboardMetrics::load(source.as_ref(), &company.id)?;
    let formatter = Formatter::new(company.currency_symbol.clone()).with_rounding(config.rounding);

    println!("📊 {}  (FY {})", company.name, company.financial_year_label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (label, value) in metrics.cards(&formatter) {
        println!("  {:<14} {}", label, value);
    }
    println!("  {:<14} {}", "Vouchers", metrics.voucher_count);
    println!("  {:<14} {}", "Low stock", metrics.low_stock_count);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    // The dashboard owns the terminal, so logs go to a file
    let _guard = logging::init(config, LogTarget::File)?;
    info!(version = ledger_desk::VERSION, "starting dashboard");

    let source = open_source(config).context("opening the books")?;
    let mut app = ui::App::new(config.formatter(), config.company_id.clone());
    ui::run_ui(&mut app, source.as_ref(), config.dispatch_options())?;

    info!("dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the JSON API: cargo run --bin ledger-desk-server --features server");
    std::process::exit(1);
}
