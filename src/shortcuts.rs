// Keyboard shortcut dispatch
//
// A fixed set of twelve bindings (F1-F9, Ctrl+G, Alt+R, Alt+G) evaluated as a
// declarative rule table against every key press delivered by a KeySource.
// Suppression rows and dispatch rows are separate entries and are all
// evaluated for every event, so one press can both suppress and dispatch.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

// ============================================================================
// KEY PRESS
// ============================================================================

/// A single key-press event from the host input source.
///
/// `key` is the host's key identifier: "F1", "g", "G", "Enter", ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    default_prevented: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
            default_prevented: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Cancel the host's default handling of this event
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

// ============================================================================
// BINDINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    CtrlG,
    AltR,
    AltG,
}

impl Binding {
    pub const ALL: [Binding; 12] = [
        Binding::F1,
        Binding::F2,
        Binding::F3,
        Binding::F4,
        Binding::F5,
        Binding::F6,
        Binding::F7,
        Binding::F8,
        Binding::F9,
        Binding::CtrlG,
        Binding::AltR,
        Binding::AltG,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Binding::F1 => "F1",
            Binding::F2 => "F2",
            Binding::F3 => "F3",
            Binding::F4 => "F4",
            Binding::F5 => "F5",
            Binding::F6 => "F6",
            Binding::F7 => "F7",
            Binding::F8 => "F8",
            Binding::F9 => "F9",
            Binding::CtrlG => "Ctrl+G",
            Binding::AltR => "Alt+R",
            Binding::AltG => "Alt+G",
        }
    }

    /// Matcher for this binding's dispatch row
    fn dispatch_match(&self, alt_g_case: AltGCase) -> KeyMatch {
        match self {
            Binding::CtrlG => KeyMatch::Ctrl("g"),
            Binding::AltR => KeyMatch::Alt("r"),
            Binding::AltG => match alt_g_case {
                AltGCase::Verbatim => KeyMatch::Alt("g"),
                AltGCase::Either => KeyMatch::AltIgnoreCase("g"),
            },
            // Function keys: exact key identifier, modifiers not consulted
            function_key => KeyMatch::Key(function_key.label()),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type Callback = Box<dyn FnMut()>;

/// Zero-or-one callback per binding
#[derive(Default)]
pub struct Shortcuts {
    callbacks: HashMap<Binding, Callback>,
}

impl Shortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a callback, replacing any previous one for the same binding
    pub fn on(mut self, binding: Binding, callback: impl FnMut() + 'static) -> Self {
        self.callbacks.insert(binding, Box::new(callback));
        self
    }

    pub fn is_bound(&self, binding: Binding) -> bool {
        self.callbacks.contains_key(&binding)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn invoke(&mut self, binding: Binding) -> bool {
        match self.callbacks.get_mut(&binding) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Shortcuts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.callbacks.keys().map(Binding::label).collect();
        bound.sort_unstable();
        f.debug_struct("Shortcuts").field("bound", &bound).finish()
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// How the Alt+G rows compare the key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AltGCase {
    /// Suppress on "G", dispatch on "g". Holding Alt does not change letter
    /// case on most hosts, so the two rows rarely agree on one event.
    #[default]
    Verbatim,
    /// Both rows accept "g" and "G"
    Either,
}

impl AltGCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AltGCase::Verbatim => "verbatim",
            AltGCase::Either => "either",
        }
    }
}

impl fmt::Display for AltGCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub alt_g_case: AltGCase,
    /// Suppress every key whose identifier starts with "F" (F10, F12, even a
    /// shifted "F") rather than only F1-F9
    pub broad_function_keys: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            alt_g_case: AltGCase::Verbatim,
            broad_function_keys: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// Key identifier starts with the prefix, any modifiers
    KeyPrefix(&'static str),
    /// Key identifier equals, any modifiers
    Key(&'static str),
    /// Key identifier is one of, any modifiers
    OneOf(&'static [&'static str]),
    /// Ctrl held and key identifier equals (case-sensitive)
    Ctrl(&'static str),
    /// Alt held and key identifier equals (case-sensitive)
    Alt(&'static str),
    /// Alt held and key identifier equals ignoring ASCII case
    AltIgnoreCase(&'static str),
}

impl KeyMatch {
    pub fn matches(&self, press: &KeyPress) -> bool {
        match *self {
            KeyMatch::KeyPrefix(prefix) => press.key.starts_with(prefix),
            KeyMatch::Key(key) => press.key == key,
            KeyMatch::OneOf(keys) => keys.contains(&press.key.as_str()),
            KeyMatch::Ctrl(key) => press.ctrl && press.key == key,
            KeyMatch::Alt(key) => press.alt && press.key == key,
            KeyMatch::AltIgnoreCase(key) => press.alt && press.key.eq_ignore_ascii_case(key),
        }
    }
}

const FUNCTION_KEYS: &[&str] = &["F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9"];

/// One row of the table: a predicate, whether it suppresses, and which
/// callback slot it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub matcher: KeyMatch,
    pub suppress: bool,
    pub slot: Option<Binding>,
}

impl Rule {
    fn suppress(matcher: KeyMatch) -> Self {
        Self {
            matcher,
            suppress: true,
            slot: None,
        }
    }

    fn dispatch(matcher: KeyMatch, binding: Binding) -> Self {
        Self {
            matcher,
            suppress: false,
            slot: Some(binding),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(options: &DispatchOptions) -> Self {
        let mut rules = Vec::with_capacity(4 + Binding::ALL.len());

        // Suppression rows
        if options.broad_function_keys {
            rules.push(Rule::suppress(KeyMatch::KeyPrefix("F")));
        } else {
            rules.push(Rule::suppress(KeyMatch::OneOf(FUNCTION_KEYS)));
        }
        rules.push(Rule::suppress(KeyMatch::Ctrl("g")));
        rules.push(Rule::suppress(KeyMatch::Alt("r")));
        rules.push(Rule::suppress(match options.alt_g_case {
            AltGCase::Verbatim => KeyMatch::Alt("G"),
            AltGCase::Either => KeyMatch::AltIgnoreCase("g"),
        }));

        // Dispatch rows
        for binding in Binding::ALL {
            rules.push(Rule::dispatch(binding.dispatch_match(options.alt_g_case), binding));
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every row against the press. Returns how many callbacks ran.
    pub fn apply(&self, press: &mut KeyPress, shortcuts: &mut Shortcuts) -> usize {
        let mut fired = 0;

        for rule in &self.rules {
            if !rule.matcher.matches(press) {
                continue;
            }

            if rule.suppress {
                press.prevent_default();
            }

            if let Some(binding) = rule.slot {
                if shortcuts.invoke(binding) {
                    trace!(%binding, "shortcut fired");
                    fired += 1;
                }
            }
        }

        fired
    }
}

// ============================================================================
// EVENT SOURCE
// ============================================================================

pub type Listener = Rc<RefCell<dyn FnMut(&mut KeyPress)>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Host input event source
pub trait KeySource: Clone {
    fn subscribe(&self, listener: Listener) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// In-process key event source. Cloning shares the same listener list.
#[derive(Clone, Default)]
pub struct KeyBus {
    inner: Rc<RefCell<BusInner>>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl KeyBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a press to every listener in subscription order
    pub fn emit(&self, press: &mut KeyPress) {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (&mut *listener)(press),
                Err(_) => warn!(key = %press.key, "skipping re-entrant key listener"),
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl KeySource for KeyBus {
    fn subscribe(&self, listener: Listener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// An active listener registration. Unsubscribes when dropped.
pub struct Subscription<S: KeySource> {
    source: S,
    id: ListenerId,
}

impl<S: KeySource> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.source.unsubscribe(self.id);
        debug!(id = self.id.0, "shortcut subscription released");
    }
}

/// Owns at most one subscription against its source at a time
pub struct ShortcutDispatcher<S: KeySource> {
    source: S,
    table: Rc<RuleTable>,
    subscription: Option<Subscription<S>>,
}

impl<S: KeySource> ShortcutDispatcher<S> {
    pub fn new(source: S, options: DispatchOptions) -> Self {
        Self {
            source,
            table: Rc::new(RuleTable::new(&options)),
            subscription: None,
        }
    }

    /// Install a subscription for this callback set, releasing any previous one
    pub fn start(&mut self, mut shortcuts: Shortcuts) {
        // Old callbacks must never observe another event
        self.stop();

        let bound = shortcuts.len();
        let table = Rc::clone(&self.table);
        let listener: Listener = Rc::new(RefCell::new(move |press: &mut KeyPress| {
            table.apply(press, &mut shortcuts);
        }));

        let id = self.source.subscribe(listener);
        debug!(id = id.0, bound, "shortcut subscription installed");

        self.subscription = Some(Subscription {
            source: self.source.clone(),
            id,
        });
    }

    pub fn stop(&mut self) {
        self.subscription = None;
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Shortcuts with a counter per binding
    fn counting_shortcuts(bindings: &[Binding]) -> (Shortcuts, HashMap<Binding, Rc<Cell<u32>>>) {
        let mut shortcuts = Shortcuts::new();
        let mut counters = HashMap::new();
        for binding in bindings {
            let counter = Rc::new(Cell::new(0));
            let c = Rc::clone(&counter);
            shortcuts = shortcuts.on(*binding, move || c.set(c.get() + 1));
            counters.insert(*binding, counter);
        }
        (shortcuts, counters)
    }

    fn total(counters: &HashMap<Binding, Rc<Cell<u32>>>) -> u32 {
        counters.values().map(|c| c.get()).sum()
    }

    fn started(options: DispatchOptions) -> (KeyBus, ShortcutDispatcher<KeyBus>, HashMap<Binding, Rc<Cell<u32>>>) {
        let bus = KeyBus::new();
        let mut dispatcher = ShortcutDispatcher::new(bus.clone(), options);
        let (shortcuts, counters) = counting_shortcuts(&Binding::ALL);
        dispatcher.start(shortcuts);
        (bus, dispatcher, counters)
    }

    #[test]
    fn test_f1_fires_only_f1_and_suppresses() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("F1");
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(counters[&Binding::F1].get(), 1);
        assert_eq!(total(&counters), 1);
    }

    #[test]
    fn test_f10_suppressed_without_callback() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("F10");
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(total(&counters), 0);
    }

    #[test]
    fn test_broad_prefix_swallows_capital_f() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("F").with_shift();
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(total(&counters), 0);
    }

    #[test]
    fn test_narrow_function_keys() {
        let options = DispatchOptions {
            broad_function_keys: false,
            ..DispatchOptions::default()
        };
        let (bus, _dispatcher, counters) = started(options);

        let mut f10 = KeyPress::new("F10");
        bus.emit(&mut f10);
        assert!(!f10.default_prevented());

        let mut f9 = KeyPress::new("F9");
        bus.emit(&mut f9);
        assert!(f9.default_prevented());
        assert_eq!(counters[&Binding::F9].get(), 1);
        assert_eq!(total(&counters), 1);
    }

    #[test]
    fn test_ctrl_g_lowercase_only() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut lower = KeyPress::new("g").with_ctrl();
        bus.emit(&mut lower);
        assert!(lower.default_prevented());
        assert_eq!(counters[&Binding::CtrlG].get(), 1);

        let mut upper = KeyPress::new("G").with_ctrl();
        bus.emit(&mut upper);
        assert!(!upper.default_prevented(), "Ctrl+G uppercase must not be suppressed");
        assert_eq!(counters[&Binding::CtrlG].get(), 1, "Ctrl+G uppercase must not dispatch");
        assert_eq!(total(&counters), 1);
    }

    #[test]
    fn test_plain_g_is_ignored() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("g");
        bus.emit(&mut press);

        assert!(!press.default_prevented());
        assert_eq!(total(&counters), 0);
    }

    #[test]
    fn test_alt_r() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("r").with_alt();
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(counters[&Binding::AltR].get(), 1);
        assert_eq!(total(&counters), 1);
    }

    #[test]
    fn test_alt_g_verbatim_case_mismatch() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        // Uppercase: suppressed, no dispatch
        let mut upper = KeyPress::new("G").with_alt();
        bus.emit(&mut upper);
        assert!(upper.default_prevented());
        assert_eq!(counters[&Binding::AltG].get(), 0);

        // Lowercase: dispatched, not suppressed
        let mut lower = KeyPress::new("g").with_alt();
        bus.emit(&mut lower);
        assert!(!lower.default_prevented());
        assert_eq!(counters[&Binding::AltG].get(), 1);
    }

    #[test]
    fn test_alt_g_either_case() {
        let options = DispatchOptions {
            alt_g_case: AltGCase::Either,
            ..DispatchOptions::default()
        };
        let (bus, _dispatcher, counters) = started(options);

        for key in ["g", "G"] {
            let mut press = KeyPress::new(key).with_alt();
            bus.emit(&mut press);
            assert!(press.default_prevented(), "Alt+{} should be suppressed", key);
        }
        assert_eq!(counters[&Binding::AltG].get(), 2);
    }

    #[test]
    fn test_function_key_dispatch_ignores_modifiers() {
        let (bus, _dispatcher, counters) = started(DispatchOptions::default());

        let mut press = KeyPress::new("F3").with_ctrl();
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(counters[&Binding::F3].get(), 1);
    }

    #[test]
    fn test_unbound_binding_still_suppressed() {
        let bus = KeyBus::new();
        let mut dispatcher = ShortcutDispatcher::new(bus.clone(), DispatchOptions::default());
        let (shortcuts, counters) = counting_shortcuts(&[Binding::F1]);
        dispatcher.start(shortcuts);

        let mut press = KeyPress::new("F5");
        bus.emit(&mut press);

        assert!(press.default_prevented());
        assert_eq!(total(&counters), 0);

        let mut press = KeyPress::new("r").with_alt();
        bus.emit(&mut press);
        assert!(press.default_prevented());
    }

    #[test]
    fn test_restart_replaces_subscription() {
        let bus = KeyBus::new();
        let mut dispatcher = ShortcutDispatcher::new(bus.clone(), DispatchOptions::default());

        let (first, first_counters) = counting_shortcuts(&[Binding::F2]);
        dispatcher.start(first);
        let (second, second_counters) = counting_shortcuts(&[Binding::F2]);
        dispatcher.start(second);

        assert_eq!(bus.listener_count(), 1);

        let mut press = KeyPress::new("F2");
        bus.emit(&mut press);

        assert_eq!(first_counters[&Binding::F2].get(), 0, "replaced callbacks must not fire");
        assert_eq!(second_counters[&Binding::F2].get(), 1);
    }

    #[test]
    fn test_stop_and_drop_unsubscribe() {
        let bus = KeyBus::new();
        let (shortcuts, counters) = counting_shortcuts(&[Binding::F1]);

        let mut dispatcher = ShortcutDispatcher::new(bus.clone(), DispatchOptions::default());
        dispatcher.start(shortcuts);
        assert!(dispatcher.is_active());
        dispatcher.stop();
        assert!(!dispatcher.is_active());
        assert_eq!(bus.listener_count(), 0);

        let mut press = KeyPress::new("F1");
        bus.emit(&mut press);
        assert!(!press.default_prevented());
        assert_eq!(total(&counters), 0);

        {
            let mut scoped = ShortcutDispatcher::new(bus.clone(), DispatchOptions::default());
            scoped.start(Shortcuts::new());
            assert_eq!(bus.listener_count(), 1);
        }
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_rule_table_shape() {
        let table = RuleTable::new(&DispatchOptions::default());
        let rules = table.rules();

        assert_eq!(rules.len(), 16);
        assert_eq!(rules.iter().filter(|r| r.suppress).count(), 4);
        assert_eq!(rules.iter().filter(|r| r.slot.is_some()).count(), 12);
        assert_eq!(rules[0].matcher, KeyMatch::KeyPrefix("F"));
        assert_eq!(rules[3].matcher, KeyMatch::Alt("G"));
        assert_eq!(rules[15].matcher, KeyMatch::Alt("g"));
    }

    #[test]
    fn test_shortcuts_rebinding_replaces_callback() {
        let shortcuts = Shortcuts::new().on(Binding::F1, || {}).on(Binding::F1, || {});
        assert_eq!(shortcuts.len(), 1);
        assert!(shortcuts.is_bound(Binding::F1));
        assert!(!shortcuts.is_bound(Binding::F2));
    }
}
