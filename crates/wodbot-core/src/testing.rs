//! Scripted fakes shared by the component tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use wodbot_browser::BrowserError;
use wodbot_llm::{LlmError, SelectionDecision};

use crate::page::{ClassPage, RawClassRow};
use crate::selection::ValidatedSelection;
use crate::workflow::{ClassSelector, RunNotifier};

fn not_found(what: &str) -> BrowserError {
    BrowserError::ElementNotFound(what.to_string())
}

/// Scripted boolean answers: dequeue while scripted, then repeat `then`.
pub struct Script {
    seq: Mutex<VecDeque<bool>>,
    then: bool,
}

impl Script {
    pub fn always(value: bool) -> Self {
        Self {
            seq: Mutex::new(VecDeque::new()),
            then: value,
        }
    }

    pub fn seq_then(seq: &[bool], then: bool) -> Self {
        Self {
            seq: Mutex::new(seq.iter().copied().collect()),
            then,
        }
    }

    fn next(&self) -> bool {
        self.seq.lock().unwrap().pop_front().unwrap_or(self.then)
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::always(false)
    }
}

/// A scripted page recording every interaction.
pub struct FakePage {
    /// Answers to the flow-A (visible text) existence probe.
    pub text_login: Script,
    /// Answers to the flow-B (role link) existence probe.
    pub role_login: Script,
    /// Whether each fill call succeeds.
    pub fill_ok: Script,
    /// Whether the requested date cell exists.
    pub date_cell: Script,
    /// Whether each booking-control click succeeds.
    pub action_ok: Script,
    /// Whether each confirm click succeeds.
    pub confirm_ok: Script,
    /// Rows the day view yields.
    pub rows: Mutex<Vec<RawClassRow>>,
    /// When set, `class_rows` fails at the browser level instead.
    pub rows_fail: Mutex<bool>,

    /// Total login entry-point probes across both flows.
    pub probes: AtomicUsize,
    pub reloads: AtomicUsize,
    pub entry_clicks: Mutex<Vec<&'static str>>,
    pub filled: Mutex<Vec<(String, String)>>,
    pub buttons: Mutex<Vec<String>>,
    pub calendar_opens: AtomicUsize,
    pub date_clicks: Mutex<Vec<(u32, u32)>>,
    pub action_clicks: Mutex<Vec<String>>,
    pub confirm_attempts: AtomicUsize,
}

impl FakePage {
    /// A page where nothing exists and nothing fails. Scenario tests
    /// flip the scripts they care about.
    pub fn new() -> Self {
        Self {
            text_login: Script::always(false),
            role_login: Script::always(false),
            fill_ok: Script::always(true),
            date_cell: Script::always(false),
            action_ok: Script::always(true),
            confirm_ok: Script::always(true),
            rows: Mutex::new(Vec::new()),
            rows_fail: Mutex::new(false),
            probes: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
            entry_clicks: Mutex::new(Vec::new()),
            filled: Mutex::new(Vec::new()),
            buttons: Mutex::new(Vec::new()),
            calendar_opens: AtomicUsize::new(0),
            date_clicks: Mutex::new(Vec::new()),
            action_clicks: Mutex::new(Vec::new()),
            confirm_attempts: AtomicUsize::new(0),
        }
    }

    /// A page scripted for the full success path: flow-A login, the date
    /// cell present, and `rows` rendered on the day view.
    pub fn happy(rows: Vec<RawClassRow>) -> Self {
        let mut page = Self::new();
        page.text_login = Script::always(true);
        page.date_cell = Script::always(true);
        page.rows = Mutex::new(rows);
        page
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassPage for FakePage {
    async fn open_home(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn reload_home(&self) -> Result<(), BrowserError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_idle(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn settle(&self, _ms: u64) {}

    async fn has_login_text(&self) -> Result<bool, BrowserError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.text_login.next())
    }

    async fn click_login_text(&self) -> Result<(), BrowserError> {
        self.entry_clicks.lock().unwrap().push("text");
        Ok(())
    }

    async fn has_login_link_role(&self) -> Result<bool, BrowserError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.role_login.next())
    }

    async fn click_login_link_role(&self) -> Result<(), BrowserError> {
        self.entry_clicks.lock().unwrap().push("role");
        Ok(())
    }

    async fn fill_labeled_field(&self, label: &str, value: &str) -> Result<(), BrowserError> {
        if !self.fill_ok.next() {
            return Err(not_found(&format!("{label} field")));
        }
        self.filled
            .lock()
            .unwrap()
            .push((label.to_string(), value.to_string()));
        Ok(())
    }

    async fn click_button_named(&self, name: &str) -> Result<(), BrowserError> {
        self.buttons.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn open_calendar_menu(&self) -> Result<(), BrowserError> {
        self.calendar_opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click_date_cell(&self, month: u32, day: u32) -> Result<bool, BrowserError> {
        self.date_clicks.lock().unwrap().push((month, day));
        Ok(self.date_cell.next())
    }

    async fn class_rows(&self) -> Result<Vec<RawClassRow>, BrowserError> {
        if *self.rows_fail.lock().unwrap() {
            return Err(BrowserError::Timeout("day view never rendered".to_string()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn click_action(&self, id: &str) -> Result<(), BrowserError> {
        if !self.action_ok.next() {
            return Err(not_found(&format!("booking control #{id}")));
        }
        self.action_clicks.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn confirm_booking(&self) -> Result<(), BrowserError> {
        self.confirm_attempts.fetch_add(1, Ordering::SeqCst);
        if !self.confirm_ok.next() {
            return Err(not_found("Confirm Booking button"));
        }
        Ok(())
    }

    async fn capture(&self, _path: &Path) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Selector that answers from a script and counts invocations.
pub struct FakeSelector {
    /// `Some` answers with the decision; `None` fails as malformed output.
    pub response: Mutex<Option<SelectionDecision>>,
    pub calls: AtomicUsize,
}

impl FakeSelector {
    pub fn returning(decision: SelectionDecision) -> Self {
        Self {
            response: Mutex::new(Some(decision)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn malformed() -> Self {
        Self {
            response: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassSelector for FakeSelector {
    async fn select(&self, _roster: &str, _count: usize) -> Result<SelectionDecision, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.response.lock().unwrap().clone() {
            Some(decision) => Ok(decision),
            None => Err(LlmError::MalformedDecision {
                reason: "scripted failure".to_string(),
                raw: "not json".to_string(),
            }),
        }
    }
}

/// What a run asked to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Booked(String),
    Unusual(String),
    Failed(String),
}

/// Notifier that records instead of delivering.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunNotifier for RecordingNotifier {
    async fn booked(&self, selection: &ValidatedSelection) {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Booked(selection.record.class_name.clone()));
    }

    async fn unusual_selection(&self, selection: &ValidatedSelection) {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Unusual(selection.record.class_name.clone()));
    }

    async fn run_failed(&self, cause: &str) {
        self.sent.lock().unwrap().push(Sent::Failed(cause.to_string()));
    }
}
