//! End-to-end run sequencing and outcome classification.

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;

use async_trait::async_trait;
use tracing::{debug, error, info};

use wodbot_llm::{LlmError, SelectionClient, SelectionDecision};
use wodbot_notify::Notifier;

use crate::auth::AuthFlow;
use crate::booking::BookingExecutor;
use crate::dates::TargetDate;
use crate::error::RunError;
use crate::models::render_roster;
use crate::page::ClassPage;
use crate::schedule::ScheduleExtractor;
use crate::selection::{validate, ValidatedSelection};

/// Where a run is in its lifecycle. Stages only move forward; any
/// component failure terminates the run where it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    Authenticated,
    CalendarOpen,
    DateSelected,
    ClassesExtracted,
    DecisionValidated,
    Booked,
}

/// The external decision-maker.
#[async_trait]
pub trait ClassSelector: Send + Sync {
    async fn select(&self, roster: &str, count: usize) -> Result<SelectionDecision, LlmError>;
}

#[async_trait]
impl ClassSelector for SelectionClient {
    async fn select(&self, roster: &str, count: usize) -> Result<SelectionDecision, LlmError> {
        self.select_class(roster, count).await
    }
}

#[async_trait]
impl<S: ClassSelector + ?Sized> ClassSelector for &S {
    async fn select(&self, roster: &str, count: usize) -> Result<SelectionDecision, LlmError> {
        (**self).select(roster, count).await
    }
}

/// Outcome notifications owed by a finished run.
#[async_trait]
pub trait RunNotifier: Send + Sync {
    async fn booked(&self, selection: &ValidatedSelection);
    async fn unusual_selection(&self, selection: &ValidatedSelection);
    async fn run_failed(&self, cause: &str);
}

#[async_trait]
impl<N: RunNotifier + ?Sized> RunNotifier for &N {
    async fn booked(&self, selection: &ValidatedSelection) {
        (**self).booked(selection).await;
    }

    async fn unusual_selection(&self, selection: &ValidatedSelection) {
        (**self).unusual_selection(selection).await;
    }

    async fn run_failed(&self, cause: &str) {
        (**self).run_failed(cause).await;
    }
}

#[async_trait]
impl RunNotifier for Notifier {
    async fn booked(&self, selection: &ValidatedSelection) {
        self.notify_booked(
            &selection.record.class_name,
            &selection.record.time_range,
            &selection.reasoning,
        )
        .await;
    }

    async fn unusual_selection(&self, selection: &ValidatedSelection) {
        self.notify_unusual_selection(
            &selection.record.class_name,
            &selection.record.time_range,
            &selection.reasoning,
        )
        .await;
    }

    async fn run_failed(&self, cause: &str) {
        self.notify_error(cause).await;
    }
}

/// Report of a run that reached its end state.
#[derive(Debug)]
pub struct RunReport {
    pub stage: RunStage,
    pub selection: ValidatedSelection,
    /// False on dry runs, where the booking click is skipped.
    pub booked: bool,
}

/// Sequences login, navigation, extraction, selection, and booking, and
/// classifies the outcome. Components own their internal retry policies;
/// nothing is retried at this level.
pub struct Orchestrator<S, N> {
    auth: AuthFlow,
    selector: S,
    notifier: N,
    target: TargetDate,
    dry_run: bool,
}

impl<S: ClassSelector, N: RunNotifier> Orchestrator<S, N> {
    pub fn new(auth: AuthFlow, selector: S, notifier: N, target: TargetDate) -> Self {
        Self {
            auth,
            selector,
            notifier,
            target,
            dry_run: false,
        }
    }

    /// Run through selection and validation but skip the booking click
    /// and all notifications.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Drive one complete run.
    ///
    /// Every component failure is caught here exactly once, converted
    /// into an error notification, and handed back for exit-code mapping.
    /// Releasing the browser is the caller's job and must happen on every
    /// exit path.
    pub async fn run(&self, page: &dyn ClassPage) -> Result<RunReport, RunError> {
        match self.run_inner(page).await {
            Ok(report) => {
                if self.dry_run {
                    info!("Dry run complete; no booking performed");
                } else if report.selection.notify_user {
                    info!("Sending notification (unusual selection)");
                    self.notifier.unusual_selection(&report.selection).await;
                } else {
                    self.notifier.booked(&report.selection).await;
                }
                Ok(report)
            }
            Err(e) => {
                error!("Run failed: {e}");
                if !self.dry_run {
                    self.notifier.run_failed(&e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    async fn run_inner(&self, page: &dyn ClassPage) -> Result<RunReport, RunError> {
        let mut stage = RunStage::Init;

        info!("Step 1: Logging in");
        self.auth.login(page).await?;
        advance(&mut stage, RunStage::Authenticated);

        info!("Step 2: Opening class calendar");
        page.open_calendar_menu()
            .await
            .map_err(|e| RunError::Navigation(format!("opening class calendar: {e}")))?;
        advance(&mut stage, RunStage::CalendarOpen);

        info!("Step 3: Selecting date {}", self.target.label());
        BookingExecutor::select_date(page, &self.target).await?;
        advance(&mut stage, RunStage::DateSelected);

        info!("Step 4: Extracting class list");
        let records = ScheduleExtractor::extract(page).await?;
        advance(&mut stage, RunStage::ClassesExtracted);

        let roster = render_roster(&records);
        info!("Found {} classes:", records.len());
        for line in roster.lines() {
            info!("  {line}");
        }

        info!("Step 5: Requesting selection from the model");
        let decision = self.selector.select(&roster, records.len()).await?;
        let selection = validate(decision, &records)?;
        advance(&mut stage, RunStage::DecisionValidated);
        info!(
            "Selected: {} at {}",
            selection.record.class_name, selection.record.time_range
        );
        info!("Reason: {}", selection.reasoning);

        if self.dry_run {
            info!("Dry run: skipping the booking click");
            return Ok(RunReport {
                stage,
                selection,
                booked: false,
            });
        }

        info!("Step 6: Booking selected class");
        BookingExecutor::book(page, &selection.record).await?;
        advance(&mut stage, RunStage::Booked);

        Ok(RunReport {
            stage,
            selection,
            booked: true,
        })
    }
}

fn advance(stage: &mut RunStage, next: RunStage) {
    debug!("Run stage: {next:?}");
    *stage = next;
}
