//! Date selection and the guarded booking click sequence.

#[cfg(test)]
#[path = "booking_tests.rs"]
mod tests;

use tracing::info;

use crate::dates::TargetDate;
use crate::error::RunError;
use crate::models::ClassRecord;
use crate::page::ClassPage;

/// Settle after clicking a date cell, while the day view re-renders.
const DATE_SETTLE_MS: u64 = 3_000;

/// Settle after the booking click, before the confirm dialog is used.
const ACTION_SETTLE_MS: u64 = 2_000;

/// Settle after the confirmation click.
const CONFIRM_SETTLE_MS: u64 = 3_000;

/// Drives date selection and the booking click-confirm sequence.
pub struct BookingExecutor;

impl BookingExecutor {
    /// Click the calendar cell for the target date.
    ///
    /// Cells are matched on whole month/day components, never on a text
    /// suffix, so nearby dates that share trailing digits cannot collide.
    pub async fn select_date(page: &dyn ClassPage, target: &TargetDate) -> Result<(), RunError> {
        info!("Selecting date: {}", target.label());
        let clicked = page
            .click_date_cell(target.month(), target.day())
            .await
            .map_err(|e| RunError::Navigation(format!("selecting date {}: {e}", target.label())))?;

        if !clicked {
            return Err(RunError::Navigation(format!(
                "no calendar cell found for {}",
                target.label()
            )));
        }
        page.settle(DATE_SETTLE_MS).await;
        Ok(())
    }

    /// Book one class.
    ///
    /// Single attempt by design: once the action control is clicked the
    /// remote system may already have registered the reservation, so no
    /// step here is ever retried.
    pub async fn book(page: &dyn ClassPage, record: &ClassRecord) -> Result<(), RunError> {
        let action_id = record.action_id.as_deref().ok_or_else(|| {
            RunError::Booking(format!("no action id for class: {}", record.class_name))
        })?;

        info!(
            "Booking class: {} at {}",
            record.class_name, record.time_range
        );
        page.click_action(action_id)
            .await
            .map_err(|e| RunError::Booking(format!("clicking booking control: {e}")))?;
        page.settle(ACTION_SETTLE_MS).await;

        page.confirm_booking().await.map_err(|e| {
            RunError::Booking(format!(
                "failed to confirm booking: {e}; the reservation may already have been \
                 registered, verify manually"
            ))
        })?;
        page.settle(CONFIRM_SETTLE_MS).await;

        info!("Booking confirmed");
        Ok(())
    }
}
