//! Bounds and shape validation of the externally supplied decision.

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;

use wodbot_llm::SelectionDecision;

use crate::error::RunError;
use crate::models::ClassRecord;

/// A decision that passed validation, bound to the record it references.
#[derive(Debug, Clone)]
pub struct ValidatedSelection {
    pub record: ClassRecord,
    pub reasoning: String,
    pub notify_user: bool,
}

/// Check a decision against the extracted roster.
///
/// No clamping, no nearest-match fallback, no default: any reference
/// outside `[0, len)` is a hard failure. Which class to pick is the
/// external decision-maker's policy; whether the pick is bookable is the
/// booking executor's concern — neither is checked here.
pub fn validate(
    decision: SelectionDecision,
    records: &[ClassRecord],
) -> Result<ValidatedSelection, RunError> {
    if records.is_empty() {
        return Err(RunError::Selection(
            "no classes available to select from".to_string(),
        ));
    }

    let index = usize::try_from(decision.selected_index)
        .ok()
        .filter(|i| *i < records.len())
        .ok_or_else(|| {
            RunError::Selection(format!(
                "selected index {} outside valid range 0-{}",
                decision.selected_index,
                records.len() - 1
            ))
        })?;

    Ok(ValidatedSelection {
        record: records[index].clone(),
        reasoning: decision.reasoning,
        notify_user: decision.notify_user,
    })
}
