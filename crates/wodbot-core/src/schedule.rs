//! Calendar-day roster extraction.

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;

use tracing::info;

use crate::error::RunError;
use crate::models::ClassRecord;
use crate::page::{ClassPage, RawClassRow};

/// Turns the rendered day view into an ordered sequence of records.
///
/// One extraction per rendered view; after any date change the caller
/// re-invokes it rather than resuming.
pub struct ScheduleExtractor;

impl ScheduleExtractor {
    pub async fn extract(page: &dyn ClassPage) -> Result<Vec<ClassRecord>, RunError> {
        info!("Extracting class information");
        let rows = page
            .class_rows()
            .await
            .map_err(|e| RunError::Extraction(format!("reading class rows: {e}")))?;
        let records = normalize_rows(rows)?;
        info!("Extracted {} classes", records.len());
        Ok(records)
    }
}

/// Pure normalization from scraped row values to records.
///
/// A sub-lookup that found nothing becomes an empty string (time, name,
/// coach) or an absent action id; partial rows keep their place so indices
/// stay contiguous in display order. Zero rows is a failure: it means the
/// day view rendered nothing recognizable, which callers treat as
/// terminal rather than retryable.
pub fn normalize_rows(rows: Vec<RawClassRow>) -> Result<Vec<ClassRecord>, RunError> {
    if rows.is_empty() {
        return Err(RunError::Extraction(
            "no classes found on calendar".to_string(),
        ));
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| ClassRecord {
            index,
            // The left text block's trailing lines are secondary metadata.
            time_range: row
                .time_text
                .as_deref()
                .and_then(|text| text.lines().next())
                .unwrap_or_default()
                .to_string(),
            class_name: row.class_name.unwrap_or_default(),
            coach: row.coach.unwrap_or_default(),
            action_id: row.action_id.filter(|id| !id.is_empty()),
            action_label: row.action_label.unwrap_or_default(),
        })
        .collect())
}
