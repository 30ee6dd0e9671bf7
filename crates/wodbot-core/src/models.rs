//! Class roster records and their LLM-facing table format.

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// One class offering on the target date.
///
/// Records are created fresh per run in calendar row order and read-only
/// afterward. `index` is the selection key the external decision refers
/// back to, so the sequence is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// Zero-based position in extraction order.
    pub index: usize,
    /// Display time range, e.g. "3:00 PM - 4:30 PM". Free text; no date
    /// arithmetic is performed on it.
    pub time_range: String,
    /// Empty string when the row carried no class name.
    pub class_name: String,
    /// Empty string when the row carried no coach link.
    pub coach: String,
    /// Opaque id of the row's action control, when one exists.
    pub action_id: Option<String>,
    /// Label of the action control, e.g. "BOOK" or "MANAGE".
    pub action_label: String,
}

impl ClassRecord {
    /// True when the row can start a new booking: an action control is
    /// present and labeled as a booking action. A MANAGE-labeled row
    /// (existing reservation) or an id-less row is never bookable.
    pub fn is_bookable(&self) -> bool {
        self.action_id.is_some() && self.action_label.to_uppercase().contains("BOOK")
    }

    /// One fixed-width roster line in the format the model is prompted
    /// with. `from_display_line` parses the same format back.
    pub fn to_display_line(&self) -> String {
        let button = format!(
            "{} (#{})",
            self.action_label,
            self.action_id.as_deref().unwrap_or("None")
        );
        format!(
            "{:02}: {:<20} | {:<20} | Coach: {:<15} | Button: {}",
            self.index, self.time_range, self.class_name, self.coach, button
        )
    }

    /// Parse a line produced by [`to_display_line`](Self::to_display_line).
    ///
    /// Padding on the free-text fields is dropped; `index`, `action_id`,
    /// and `action_label` survive exactly. Returns `None` when the line is
    /// not in roster format.
    pub fn from_display_line(line: &str) -> Option<Self> {
        let (index_part, rest) = line.split_once(": ")?;
        let index = index_part.trim().parse().ok()?;

        let mut fields = rest.splitn(4, " | ");
        let time_range = fields.next()?.trim_end();
        let class_name = fields.next()?.trim_end();
        let coach = fields.next()?.strip_prefix("Coach: ")?.trim_end();
        let button = fields.next()?.strip_prefix("Button: ")?;

        let (action_label, id_part) = button.rsplit_once(" (#")?;
        let id = id_part.strip_suffix(')')?;
        let action_id = (id != "None").then(|| id.to_string());

        Some(Self {
            index,
            time_range: time_range.to_string(),
            class_name: class_name.to_string(),
            coach: coach.to_string(),
            action_id,
            action_label: action_label.to_string(),
        })
    }
}

/// Render the whole roster, one line per record.
pub fn render_roster(records: &[ClassRecord]) -> String {
    records
        .iter()
        .map(ClassRecord::to_display_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a roster rendered by [`render_roster`]. Returns `None` if any
/// line fails to parse.
pub fn parse_roster(text: &str) -> Option<Vec<ClassRecord>> {
    text.lines().map(ClassRecord::from_display_line).collect()
}
