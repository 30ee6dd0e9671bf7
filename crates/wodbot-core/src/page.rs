//! The seam between the domain workflow and the rendered site.
//!
//! [`ClassPage`] is the narrow set of page operations the workflow needs.
//! [`LivePage`] implements it against the real browser session and owns all
//! knowledge of the site's markup; tests drive scripted fakes instead.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use wodbot_browser::{BrowserError, Page};
use wodbot_config::Timeouts;

/// Raw field values scraped from one calendar row. `None` marks a
/// sub-lookup that found nothing; normalization into typed defaults
/// happens in the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawClassRow {
    pub time_text: Option<String>,
    pub class_name: Option<String>,
    pub coach: Option<String>,
    pub action_id: Option<String>,
    pub action_label: Option<String>,
}

/// Domain-level operations on the booking site's pages.
///
/// Every wait is bounded; retry policy belongs to the callers.
#[async_trait]
pub trait ClassPage: Send + Sync {
    /// Navigate to the site root and wait for the network to go quiet.
    async fn open_home(&self) -> Result<(), BrowserError>;

    /// Reload the current page and wait for the network to go quiet.
    async fn reload_home(&self) -> Result<(), BrowserError>;

    /// Wait for in-flight requests to drain.
    async fn wait_idle(&self) -> Result<(), BrowserError>;

    /// Fixed settle period after a UI-mutating action.
    async fn settle(&self, ms: u64);

    /// Existence check for the visible "Login" text link (flow A).
    async fn has_login_text(&self) -> Result<bool, BrowserError>;
    async fn click_login_text(&self) -> Result<(), BrowserError>;

    /// Existence check for the login link located by role (flow B).
    async fn has_login_link_role(&self) -> Result<bool, BrowserError>;
    async fn click_login_link_role(&self) -> Result<(), BrowserError>;

    /// Fill the text field whose accessible label contains `label`,
    /// case-insensitively, replacing any existing value.
    async fn fill_labeled_field(&self, label: &str, value: &str) -> Result<(), BrowserError>;

    /// Click the button whose accessible name contains `name`.
    async fn click_button_named(&self, name: &str) -> Result<(), BrowserError>;

    /// Open the class calendar from the site menu and let it render.
    async fn open_calendar_menu(&self) -> Result<(), BrowserError>;

    /// Click the calendar cell labeled with exactly this month and day.
    /// Returns whether a matching cell was found.
    async fn click_date_cell(&self, month: u32, day: u32) -> Result<bool, BrowserError>;

    /// Scrape the day view's class rows in display order.
    async fn class_rows(&self) -> Result<Vec<RawClassRow>, BrowserError>;

    /// Click the booking control with this id.
    async fn click_action(&self, id: &str) -> Result<(), BrowserError>;

    /// Click the booking confirmation button.
    async fn confirm_booking(&self) -> Result<(), BrowserError>;

    /// Save a debug screenshot.
    async fn capture(&self, path: &Path) -> Result<(), BrowserError>;
}

/// Element-lookup polling cadence.
const LOCATE_POLL: Duration = Duration::from_millis(100);

/// Production [`ClassPage`] backed by one live browser page.
pub struct LivePage {
    page: Page,
    base_url: String,
    timeouts: Timeouts,
}

impl LivePage {
    pub fn new(page: Page, base_url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            page,
            base_url: base_url.into(),
            timeouts,
        }
    }

    /// Run a locator and return the viewport center of the element it
    /// finds, scrolled into view.
    async fn locate_center(&self, locator: &str) -> Result<Option<(f64, f64)>, BrowserError> {
        let expr = format!(
            "(() => {{\n\
               const el = ({locator})();\n\
               if (!el) return null;\n\
               el.scrollIntoView({{block: 'center', inline: 'center'}});\n\
               const r = el.getBoundingClientRect();\n\
               return {{x: r.left + r.width / 2, y: r.top + r.height / 2}};\n\
             }})()"
        );
        let value = self.page.evaluate(&expr).await?;
        let center = value
            .get("x")
            .and_then(|x| x.as_f64())
            .zip(value.get("y").and_then(|y| y.as_f64()));
        Ok(center)
    }

    /// Poll for an element within the element-wait budget, then click its
    /// center with a native event.
    async fn click_located(&self, locator: &str, what: &str) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_millis(self.timeouts.element_wait_ms);
        loop {
            if let Some((x, y)) = self.locate_center(locator).await? {
                debug!("Clicking {what} at ({x:.0}, {y:.0})");
                return self.page.click_at(x, y).await;
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementNotFound(what.to_string()));
            }
            tokio::time::sleep(LOCATE_POLL).await;
        }
    }

    /// Immediate existence check, no wait.
    async fn exists(&self, locator: &str) -> Result<bool, BrowserError> {
        let expr = format!("(() => ({locator})() !== null)()");
        Ok(self.page.evaluate(&expr).await?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl ClassPage for LivePage {
    async fn open_home(&self) -> Result<(), BrowserError> {
        self.page.goto(&self.base_url).await?;
        self.wait_idle().await
    }

    async fn reload_home(&self) -> Result<(), BrowserError> {
        self.page.reload().await?;
        self.wait_idle().await
    }

    async fn wait_idle(&self) -> Result<(), BrowserError> {
        self.page
            .wait_for_network_idle(self.timeouts.page_load_ms)
            .await
    }

    async fn settle(&self, ms: u64) {
        self.page.settle(ms).await;
    }

    async fn has_login_text(&self) -> Result<bool, BrowserError> {
        self.exists(&locators::visible_text("Login")).await
    }

    async fn click_login_text(&self) -> Result<(), BrowserError> {
        self.click_located(&locators::visible_text("Login"), "login link (text)")
            .await
    }

    async fn has_login_link_role(&self) -> Result<bool, BrowserError> {
        self.exists(&locators::link_named("Login")).await
    }

    async fn click_login_link_role(&self) -> Result<(), BrowserError> {
        self.click_located(&locators::link_named("Login"), "login link (role)")
            .await
    }

    async fn fill_labeled_field(&self, label: &str, value: &str) -> Result<(), BrowserError> {
        let locator = locators::textbox_labeled(label);
        // Focus and select the existing value so the inserted text
        // replaces it.
        let focus_expr = format!(
            "(() => {{\n\
               const el = ({locator})();\n\
               if (!el) return false;\n\
               el.focus();\n\
               if (el.select) el.select();\n\
               return true;\n\
             }})()"
        );

        let deadline = Instant::now() + Duration::from_millis(self.timeouts.element_wait_ms);
        loop {
            let focused = self.page.evaluate(&focus_expr).await?.as_bool().unwrap_or(false);
            if focused {
                break;
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementNotFound(format!("{label} field")));
            }
            tokio::time::sleep(LOCATE_POLL).await;
        }

        self.page.insert_text(value).await?;
        debug!("Filled {label} field");
        Ok(())
    }

    async fn click_button_named(&self, name: &str) -> Result<(), BrowserError> {
        self.click_located(&locators::button_named(name), &format!("{name} button"))
            .await
    }

    async fn open_calendar_menu(&self) -> Result<(), BrowserError> {
        self.click_located(
            &locators::menu_item("Class Calendar"),
            "Class Calendar menu item",
        )
        .await?;
        self.settle(self.timeouts.calendar_render_ms).await;
        Ok(())
    }

    async fn click_date_cell(&self, month: u32, day: u32) -> Result<bool, BrowserError> {
        let locator = locators::date_cell(month, day);
        let deadline = Instant::now() + Duration::from_millis(self.timeouts.element_wait_ms);
        loop {
            if let Some((x, y)) = self.locate_center(&locator).await? {
                debug!("Clicking date cell {month}/{day} at ({x:.0}, {y:.0})");
                self.page.click_at(x, y).await?;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(LOCATE_POLL).await;
        }
    }

    async fn class_rows(&self) -> Result<Vec<RawClassRow>, BrowserError> {
        let value = self.page.evaluate(locators::EXTRACT_ROWS).await?;
        serde_json::from_value(value)
            .map_err(|e| BrowserError::InvalidResponse(format!("class rows: {e}")))
    }

    async fn click_action(&self, id: &str) -> Result<(), BrowserError> {
        self.click_located(&locators::by_id(id), &format!("booking control #{id}"))
            .await
    }

    async fn confirm_booking(&self) -> Result<(), BrowserError> {
        self.click_button_named("Confirm Booking").await
    }

    async fn capture(&self, path: &Path) -> Result<(), BrowserError> {
        self.page.screenshot(path).await
    }
}

/// JS locator builders. Each produces a zero-argument function expression
/// that yields a matching element or null, mirroring the site's markup.
mod locators {
    /// Quote a string for embedding in a JS expression.
    fn js_str(s: &str) -> String {
        serde_json::Value::String(s.to_string()).to_string()
    }

    /// A visible leaf element whose text contains `text`, case-insensitively.
    pub(super) fn visible_text(text: &str) -> String {
        format!(
            "() => {{\n\
               const needle = {}.toLowerCase();\n\
               const els = Array.from(document.querySelectorAll('a, button, span, div'));\n\
               return els.find(el => el.childElementCount === 0\n\
                 && el.getClientRects().length > 0\n\
                 && (el.textContent || '').toLowerCase().includes(needle)) || null;\n\
             }}",
            js_str(text)
        )
    }

    /// A link whose accessible name contains `name`, case-insensitively.
    pub(super) fn link_named(name: &str) -> String {
        format!(
            "() => {{\n\
               const needle = {}.toLowerCase();\n\
               const els = Array.from(document.querySelectorAll('a, [role=\"link\"]'));\n\
               return els.find(el => {{\n\
                 const name = el.getAttribute('aria-label') || el.textContent || '';\n\
                 return el.getClientRects().length > 0 && name.toLowerCase().includes(needle);\n\
               }}) || null;\n\
             }}",
            js_str(name)
        )
    }

    /// A text input whose accessible label contains `label`: aria-label,
    /// placeholder, an associated <label>, or the name attribute.
    pub(super) fn textbox_labeled(label: &str) -> String {
        format!(
            "() => {{\n\
               const needle = {}.toLowerCase();\n\
               const fields = Array.from(document.querySelectorAll('input, textarea'));\n\
               return fields.find(el => {{\n\
                 const fromLabels = el.labels\n\
                   ? Array.from(el.labels).map(l => l.textContent || '').join(' ')\n\
                   : '';\n\
                 const name = [\n\
                   el.getAttribute('aria-label'),\n\
                   el.getAttribute('placeholder'),\n\
                   el.getAttribute('name'),\n\
                   fromLabels,\n\
                 ].filter(Boolean).join(' ');\n\
                 return name.toLowerCase().includes(needle);\n\
               }}) || null;\n\
             }}",
            js_str(label)
        )
    }

    /// A button whose accessible name contains `name`, case-insensitively.
    pub(super) fn button_named(name: &str) -> String {
        format!(
            "() => {{\n\
               const needle = {}.toLowerCase();\n\
               const els = Array.from(\n\
                 document.querySelectorAll('button, [role=\"button\"], input[type=\"submit\"]'));\n\
               return els.find(el => {{\n\
                 const name = el.getAttribute('aria-label') || el.value || el.textContent || '';\n\
                 return el.getClientRects().length > 0 && name.toLowerCase().includes(needle);\n\
               }}) || null;\n\
             }}",
            js_str(name)
        )
    }

    /// A menu item whose text contains `name`, case-insensitively.
    pub(super) fn menu_item(name: &str) -> String {
        format!(
            "() => {{\n\
               const needle = {}.toLowerCase();\n\
               const els = Array.from(document.querySelectorAll('[role=\"menuitem\"]'));\n\
               return els.find(el =>\n\
                 (el.textContent || '').toLowerCase().includes(needle)) || null;\n\
             }}",
            js_str(name)
        )
    }

    /// The calendar cell whose trailing "M/D" token matches exactly.
    ///
    /// Month and day are compared as whole numbers, so asking for 1/14
    /// cannot land on a cell labeled 11/14. Ancestors of the cell match
    /// too (their text ends the same way); the smallest matching element
    /// is the cell itself.
    pub(super) fn date_cell(month: u32, day: u32) -> String {
        format!(
            "() => {{\n\
               const re = /(\\d{{1,2}})\\/(\\d{{1,2}})\\s*$/;\n\
               const matches = Array.from(document.querySelectorAll('div')).filter(el => {{\n\
                 if (el.getClientRects().length === 0) return false;\n\
                 const m = re.exec((el.textContent || '').trim());\n\
                 return m && Number(m[1]) === {month} && Number(m[2]) === {day};\n\
               }});\n\
               if (matches.length === 0) return null;\n\
               matches.sort((a, b) => {{\n\
                 const ra = a.getBoundingClientRect();\n\
                 const rb = b.getBoundingClientRect();\n\
                 return ra.width * ra.height - rb.width * rb.height;\n\
               }});\n\
               return matches[0];\n\
             }}"
        )
    }

    /// Element lookup by id.
    pub(super) fn by_id(id: &str) -> String {
        format!("() => document.getElementById({})", js_str(id))
    }

    /// Map the day view's class rows to their raw field values. Missing
    /// sub-elements become null, not errors.
    pub(super) const EXTRACT_ROWS: &str = "\
        (() => {\n\
          const rows = Array.from(document.querySelectorAll('.list-item[data-list-item]'));\n\
          return rows.map(row => {\n\
            const timeEl = row.querySelector('.list-item-content-left');\n\
            const nameEl = row.querySelector('.font-size-m span');\n\
            const coachEl = row.querySelector(\"a[href='#']\");\n\
            const button = row.querySelector('button');\n\
            return {\n\
              time_text: timeEl ? timeEl.innerText : null,\n\
              class_name: nameEl ? nameEl.innerText : null,\n\
              coach: coachEl ? coachEl.innerText : null,\n\
              action_id: button && button.id ? button.id : null,\n\
              action_label: button ? button.innerText : null,\n\
            };\n\
          });\n\
        })()";

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn strings_are_json_escaped() {
            assert_eq!(js_str(r#"a"b"#), r#""a\"b""#);
            let locator = visible_text(r#"Log"in"#);
            assert!(locator.contains(r#""Log\"in""#));
        }

        #[test]
        fn date_cell_embeds_whole_number_comparison() {
            let locator = date_cell(11, 14);
            assert!(locator.contains("=== 11"));
            assert!(locator.contains("=== 14"));
        }

        #[test]
        fn row_extraction_targets_the_list_marker() {
            assert!(EXTRACT_ROWS.contains(".list-item[data-list-item]"));
            assert!(EXTRACT_ROWS.contains(".list-item-content-left"));
            assert!(EXTRACT_ROWS.contains(".font-size-m span"));
        }
    }
}
