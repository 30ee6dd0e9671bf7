//! Application settings, read once from the environment at startup.

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Wodify web application root.
pub const WODIFY_URL: &str = "https://app.wodify.com";

/// Pushover credential pair. Both values are required for delivery;
/// a half-set pair is treated the same as none.
#[derive(Debug, Clone)]
pub struct PushoverKeys {
    pub user_key: String,
    pub app_token: String,
}

/// Bounded-wait timeouts, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Full page load / navigation.
    pub page_load_ms: u64,
    /// Individual element lookups.
    pub element_wait_ms: u64,
    /// Calendar re-render after a date change.
    pub calendar_render_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            element_wait_ms: 10_000,
            calendar_render_ms: 5_000,
        }
    }
}

/// All runtime configuration, constructed once and passed by reference
/// into every component constructor.
#[derive(Debug, Clone)]
pub struct Settings {
    pub email: String,
    pub password: String,
    /// How many days from today the target date is. Zero books today.
    pub days_ahead: u32,
    pub ollama_host: String,
    pub ollama_model: String,
    pub pushover: Option<PushoverKeys>,
    pub headless: bool,
    pub timeouts: Timeouts,
    pub system_prompt_path: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup. This is the
    /// seam the tests use; `from_env` is a thin wrapper over it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).unwrap_or_default();

        let days_ahead = parse_var(&lookup, "DAYS_AHEAD", 1u32)?;
        let headless = match lookup("HEADLESS") {
            Some(v) => v.to_lowercase() == "true",
            None => true,
        };

        let timeouts = Timeouts {
            page_load_ms: parse_var(&lookup, "PAGE_LOAD_TIMEOUT_MS", 30_000u64)?,
            element_wait_ms: parse_var(&lookup, "ELEMENT_WAIT_TIMEOUT_MS", 10_000u64)?,
            calendar_render_ms: parse_var(&lookup, "CALENDAR_LOAD_WAIT_MS", 5_000u64)?,
        };

        let user_key = get("PUSHOVER_USER_KEY");
        let app_token = get("PUSHOVER_APP_TOKEN");
        let pushover = match (user_key.is_empty(), app_token.is_empty()) {
            (false, false) => Some(PushoverKeys { user_key, app_token }),
            (true, true) => None,
            _ => {
                tracing::warn!(
                    "only one of PUSHOVER_USER_KEY / PUSHOVER_APP_TOKEN is set; \
                     notifications disabled"
                );
                None
            }
        };

        let ollama_host = lookup("OLLAMA_HOST")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://ollama:11434".to_string());
        let ollama_model = lookup("OLLAMA_MODEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "qwen3:8b".to_string());

        let system_prompt_path = lookup("SYSTEM_PROMPT_FILE")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("prompts/system_prompt.txt"));

        Ok(Self {
            email: get("EMAIL"),
            password: get("PASSWORD"),
            days_ahead,
            ollama_host,
            ollama_model,
            pushover,
            headless,
            timeouts,
            system_prompt_path,
        })
    }

    /// Validate the settings. Pure over the struct; collects every problem
    /// rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push("EMAIL environment variable not set".to_string());
        }
        if self.password.is_empty() {
            errors.push("PASSWORD environment variable not set".to_string());
        }
        if !self.system_prompt_path.exists() {
            errors.push(format!(
                "system prompt file not found: {}",
                self.system_prompt_path.display()
            ));
        }

        if self.pushover.is_none() {
            tracing::warn!("Pushover credentials not set; notifications disabled");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Load the LLM system prompt verbatim from the configured file.
    pub fn load_system_prompt(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.system_prompt_path).map_err(|e| {
            ConfigError::PromptUnreadable {
                path: self.system_prompt_path.display().to_string(),
                source: e,
            }
        })
    }

    /// True when a complete Pushover credential pair is configured.
    pub fn notifications_enabled(&self) -> bool {
        self.pushover.is_some()
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: v,
            reason: e.to_string(),
        }),
    }
}
