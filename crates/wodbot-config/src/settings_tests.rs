use std::collections::HashMap;
use std::io::Write;

use tempfile::NamedTempFile;

use super::*;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn defaults_when_unset() {
    let settings = Settings::from_lookup(|_| None).unwrap();
    assert_eq!(settings.days_ahead, 1);
    assert!(settings.headless);
    assert_eq!(settings.ollama_host, "http://ollama:11434");
    assert_eq!(settings.ollama_model, "qwen3:8b");
    assert_eq!(settings.timeouts.page_load_ms, 30_000);
    assert_eq!(settings.timeouts.element_wait_ms, 10_000);
    assert_eq!(settings.timeouts.calendar_render_ms, 5_000);
    assert!(settings.pushover.is_none());
}

#[test]
fn reads_credentials_and_overrides() {
    let map = vars(&[
        ("EMAIL", "me@example.com"),
        ("PASSWORD", "hunter2"),
        ("DAYS_AHEAD", "3"),
        ("HEADLESS", "false"),
        ("OLLAMA_MODEL", "llama3:70b"),
        ("CALENDAR_LOAD_WAIT_MS", "8000"),
    ]);
    let settings = Settings::from_lookup(|n| map.get(n).cloned()).unwrap();
    assert_eq!(settings.email, "me@example.com");
    assert_eq!(settings.password, "hunter2");
    assert_eq!(settings.days_ahead, 3);
    assert!(!settings.headless);
    assert_eq!(settings.ollama_model, "llama3:70b");
    assert_eq!(settings.timeouts.calendar_render_ms, 8000);
}

#[test]
fn rejects_unparseable_days_ahead() {
    let map = vars(&[("DAYS_AHEAD", "tomorrow")]);
    let err = Settings::from_lookup(|n| map.get(n).cloned()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { name: "DAYS_AHEAD", .. }));
}

#[test]
fn pushover_requires_both_keys() {
    let both = vars(&[("PUSHOVER_USER_KEY", "u"), ("PUSHOVER_APP_TOKEN", "t")]);
    let settings = Settings::from_lookup(|n| both.get(n).cloned()).unwrap();
    assert!(settings.notifications_enabled());

    let half = vars(&[("PUSHOVER_USER_KEY", "u")]);
    let settings = Settings::from_lookup(|n| half.get(n).cloned()).unwrap();
    assert!(!settings.notifications_enabled());
}

#[test]
fn validate_collects_all_missing_fields() {
    let settings = Settings::from_lookup(|_| None).unwrap();
    let err = settings.validate().unwrap_err();
    let ConfigError::Invalid(errors) = err else {
        panic!("expected Invalid");
    };
    assert!(errors.iter().any(|e| e.contains("EMAIL")));
    assert!(errors.iter().any(|e| e.contains("PASSWORD")));
    assert!(errors.iter().any(|e| e.contains("system prompt")));
}

#[test]
fn validate_passes_with_credentials_and_prompt() {
    let mut prompt = NamedTempFile::new().unwrap();
    writeln!(prompt, "pick the 6am class").unwrap();
    let path = prompt.path().to_str().unwrap().to_string();

    let map = vars(&[
        ("EMAIL", "me@example.com"),
        ("PASSWORD", "hunter2"),
        ("SYSTEM_PROMPT_FILE", &path),
    ]);
    let settings = Settings::from_lookup(|n| map.get(n).cloned()).unwrap();
    settings.validate().unwrap();
    assert_eq!(settings.load_system_prompt().unwrap().trim(), "pick the 6am class");
}

#[test]
fn missing_prompt_file_is_unreadable() {
    let map = vars(&[("SYSTEM_PROMPT_FILE", "/nonexistent/prompt.txt")]);
    let settings = Settings::from_lookup(|n| map.get(n).cloned()).unwrap();
    assert!(matches!(
        settings.load_system_prompt(),
        Err(ConfigError::PromptUnreadable { .. })
    ));
}
