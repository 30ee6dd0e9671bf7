//! Chrome process discovery and launch.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::BrowserError;
use crate::BrowserConfig;

/// User agent presented to the site. Fixed so every run looks like the
/// same ordinary desktop Chrome.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Window and viewport size.
pub const WINDOW_WIDTH: u32 = 1440;
pub const WINDOW_HEIGHT: u32 = 900;

/// Find a Chrome executable on this machine.
pub fn find_chrome() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    let paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    #[cfg(target_os = "linux")]
    let paths = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    #[cfg(target_os = "windows")]
    let paths = [
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Command-line arguments for the given configuration.
pub(crate) fn chrome_args(config: &BrowserConfig, profile_dir: &std::path::Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", config.debug_port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--no-sandbox".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-sync".to_string(),
        format!("--user-agent={}", USER_AGENT),
        format!("--window-size={},{}", WINDOW_WIDTH, WINDOW_HEIGHT),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args
}

/// Launch Chrome with remote debugging enabled.
pub(crate) async fn launch_chrome(config: &BrowserConfig) -> Result<Child, BrowserError> {
    let chrome_path = find_chrome().ok_or(BrowserError::ChromeNotFound)?;
    let profile_dir = std::env::temp_dir().join("wodbot-chrome-profile");
    std::fs::create_dir_all(&profile_dir)?;

    info!("Launching Chrome from {}", chrome_path.display());

    let child = Command::new(&chrome_path)
        .args(chrome_args(config, &profile_dir))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    info!("Chrome launched with PID: {:?}", child.id());
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_flag_is_conditional() {
        let profile = PathBuf::from("/tmp/p");
        let mut config = BrowserConfig::default();

        config.headless = true;
        let args = chrome_args(&config, &profile);
        assert!(args.iter().any(|a| a == "--headless=new"));

        config.headless = false;
        let args = chrome_args(&config, &profile);
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn args_carry_identity_and_viewport() {
        let config = BrowserConfig::default();
        let args = chrome_args(&config, &PathBuf::from("/tmp/p"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
        assert!(args.iter().any(|a| a == "--window-size=1440,900"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
    }
}
