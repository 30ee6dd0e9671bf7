//! wodbot - automated Wodify class booking.
//!
//! One invocation drives one booking run: log in, open the class calendar,
//! extract the target day's roster, ask the configured model which class to
//! book, validate the answer, and click through the booking confirmation.
//! Exit code 0 means a class was booked; 1 means any failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wodbot_browser::{Browser, BrowserConfig};
use wodbot_config::{Settings, WODIFY_URL};
use wodbot_core::auth::{AuthFlow, Credentials};
use wodbot_core::dates::TargetDate;
use wodbot_core::page::{ClassPage, LivePage};
use wodbot_core::workflow::Orchestrator;
use wodbot_llm::SelectionClient;
use wodbot_notify::Notifier;

/// Automated Wodify class booking with LLM-assisted selection.
#[derive(Parser)]
#[command(name = "wodbot")]
#[command(version)]
struct Cli {
    /// Run through extraction, selection, and validation but skip the
    /// booking click and notifications.
    #[arg(long)]
    dry_run: bool,

    /// Days from today to book; overrides DAYS_AHEAD. Zero books today.
    #[arg(long)]
    days_ahead: Option<u32>,

    /// Run the browser headless; overrides HEADLESS.
    #[arg(long)]
    headless: Option<bool>,

    /// Save a debug screenshot here when the run fails.
    #[arg(long)]
    screenshot_dir: Option<PathBuf>,
}

fn init_tracing() -> anyhow::Result<()> {
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("wodbot")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer guard alive for the life of the process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    info!("============================================================");
    info!("Wodify auto-booking starting");
    info!("============================================================");

    match run(cli).await {
        Ok(()) => {
            info!("SUCCESS");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::from_env()?;
    if let Some(days_ahead) = cli.days_ahead {
        settings.days_ahead = days_ahead;
    }
    if let Some(headless) = cli.headless {
        settings.headless = headless;
    }
    // Configuration problems are pre-flight: nothing has started, so no
    // error notification is owed.
    settings.validate()?;
    let system_prompt = settings.load_system_prompt()?;

    let target = TargetDate::from_today(settings.days_ahead);
    info!("Target date: {} ({})", target.human(), target.label());

    let notifier = match &settings.pushover {
        Some(keys) => Notifier::new(&keys.user_key, &keys.app_token),
        None => Notifier::disabled(),
    };
    let selector = SelectionClient::new(
        &settings.ollama_host,
        &settings.ollama_model,
        system_prompt,
    );
    let auth = AuthFlow::new(Credentials {
        email: settings.email.clone(),
        password: settings.password.clone(),
    });

    let browser_config = BrowserConfig {
        headless: settings.headless,
        page_load_timeout_ms: settings.timeouts.page_load_ms,
        ..BrowserConfig::default()
    };

    let browser = match Browser::launch(&browser_config).await {
        Ok(browser) => browser,
        Err(e) => {
            if !cli.dry_run {
                notifier.notify_error(&format!("browser startup failed: {e}")).await;
            }
            return Err(e).context("launching browser");
        }
    };

    let page = match browser.open_page(&browser_config).await {
        Ok(page) => page,
        Err(e) => {
            if !cli.dry_run {
                notifier.notify_error(&format!("browser startup failed: {e}")).await;
            }
            browser.close().await;
            return Err(e).context("opening page");
        }
    };
    let page = LivePage::new(page, WODIFY_URL, settings.timeouts);

    let orchestrator =
        Orchestrator::new(auth, selector, &notifier, target).dry_run(cli.dry_run);

    // The browser must come down on every exit path, including Ctrl-C.
    let outcome = tokio::select! {
        result = orchestrator.run(&page) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; shutting the browser down");
            None
        }
    };

    if let (Some(Err(_)), Some(dir)) = (&outcome, &cli.screenshot_dir) {
        let path = dir.join("failure.png");
        if let Err(e) = page.capture(&path).await {
            warn!("Could not save failure screenshot: {e}");
        } else {
            info!("Failure screenshot saved: {}", path.display());
        }
    }

    browser.close().await;

    match outcome {
        Some(Ok(report)) => {
            if report.booked {
                info!(
                    "Booked {} at {}",
                    report.selection.record.class_name, report.selection.record.time_range
                );
            }
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => anyhow::bail!("run interrupted before completion"),
    }
}
