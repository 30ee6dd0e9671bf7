//! Login against the site's two UI variants.
//!
//! The site renders structurally different login entry points depending on
//! session and deployment state. Each variant is a [`LoginStrategy`] probed
//! in fixed priority order with a cheap existence check before any
//! interaction; the whole two-variant attempt is retried once after a
//! reload.

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

use async_trait::async_trait;
use tracing::{info, warn};

use wodbot_browser::BrowserError;

use crate::error::RunError;
use crate::page::ClassPage;

/// Settle after first landing on (or reloading) the site root.
const HOME_SETTLE_MS: u64 = 3_000;

/// Settle after clicking a login entry point, before the form is used.
const ENTRY_SETTLE_MS: u64 = 2_000;

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// One way the site renders its login entry point. Variants differ only in
/// how the entry point is found; the credential form behind it is the same.
#[async_trait]
trait LoginStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap existence check, no interaction.
    async fn detect(&self, page: &dyn ClassPage) -> Result<bool, BrowserError>;

    async fn click_entry(&self, page: &dyn ClassPage) -> Result<(), BrowserError>;

    /// Click the entry point and submit the credential form.
    async fn execute(
        &self,
        page: &dyn ClassPage,
        credentials: &Credentials,
    ) -> Result<(), BrowserError> {
        self.click_entry(page).await?;
        page.settle(ENTRY_SETTLE_MS).await;

        page.fill_labeled_field("Email", &credentials.email).await?;
        page.fill_labeled_field("Password", &credentials.password).await?;
        page.click_button_named("Sign in").await?;
        page.wait_idle().await
    }
}

/// Flow A: a visible text link labeled "Login".
struct TextLinkLogin;

#[async_trait]
impl LoginStrategy for TextLinkLogin {
    fn name(&self) -> &'static str {
        "text link"
    }

    async fn detect(&self, page: &dyn ClassPage) -> Result<bool, BrowserError> {
        page.has_login_text().await
    }

    async fn click_entry(&self, page: &dyn ClassPage) -> Result<(), BrowserError> {
        page.click_login_text().await
    }
}

/// Flow B: a link located by its accessibility role rather than by text.
struct RoleLinkLogin;

#[async_trait]
impl LoginStrategy for RoleLinkLogin {
    fn name(&self) -> &'static str {
        "role link"
    }

    async fn detect(&self, page: &dyn ClassPage) -> Result<bool, BrowserError> {
        page.has_login_link_role().await
    }

    async fn click_entry(&self, page: &dyn ClassPage) -> Result<(), BrowserError> {
        page.click_login_link_role().await
    }
}

/// Authenticates one run against the site.
pub struct AuthFlow {
    credentials: Credentials,
}

impl AuthFlow {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Navigate to the site root and log in.
    ///
    /// On any failure the page is reloaded and the full two-variant
    /// attempt runs exactly once more; a second failure is terminal.
    pub async fn login(&self, page: &dyn ClassPage) -> Result<(), RunError> {
        info!("Navigating to the site root");
        page.open_home()
            .await
            .map_err(|e| RunError::Authentication(format!("opening site root: {e}")))?;
        page.settle(HOME_SETTLE_MS).await;

        match self.attempt(page).await {
            Ok(()) => {
                info!("Login successful");
                return Ok(());
            }
            Err(e) => warn!("Login attempt failed ({e}); reloading and retrying"),
        }

        page.reload_home()
            .await
            .map_err(|e| RunError::Authentication(format!("reloading for retry: {e}")))?;
        page.settle(HOME_SETTLE_MS).await;

        match self.attempt(page).await {
            Ok(()) => {
                info!("Login successful after retry");
                Ok(())
            }
            Err(e) => Err(RunError::Authentication(format!(
                "both login flows failed after retry: {e}"
            ))),
        }
    }

    /// One pass over the login variants in priority order.
    async fn attempt(&self, page: &dyn ClassPage) -> Result<(), BrowserError> {
        let strategies: [&dyn LoginStrategy; 2] = [&TextLinkLogin, &RoleLinkLogin];
        for strategy in strategies {
            if strategy.detect(page).await? {
                info!("Found login entry point ({})", strategy.name());
                return strategy.execute(page, &self.credentials).await;
            }
        }
        Err(BrowserError::ElementNotFound(
            "no login entry point on page".to_string(),
        ))
    }
}
