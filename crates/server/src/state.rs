//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::{EmailService, Notifier, TokenService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    tokens: TokenService,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    /// Build the application state.
    ///
    /// Seller notifications are enabled only when SMTP is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(
        config: &AppConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let tokens = TokenService::from_config(&config.jwt);

        let notifier: Option<Arc<dyn Notifier>> = match &config.email {
            Some(email_config) => Some(Arc::new(EmailService::new(email_config)?)),
            None => {
                tracing::warn!("SMTP not configured; seller notifications disabled");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                pool,
                tokens,
                notifier,
            }),
        })
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.inner.notifier.as_ref()
    }
}
