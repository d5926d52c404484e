//! Connection configuration.
//!
//! Static credentials and endpoint settings, loaded from a TOML document or
//! from `CONFAB_*` environment variables. The harness treats credentials as
//! opaque input; only timeouts and settle delays are interpreted locally.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

/// Default wait budget for event expectations, in milliseconds.
const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 10_000;

/// Default settle delay before refetching state, in milliseconds.
const DEFAULT_SETTLE_DELAY_MS: u64 = 3_000;

/// Account credentials, opaque to the harness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Access token or password.
    pub token: String,
}

/// Client connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Service endpoint domain.
    pub domain: String,

    /// Account credentials.
    pub credentials: Credentials,

    /// Wait budget for event expectations, in milliseconds.
    #[serde(default = "default_expect_timeout_ms")]
    pub expect_timeout_ms: u64,

    /// Settle delay before refetching state, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_expect_timeout_ms() -> u64 {
    DEFAULT_EXPECT_TIMEOUT_MS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl ClientConfig {
    /// Parse a TOML configuration document.
    pub fn from_toml_str(input: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(input)
            .map_err(|e| ClientError::Transport(format!("invalid config: {e}")))?;
        tracing::debug!(
            domain = %config.domain,
            expect_timeout_ms = config.expect_timeout_ms,
            settle_delay_ms = config.settle_delay_ms,
            "configuration parsed"
        );
        Ok(config)
    }

    /// Load from `CONFAB_DOMAIN`, `CONFAB_EMAIL`, `CONFAB_TOKEN`, and the
    /// optional `CONFAB_EXPECT_TIMEOUT_MS` / `CONFAB_SETTLE_DELAY_MS`.
    pub fn from_env() -> Result<Self, ClientError> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| ClientError::Transport(format!("missing environment variable {name}")))
        };

        let ms_var = |name: &str, default: u64| match std::env::var(name) {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| ClientError::Transport(format!("invalid {name}: {raw}"))),
            Err(_) => Ok(default),
        };

        let config = Self {
            domain: var("CONFAB_DOMAIN")?,
            credentials: Credentials { email: var("CONFAB_EMAIL")?, token: var("CONFAB_TOKEN")? },
            expect_timeout_ms: ms_var("CONFAB_EXPECT_TIMEOUT_MS", DEFAULT_EXPECT_TIMEOUT_MS)?,
            settle_delay_ms: ms_var("CONFAB_SETTLE_DELAY_MS", DEFAULT_SETTLE_DELAY_MS)?,
        };
        tracing::debug!(domain = %config.domain, "configuration loaded from environment");
        Ok(config)
    }

    /// Wait budget for event expectations.
    pub fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    /// Settle delay before refetching state.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
