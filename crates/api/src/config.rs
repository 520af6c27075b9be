//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a generated admin token.
const GENERATED_TOKEN_LEN: usize = 8;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `EVENT_LOG`: path of the JSON-lines event log (default: `"db.jsonl"`)
/// - `ADMIN_TOKEN`: bearer token for admin requests (default: random)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub event_log: PathBuf,
    pub admin_token: String,

    /// True if `admin_token` was generated because none was configured.
    pub admin_token_generated: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let (admin_token, admin_token_generated) = match lookup("ADMIN_TOKEN") {
            Some(token) if !token.trim().is_empty() => (token, false),
            _ => (defaults.admin_token, true),
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            event_log: lookup("EVENT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.event_log),
            admin_token,
            admin_token_generated,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            event_log: PathBuf::from("db.jsonl"),
            admin_token: generate_token(),
            admin_token_generated: true,
        }
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_TOKEN_LEN)
        .map(char::from)
        .collect()
}
