//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Upper bound for `ABANDONED_THRESHOLD_HOURS` (one year).
pub const MAX_ABANDONED_THRESHOLD_HOURS: i64 = 24 * 366;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `pretty` or `json`
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on in-memory stores
/// - `ADMIN_EMAIL`: the single admin identity
/// - `PAYMENT_KEY_ID`, `PAYMENT_KEY_SECRET`: gateway credentials
/// - `CURRENCY`: currency code sent to the gateway
/// - `ABANDONED_THRESHOLD_HOURS`: default abandoned-cart sweep threshold
/// - `AUTH_TOKENS`: `token=user_uuid:email` pairs, comma separated
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub admin_email: Option<String>,
    pub payment_key_id: String,
    pub payment_key_secret: String,
    pub currency: String,
    pub abandoned_threshold_hours: i64,
    pub auth_tokens: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: parsed_or("PORT", defaults.port),
            log_level: env_or("RUST_LOG", defaults.log_level),
            log_format: parsed_or("LOG_FORMAT", defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            admin_email: non_empty("ADMIN_EMAIL"),
            payment_key_id: env_or("PAYMENT_KEY_ID", defaults.payment_key_id),
            payment_key_secret: env_or("PAYMENT_KEY_SECRET", defaults.payment_key_secret),
            currency: env_or("CURRENCY", defaults.currency),
            abandoned_threshold_hours: Some(parsed_or(
                "ABANDONED_THRESHOLD_HOURS",
                defaults.abandoned_threshold_hours,
            ))
            .filter(|hours| (0..=MAX_ABANDONED_THRESHOLD_HOURS).contains(hours))
            .unwrap_or(defaults.abandoned_threshold_hours),
            auth_tokens: env_or("AUTH_TOKENS", defaults.auth_tokens),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Falls back to two hours when the configured value is out of range.
    pub fn abandoned_after(&self) -> chrono::Duration {
        Some(self.abandoned_threshold_hours)
            .filter(|hours| (0..=MAX_ABANDONED_THRESHOLD_HOURS).contains(hours))
            .and_then(chrono::Duration::try_hours)
            .unwrap_or_else(|| chrono::Duration::hours(2))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            admin_email: None,
            payment_key_id: "rzp_test_key".to_string(),
            payment_key_secret: "rzp_test_secret".to_string(),
            currency: "INR".to_string(),
            abandoned_threshold_hours: 2,
            auth_tokens: String::new(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const KEYS: [&str; 6] = [
        "PORT",
        "LOG_FORMAT",
        "DATABASE_URL",
        "ADMIN_EMAIL",
        "ABANDONED_THRESHOLD_HOURS",
        "CURRENCY",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: tests touching the environment run serially.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.currency, "INR");
        assert_eq!(config.abandoned_after(), chrono::Duration::hours(2));
        assert!(config.database_url.is_none());
        assert!(config.admin_email.is_none());
    }

    #[test]
    #[serial]
    fn test_reads_environment() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "8080");
            std::env::set_var("LOG_FORMAT", "JSON");
            std::env::set_var("ADMIN_EMAIL", " admin@example.com ");
            std::env::set_var("ABANDONED_THRESHOLD_HOURS", "6");
        }

        let config = Config::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.admin_email.as_deref(), Some("admin@example.com"));
        assert_eq!(config.abandoned_after(), chrono::Duration::hours(6));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "not-a-port");
            std::env::set_var("ABANDONED_THRESHOLD_HOURS", "soon");
            std::env::set_var("DATABASE_URL", "   ");
        }

        let config = Config::from_env();
        assert_eq!(config.port, 3000);
        assert_eq!(config.abandoned_threshold_hours, 2);
        assert!(config.database_url.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_out_of_range_threshold_falls_back() {
        for raw in ["-3", "100000000000", "9223372036854775807"] {
            clear_env();
            unsafe { std::env::set_var("ABANDONED_THRESHOLD_HOURS", raw) };

            let config = Config::from_env();
            assert_eq!(config.abandoned_threshold_hours, 2, "{raw}");
            assert_eq!(config.abandoned_after(), chrono::Duration::hours(2));
        }
        clear_env();

        let config = Config {
            abandoned_threshold_hours: i64::MAX,
            ..Config::default()
        };
        assert_eq!(config.abandoned_after(), chrono::Duration::hours(2));
    }
}
