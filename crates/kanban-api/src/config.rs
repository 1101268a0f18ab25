//! Startup configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use kanban_core::outbox::DEFAULT_MAX_ERROR_LENGTH;
use kanban_outbox::DispatcherConfig;

use crate::error::AppError;

/// Server, pool, dispatcher and telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// Outbox dispatcher settings.
    pub dispatcher: DispatcherConfig,
    /// OTLP collector endpoint; export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".into()))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        if database_max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        let poll_secs = parse_or(&lookup, "OUTBOX_POLL_INTERVAL_SECS", 30u64)?;
        let batch_size = parse_or(&lookup, "OUTBOX_BATCH_SIZE", 20usize)?;
        let max_error_length =
            parse_or(&lookup, "OUTBOX_MAX_ERROR_LENGTH", DEFAULT_MAX_ERROR_LENGTH)?;
        if poll_secs == 0 {
            return Err(AppError::Config(
                "OUTBOX_POLL_INTERVAL_SECS must be at least 1".into(),
            ));
        }
        if batch_size == 0 {
            return Err(AppError::Config("OUTBOX_BATCH_SIZE must be at least 1".into()));
        }
        if !(1..=DEFAULT_MAX_ERROR_LENGTH).contains(&max_error_length) {
            return Err(AppError::Config(format!(
                "OUTBOX_MAX_ERROR_LENGTH must be between 1 and {DEFAULT_MAX_ERROR_LENGTH}"
            )));
        }

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            dispatcher: DispatcherConfig {
                batch_size,
                poll_interval: Duration::from_secs(poll_secs),
                max_error_length,
            },
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        // Arrange
        let env = lookup(&[("DATABASE_URL", "postgres://localhost/kanban")]);

        // Act
        let config = AppConfig::from_lookup(env).unwrap();

        // Assert
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.dispatcher, DispatcherConfig::default());
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_overrides_are_read() {
        let env = lookup(&[
            ("DATABASE_URL", "postgres://db/kanban"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("OUTBOX_POLL_INTERVAL_SECS", "5"),
            ("OUTBOX_BATCH_SIZE", "50"),
            ("OUTBOX_MAX_ERROR_LENGTH", "500"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ]);

        let config = AppConfig::from_lookup(env).unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.dispatcher.poll_interval, Duration::from_secs(5));
        assert_eq!(config.dispatcher.batch_size, 50);
        assert_eq!(config.dispatcher.max_error_length, 500);
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_missing_database_url_is_config_error() {
        let result = AppConfig::from_lookup(lookup(&[]));

        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn test_unparseable_port_is_config_error() {
        let env = lookup(&[("DATABASE_URL", "postgres://db"), ("PORT", "eighty")]);

        let result = AppConfig::from_lookup(env);

        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("PORT")));
    }

    #[test]
    fn test_error_length_above_column_width_is_rejected() {
        let env = lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("OUTBOX_MAX_ERROR_LENGTH", "5000"),
        ]);

        let result = AppConfig::from_lookup(env);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let env = lookup(&[("DATABASE_URL", "postgres://db"), ("OUTBOX_BATCH_SIZE", "0")]);

        assert!(AppConfig::from_lookup(env).is_err());
    }
}
