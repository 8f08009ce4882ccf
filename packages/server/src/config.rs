//! Startup configuration read from environment variables.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use precinct_client::RetryPolicy;
use precinct_database::DEFAULT_DB_PATH;

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// `SQLite` database file (`PRECINCT_DB_PATH`).
    pub db_path: PathBuf,
    /// Remote geography service; point validation is local when unset
    /// (`GEO_SERVICE_URL`).
    pub geo_service_url: Option<String>,
    /// Remote user service; identity and roster lookups are local when
    /// unset (`USER_SERVICE_URL`).
    pub user_service_url: Option<String>,
    /// Timeout and retries for remote calls (`UPSTREAM_TIMEOUT_MS`, which
    /// must be positive, and `UPSTREAM_MAX_RETRIES`).
    pub upstream: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            geo_service_url: None,
            user_service_url: None,
            upstream: RetryPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Unparseable values fall
    /// back to their defaults with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let present = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            bind_addr: present("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parsed(&present, "PORT").unwrap_or(defaults.port),
            db_path: present("PRECINCT_DB_PATH").map_or(defaults.db_path, PathBuf::from),
            geo_service_url: present("GEO_SERVICE_URL"),
            user_service_url: present("USER_SERVICE_URL"),
            upstream: RetryPolicy {
                timeout: parsed::<NonZeroU64>(&present, "UPSTREAM_TIMEOUT_MS")
                    .map_or(defaults.upstream.timeout, |ms| Duration::from_millis(ms.get())),
                max_retries: parsed(&present, "UPSTREAM_MAX_RETRIES")
                    .unwrap_or(defaults.upstream.max_retries),
                ..defaults.upstream
            },
        }
    }
}

fn parsed<T: std::str::FromStr>(
    present: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let value = present(name)?;
    value.parse().map_or_else(
        |_| {
            log::warn!("Ignoring invalid {name}={value:?}");
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), ServerConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "9090"),
            ("PRECINCT_DB_PATH", "/var/lib/precinct.db"),
            ("GEO_SERVICE_URL", "http://geo:8080"),
            ("USER_SERVICE_URL", "http://users:8080"),
            ("UPSTREAM_TIMEOUT_MS", "250"),
            ("UPSTREAM_MAX_RETRIES", "0"),
        ]);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/precinct.db"));
        assert_eq!(config.geo_service_url.as_deref(), Some("http://geo:8080"));
        assert_eq!(config.user_service_url.as_deref(), Some("http://users:8080"));
        assert_eq!(config.upstream.timeout, Duration::from_millis(250));
        assert_eq!(config.upstream.max_retries, 0);
    }

    #[test]
    fn invalid_and_blank_values_fall_back() {
        let config = config(&[("PORT", "eighty"), ("GEO_SERVICE_URL", "  ")]);
        assert_eq!(config.port, 8080);
        assert!(config.geo_service_url.is_none());
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = config(&[("UPSTREAM_TIMEOUT_MS", "0"), ("UPSTREAM_MAX_RETRIES", "0")]);
        assert_eq!(config.upstream.timeout, RetryPolicy::default().timeout);
        assert_eq!(config.upstream.max_retries, 0);
    }
}
