use crate::enrich::Config;
use crate::record::Severity;

/// Environment variable names used by this crate for convenient
/// configuration from services.
///
/// These are purely helpers; the core enricher types remain decoupled from
/// environment access.

/// Service name reported in `serviceContext`.
pub const GCLOUD_LOG_SERVICE_ENV: &str = "GCLOUD_LOG_SERVICE";

/// Service version reported in `serviceContext`.
pub const GCLOUD_LOG_VERSION_ENV: &str = "GCLOUD_LOG_VERSION";

/// Minimum severity that triggers error-reporting enrichment,
/// e.g. `ERROR` or `CRITICAL`.
pub const GCLOUD_LOG_ERROR_LEVEL_ENV: &str = "GCLOUD_LOG_ERROR_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Build a [`Config`] from the environment, falling back to defaults for
/// anything unset or unparseable.
pub fn config_from_env() -> Config {
    let level = std::env::var(GCLOUD_LOG_ERROR_LEVEL_ENV)
        .ok()
        .and_then(|name| Severity::from_name(&name))
        .unwrap_or(Severity::Error);

    Config {
        error_reporting_level: level,
        service: env_or(GCLOUD_LOG_SERVICE_ENV, ""),
        version: env_or(GCLOUD_LOG_VERSION_ENV, ""),
        ..Config::default()
    }
}
