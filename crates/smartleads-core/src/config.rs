use crate::app_config::{AppConfig, CsvQuoting};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Tests pass a `HashMap`-backed lookup instead of touching the process env.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let api_url = or_default("SMARTLEADS_API_URL", "http://localhost:8000");
    let user_id = or_default("SMARTLEADS_USER_ID", "dev-user-123");
    let log_level = or_default("SMARTLEADS_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("SMARTLEADS_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SMARTLEADS_USER_AGENT", "smartleads/0.1 (lead-search)");

    let poll_interval_ms = parse_u64("SMARTLEADS_POLL_INTERVAL_MS", "1000")?;
    if poll_interval_ms == 0 {
        return Err(invalid(
            "SMARTLEADS_POLL_INTERVAL_MS",
            "must be greater than zero".to_string(),
        ));
    }

    let max_consecutive_poll_errors = match lookup("SMARTLEADS_MAX_CONSECUTIVE_POLL_ERRORS") {
        Ok(raw) => {
            let n = raw
                .parse::<u32>()
                .map_err(|e| invalid("SMARTLEADS_MAX_CONSECUTIVE_POLL_ERRORS", e.to_string()))?;
            if n == 0 {
                return Err(invalid(
                    "SMARTLEADS_MAX_CONSECUTIVE_POLL_ERRORS",
                    "must be greater than zero; unset it to poll indefinitely".to_string(),
                ));
            }
            Some(n)
        }
        Err(_) => None,
    };

    let csv_quoting = or_default("SMARTLEADS_CSV_QUOTING", "legacy").parse::<CsvQuoting>()?;

    Ok(AppConfig {
        api_url,
        user_id,
        log_level,
        request_timeout_secs,
        user_agent,
        poll_interval_ms,
        max_consecutive_poll_errors,
        csv_quoting,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
