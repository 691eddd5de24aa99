use std::str::FromStr;

use crate::ConfigError;

/// How CSV exports quote field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvQuoting {
    /// Fields joined with bare commas, no quoting or escaping. Byte-compatible
    /// with earlier exports; values containing commas or newlines break rows.
    #[default]
    Legacy,
    /// RFC 4180 quoting for fields that need it.
    Rfc4180,
}

impl std::fmt::Display for CsvQuoting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvQuoting::Legacy => write!(f, "legacy"),
            CsvQuoting::Rfc4180 => write!(f, "rfc4180"),
        }
    }
}

impl FromStr for CsvQuoting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(CsvQuoting::Legacy),
            "rfc4180" => Ok(CsvQuoting::Rfc4180),
            other => Err(ConfigError::InvalidEnvVar {
                var: "SMARTLEADS_CSV_QUOTING".to_string(),
                reason: format!("unknown quoting mode \"{other}\" (expected legacy or rfc4180)"),
            }),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub user_id: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub poll_interval_ms: u64,
    /// `None` keeps polling through any number of transient errors.
    pub max_consecutive_poll_errors: Option<u32>,
    pub csv_quoting: CsvQuoting,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &self.api_url)
            .field("user_id", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field(
                "max_consecutive_poll_errors",
                &self.max_consecutive_poll_errors,
            )
            .field("csv_quoting", &self.csv_quoting)
            .finish()
    }
}
