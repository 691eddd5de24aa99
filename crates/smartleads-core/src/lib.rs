//! Shared data model and configuration for the `SmartLeads` client.
//!
//! Everything here is plain data: the search request and its validation,
//! company records returned by the lead API, and the environment-driven
//! [`AppConfig`]. Network and coordination logic live in the other crates.

mod app_config;
mod company;
mod config;
mod search;

use thiserror::Error;

pub use app_config::{AppConfig, CsvQuoting};
pub use company::{CompanyCollection, CompanyRecord};
pub use config::{load_app_config, load_app_config_from_env};
pub use search::{Category, Coordinates, SearchRequest, MAX_RADIUS_KM, MIN_RADIUS_KM};

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Client-side validation failures for a [`SearchRequest`].
///
/// A request that fails validation is never sent to the backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("search request needs a location name or coordinates")]
    MissingLocation,

    #[error("search request must not set both a location name and coordinates")]
    AmbiguousLocation,

    #[error("location name must not be blank")]
    BlankLocation,

    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("radius {0} km is outside the supported range {MIN_RADIUS_KM}..={MAX_RADIUS_KM}")]
    RadiusOutOfRange(u32),

    #[error("unknown business category \"{0}\"")]
    UnknownCategory(String),
}
