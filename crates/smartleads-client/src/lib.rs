//! HTTP client for the SmartLeads lead-search API.
//!
//! [`LeadsApiClient`] implements [`smartleads_search::SearchBackend`], so it
//! can be handed straight to a `SearchCoordinator`.

mod client;
mod error;
mod types;

pub use client::{CompanyFilter, LeadsApiClient};
pub use error::ClientError;
