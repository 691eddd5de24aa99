//! HTTP client for the lead API.
//!
//! Wraps `reqwest` with typed request/response bodies and maps HTTP status
//! codes onto [`ClientError`] variants.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use smartleads_core::{AppConfig, Category, CompanyCollection, SearchRequest};
use smartleads_search::{JobId, SearchBackend};

use crate::error::ClientError;
use crate::types::{
    EmpresaRow, ProgressResponse, SearchAccepted, SearchPayload, SendEmailPayload,
    SendEmailResponse,
};

/// Query filters for [`LeadsApiClient::list_companies`]. The default lists
/// every stored company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub category: Option<Category>,
    pub validated: Option<bool>,
}

/// Client for the lead-search REST API.
///
/// Use [`LeadsApiClient::new`] with the loaded [`AppConfig`], or
/// [`LeadsApiClient::with_base_url`] to point at a mock server in tests.
pub struct LeadsApiClient {
    client: Client,
    base_url: Url,
    user_id: String,
}

impl LeadsApiClient {
    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `api_url` is not a usable base URL.
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_url,
            &config.user_id,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a usable base URL.
    pub fn with_base_url(
        base_url: &str,
        user_id: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so endpoint segments append to the path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url: parsed,
            user_id: user_id.to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Starts a server-side search and returns its job id.
    ///
    /// The request is sent as-is; validate it first (the coordinator does).
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not `{"search_id": ..}`.
    pub async fn start_search(&self, request: &SearchRequest) -> Result<JobId, ClientError> {
        let url = self.endpoint(&["search"]);
        let payload = SearchPayload::new(request, &self.user_id);
        tracing::debug!(url = %url, rubro = payload.rubro, "POST search");

        let response = self.client.post(url.clone()).json(&payload).send().await?;
        let accepted: SearchAccepted = read_json(response, &url, "start_search").await?;
        Ok(JobId::new(accepted.search_id.into_string()))
    }

    /// Fetches the progress value of a running search.
    ///
    /// # Errors
    ///
    /// - [`ClientError::JobNotFound`] if the server does not know the id.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not `{"progress": n}`.
    pub async fn search_progress(&self, job_id: &JobId) -> Result<i32, ClientError> {
        let url = self.endpoint(&["search", job_id.as_str(), "progress"]);
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::JobNotFound {
                job_id: job_id.to_string(),
            });
        }
        let body: ProgressResponse =
            read_json(response, &url, &format!("search_progress(id={job_id})")).await?;
        Ok(body.progress)
    }

    /// Lists stored companies, deduplicated by id in server order.
    ///
    /// Rows with neither `id` nor `osm_id` are skipped.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a JSON array of rows.
    pub async fn list_companies(
        &self,
        filter: &CompanyFilter,
    ) -> Result<CompanyCollection, ClientError> {
        let url = self.endpoint(&["empresas"]);
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(category) = filter.category {
            query.push(("rubro", category.id().to_string()));
        }
        if let Some(validated) = filter.validated {
            query.push(("validada", validated.to_string()));
        }

        let response = self.client.get(url.clone()).query(&query).send().await?;
        let rows: Vec<EmpresaRow> = read_json(response, &url, "list_companies").await?;
        let total = rows.len();

        let mut companies = CompanyCollection::new();
        for record in rows.into_iter().filter_map(EmpresaRow::into_record) {
            companies.insert(record);
        }
        if companies.len() != total {
            tracing::debug!(
                rows = total,
                kept = companies.len(),
                "dropped duplicate or unidentified company rows"
            );
        }
        Ok(companies)
    }

    /// Asks the server to render `template_id` for one company and send it.
    /// Returns the server's `success` flag.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not valid JSON.
    pub async fn send_email(
        &self,
        company_id: &str,
        template_id: &str,
    ) -> Result<bool, ClientError> {
        let url = self.endpoint(&["send-email"]);
        let payload = SendEmailPayload {
            user_id: &self.user_id,
            empresa_id: company_id,
            template_id,
        };
        let response = self.client.post(url.clone()).json(&payload).send().await?;
        let body: SendEmailResponse = read_json(
            response,
            &url,
            &format!("send_email(empresa_id={company_id})"),
        )
        .await?;
        if !body.success {
            tracing::warn!(company_id, template_id, "server reported email not sent");
        }
        Ok(body.success)
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Asserts a 2xx status and decodes the body as `T`.
async fn read_json<T: DeserializeOwned>(
    response: Response,
    url: &Url,
    context: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

impl SearchBackend for LeadsApiClient {
    type Error = ClientError;

    async fn submit(&self, request: &SearchRequest) -> Result<JobId, Self::Error> {
        self.start_search(request).await
    }

    async fn progress(&self, job_id: &JobId) -> Result<i32, Self::Error> {
        self.search_progress(job_id).await
    }

    async fn results(&self) -> Result<CompanyCollection, Self::Error> {
        self.list_companies(&CompanyFilter::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> LeadsApiClient {
        LeadsApiClient::with_base_url(base_url, "dev-user-123", 30, "smartleads-test")
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_segments() {
        let client = test_client("http://localhost:8000");
        let url = client.endpoint(&["search", "abc-123", "progress"]);
        assert_eq!(url.as_str(), "http://localhost:8000/search/abc-123/progress");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = test_client("https://leads.example/api/v1/");
        let url = client.endpoint(&["empresas"]);
        assert_eq!(url.as_str(), "https://leads.example/api/v1/empresas");
    }

    #[test]
    fn endpoint_encodes_job_ids() {
        let client = test_client("http://localhost:8000");
        let url = client.endpoint(&["search", "a/b c", "progress"]);
        assert_eq!(url.as_str(), "http://localhost:8000/search/a%2Fb%20c/progress");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = LeadsApiClient::with_base_url("not a url", "u", 30, "ua");
        assert!(matches!(result, Err(ClientError::InvalidBaseUrl(_))));
    }
}
