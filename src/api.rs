//! HTTP access to the divisions service.
//!
//! [`DivisionsApi`] is the seam the application talks to; [`HttpDivisionsApi`]
//! implements it over a blocking `reqwest` client.
//!
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::model::{self, Division, DivisionId, DivisionPayload, DivisionRow};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },
    #[error("invalid response from {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations offered by the divisions service.
pub trait DivisionsApi {
    fn list_all(&self) -> ApiResult<Vec<Division>>;

    fn list_subdivisions(&self, id: DivisionId) -> ApiResult<Vec<Division>>;

    fn create(&self, payload: &DivisionPayload) -> ApiResult<Division>;

    fn update(&self, id: DivisionId, payload: &DivisionPayload) -> ApiResult<Division>;

    fn delete(&self, id: DivisionId) -> ApiResult<()>;

    /// Fetch every division and derive parent names and subdivision counts locally.
    fn list_all_enriched(&self) -> ApiResult<Vec<DivisionRow>> {
        Ok(model::enrich(self.list_all()?))
    }
}

#[derive(Debug, Clone)]
pub struct HttpDivisionsApi {
    client: Client,
    base: String,
}

impl HttpDivisionsApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured client (proxy, TLS or header settings).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn execute(
        &self,
        method: Method,
        url: &str,
        request: RequestBuilder,
    ) -> ApiResult<reqwest::blocking::Response> {
        tracing::debug!(%method, url, "sending request");
        let response = request.send().map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%method, url, %status, "request rejected");
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&DivisionPayload>,
    ) -> ApiResult<T> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = self.execute(method.clone(), &url, request)?;
        response
            .json::<T>()
            .map_err(|source| ApiError::Decode { method, url, source })
    }
}

impl DivisionsApi for HttpDivisionsApi {
    fn list_all(&self) -> ApiResult<Vec<Division>> {
        self.fetch_json(Method::GET, "/divisions", None)
    }

    fn list_subdivisions(&self, id: DivisionId) -> ApiResult<Vec<Division>> {
        self.fetch_json(Method::GET, &format!("/divisions/{id}/subdivisions"), None)
    }

    fn create(&self, payload: &DivisionPayload) -> ApiResult<Division> {
        self.fetch_json(Method::POST, "/divisions", Some(payload))
    }

    fn update(&self, id: DivisionId, payload: &DivisionPayload) -> ApiResult<Division> {
        self.fetch_json(Method::PATCH, &format!("/divisions/{id}"), Some(payload))
    }

    fn delete(&self, id: DivisionId) -> ApiResult<()> {
        let url = self.url(&format!("/divisions/{id}"));
        let request = self.client.delete(&url);
        self.execute(Method::DELETE, &url, request).map(|_| ())
    }
}
