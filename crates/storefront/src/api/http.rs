//! `reqwest` implementation of the [`ShopApi`] port.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, ApiReply, BackendCredentials, Endpoint, ShopApi};
use crate::config::ApiConfig;

/// Talks to the backend over HTTP.
#[derive(Clone)]
pub struct HttpShopApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShopApi {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, endpoint.path()))?)
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    #[instrument(skip(self, credentials, endpoint), fields(route = %endpoint.route()))]
    async fn call(
        &self,
        credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<ApiReply, ApiError> {
        let url = self.url_for(&endpoint)?;
        let mut request = self.client.request(endpoint.method(), url);

        let query = endpoint.query();
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(body) = endpoint.body()? {
            request = request.json(&body);
        }
        if let Some(cookie) = credentials.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();

        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        debug!(status = %status, bytes = body.len(), "Backend call succeeded");
        Ok(ApiReply { body, set_cookies })
    }
}
