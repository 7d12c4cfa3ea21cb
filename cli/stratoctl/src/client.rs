//! HTTP client for API communication.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, Credentials};
use crate::error::CliError;
use crate::order::{Order, OrderSource};

/// API client for the platform.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from config and credentials.
    pub fn new(config: &Config, credentials: Option<&Credentials>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("strato/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(creds) = credentials {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", creds.token))
                    .context("Invalid token format")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url().trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        debug!(method = "GET", path, "API request");
        let response = self.client.get(self.url(path)).send().await?;

        self.handle_response(response).await
    }

    /// Fetch a `{ "items": [...] }` listing.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CliError> {
        let response: ListResponse<T> = self.get(path).await?;
        Ok(response.items)
    }

    /// Make a POST request with an optional Idempotency-Key.
    pub async fn post_with_idempotency_key<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<T, CliError> {
        debug!(method = "POST", path, "API request");
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(key) = idempotency_key {
            request = request.header(crate::idempotency::IDEMPOTENCY_KEY_HEADER, key);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Make a PATCH request with an optional Idempotency-Key.
    pub async fn patch_with_idempotency_key<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<T, CliError> {
        debug!(method = "PATCH", path, "API request");
        let mut request = self.client.patch(self.url(path)).json(body);
        if let Some(key) = idempotency_key {
            request = request.header(crate::idempotency::IDEMPOTENCY_KEY_HEADER, key);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Make a DELETE request with an optional Idempotency-Key.
    pub async fn delete_with_idempotency_key(
        &self,
        path: &str,
        idempotency_key: Option<&str>,
    ) -> Result<(), CliError> {
        debug!(method = "DELETE", path, "API request");
        let mut request = self.client.delete(self.url(path));
        if let Some(key) = idempotency_key {
            request = request.header(crate::idempotency::IDEMPOTENCY_KEY_HEADER, key);
        }

        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle a successful or error response.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to parse response: {}", e)))
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle an error response.
    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, CliError> {
        let status = response.status().as_u16();

        let error_body: ApiErrorResponse =
            response.json().await.unwrap_or_else(|_| ApiErrorResponse {
                code: "unknown".to_string(),
                message: "Unknown error".to_string(),
                request_id: None,
            });
        debug!(status, code = %error_body.code, "API error");

        if status == 401 {
            return Err(CliError::NotAuthenticated);
        }

        Err(CliError::api(
            status,
            error_body.code,
            error_body.message,
            error_body.request_id,
        ))
    }
}

#[async_trait]
impl OrderSource for ApiClient {
    async fn order(&self, order_id: u64) -> Result<Order, CliError> {
        self.get(&format!("/v1/orders/{order_id}")).await
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    items: Vec<T>,
}

/// API error response structure.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: String,
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::order::OrderStatus;

    fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let config = Config {
            api_url: format!("{}/", server.uri()),
            ..Config::default()
        };
        let creds = token.map(|t| Credentials::new(t.to_string()));
        ApiClient::new(&config, creds.as_ref()).unwrap()
    }

    #[test]
    fn test_url_building() {
        let config = Config::default();
        let client = ApiClient::new(&config, None).unwrap();
        assert!(client.url("/v1/servers").ends_with("/v1/servers"));
    }

    #[tokio::test]
    async fn fetches_order_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/12"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "status": "completed",
                "resource_id": 99
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = client_for(&server, Some("secret")).order(12).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.resource_id, Some(99));
    }

    #[tokio::test]
    async fn lists_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ssh_keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "n": 1 }, { "n": 2 }]
            })))
            .mount(&server)
            .await;

        let items: Vec<serde_json::Value> = client_for(&server, None)
            .list("/v1/ssh_keys")
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn maps_error_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/4"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "not_found",
                "message": "no such order",
                "request_id": "req_abc"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None).order(4).await.unwrap_err();
        match err {
            CliError::Api {
                status,
                code,
                request_id,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "not_found");
                assert_eq!(request_id.as_deref(), Some("req_abc"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_maps_to_not_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("stale")).order(1).await.unwrap_err();
        assert!(matches!(err, CliError::NotAuthenticated));
    }

    #[tokio::test]
    async fn sends_idempotency_key_on_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/servers"))
            .and(header(crate::idempotency::IDEMPOTENCY_KEY_HEADER, "key-1"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(json!({ "ordering": "/v1/orders/3" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let accepted: serde_json::Value = client_for(&server, None)
            .post_with_idempotency_key("/v1/servers", &json!({ "name": "web" }), Some("key-1"))
            .await
            .unwrap();
        assert_eq!(accepted["ordering"], "/v1/orders/3");
    }
}
