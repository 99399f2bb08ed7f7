use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::core::auth::{AuthApi, LoginRequest, LoginResponse};

/// JSON login endpoint. Each attempt is a single POST.
pub struct HttpAuthApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .user_agent("subtrack/0.1")
                .build()?,
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(name = "AuthLogin", skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = format!("{}/login", self.base_url);
        debug!("Posting login to {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Login request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} from login service", status));
        }

        response
            .json::<LoginResponse>()
            .await
            .context("Failed to parse login response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> LoginRequest {
        LoginRequest {
            email: "ana@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_posts_credentials_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Welcome",
                "userId": "42",
                "nombre": "Ana"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpAuthApi::new(&format!("{}/", server.uri())).unwrap();
        let response = api.login(&request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.user_id.as_deref(), Some("42"));
        assert_eq!(response.name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpAuthApi::new(&server.uri()).unwrap();
        let err = api.login(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: 503 Service Unavailable from login service");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let api = HttpAuthApi::new(&server.uri()).unwrap();
        let err = api.login(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse login response"));
    }
}
