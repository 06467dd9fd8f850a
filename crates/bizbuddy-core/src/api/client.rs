//! HTTP client for the BizBuddy backend.
//!
//! The backend exposes three authentication endpoints and the chat endpoint;
//! all bodies are JSON. Failures carry a `{"detail": ...}` message that is
//! surfaced through `ApiError`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::auth::{AuthBackend, InvalidCredential};
use crate::models::{AdviceField, ChatAnswer, Identity, LoginResponse};

use super::ApiError;

/// HTTP request timeout in seconds.
///
/// This is also the upper bound on how long a session operation can hold the
/// published state in its loading phase - there is no other cancellation.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the BizBuddy backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a new API client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Log in and receive the bearer token plus the user's identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))
    }

    /// Create an account. The success signal is the status code; the response
    /// body carries nothing the client needs.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/api/auth/register", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Ask the backend who a token belongs to. The token travels as a query
    /// parameter, matching the backend's verify endpoint.
    pub async fn verify_token(&self, token: &str) -> Result<Identity, ApiError> {
        let url = format!("{}/api/auth/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", token)])
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("verify response: {}", e)))
    }

    /// Ask a business question. The bearer token is attached when present;
    /// the endpoint also serves anonymous callers.
    pub async fn ask(
        &self,
        token: Option<&str>,
        field: AdviceField,
        question: &str,
    ) -> Result<ChatAnswer, ApiError> {
        let url = format!("{}/chat", self.base_url);

        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "field": field.title(), "question": question }));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;

        let answer: ChatAnswer = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("chat response: {}", e)))?;

        debug!(
            field = field.title(),
            similarity = ?answer.similarity_score,
            "Chat answer received"
        );

        Ok(answer)
    }

    /// Check if a response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn verify(&self, token: &str) -> Result<Identity, InvalidCredential> {
        // Fail closed: rejection, transport failure, and a malformed body all
        // collapse into the same signal. The distinction survives only in the
        // diagnostic reason.
        self.verify_token(token).await.map_err(|e| {
            debug!(error = %e, "Token verification failed");
            InvalidCredential {
                reason: e.to_string(),
            }
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        ApiClient::login(self, email, password).await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        ApiClient::register(self, username, email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ana() -> serde_json::Value {
        json!({ "id": 1, "username": "ana", "email": "ana@x.com" })
    }

    #[tokio::test]
    async fn test_login_parses_token_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "email": "ana@x.com", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok1",
                "token_type": "bearer",
                "user": ana(),
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let login = client.login("ana@x.com", "secret").await.unwrap();

        assert_eq!(login.access_token, "tok1");
        assert_eq!(login.user.id, 1);
        assert_eq!(login.user.username, "ana");
        assert_eq!(login.user.email, "ana@x.com");
    }

    #[tokio::test]
    async fn test_login_rejection_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "detail": "Invalid email or password" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client.login("ana@x.com", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_register_carries_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "detail": "Email already registered" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = client
            .register("bob", "bob@x.com", "pw123456")
            .await
            .unwrap_err();

        assert_eq!(err.detail(), Some("Email already registered"));
    }

    #[tokio::test]
    async fn test_verify_token_returns_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(query_param("token", "tok-valid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ana()))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let identity = client.verify_token("tok-valid").await.unwrap();

        assert_eq!(identity.username, "ana");
    }

    #[tokio::test]
    async fn test_verify_collapses_rejection_to_invalid_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "detail": "Invalid or expired token" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = AuthBackend::verify(&client, "tok-stale").await.unwrap_err();

        assert!(!err.reason.is_empty());
    }

    #[tokio::test]
    async fn test_verify_collapses_transport_failure_to_invalid_credential() {
        // Port 1 is never listening; the send itself fails.
        let client =
            ApiClient::with_timeout("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = AuthBackend::verify(&client, "tok-any").await.unwrap_err();

        assert!(!err.reason.is_empty());
    }

    #[tokio::test]
    async fn test_ask_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("authorization", "Bearer tok1"))
            .and(body_json(json!({ "field": "Marketing", "question": "How do I price?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matched_question": "How should I price my product?",
                "detected_field": "Marketing",
                "similarity_score": 0.82,
                "answer": "Start from your costs and the value delivered.",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let answer = client
            .ask(Some("tok1"), AdviceField::Marketing, "How do I price?")
            .await
            .unwrap();

        assert_eq!(answer.answer, "Start from your costs and the value delivered.");
        assert_eq!(answer.similarity_score, Some(0.82));
    }

    #[tokio::test]
    async fn test_ask_works_anonymously() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "I'm sorry, I couldn't find a suitable answer.",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let answer = client
            .ask(None, AdviceField::Finance, "What is a runway?")
            .await
            .unwrap();

        assert!(answer.matched_question.is_none());
        assert!(answer.similarity_score.is_none());
    }
}
