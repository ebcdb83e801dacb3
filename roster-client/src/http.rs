//! HTTP client for the backend APIs

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{ClientConfig, ClientError, ClientResult};

/// Shared HTTP client
///
/// Clones share the session token, so signing in through the auth
/// collaborator authorizes the row and blob collaborators too.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<ClientConfig>,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::Setup(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: Arc::new(RwLock::new(config.token.clone())),
            config: Arc::new(config.clone()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Set the session token
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Get the current session token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Bearer value: session token, else the API key
    fn auth_header(&self) -> Option<String> {
        self.token()
            .or_else(|| self.config.api_key.clone())
            .map(|t| format!("Bearer {}", t))
    }

    /// Start a request with the standard headers
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.client.request(method, self.config.url(path));
        if let Some(key) = &self.config.api_key {
            request = request.header("apikey", key);
        }
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        request
    }

    /// Send and map failure statuses to errors
    pub async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        Self::check(response).await
    }

    /// Map a failure status to an error, passing successful responses through
    pub async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %text, "Backend request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            _ => ClientError::Rejected {
                status: status.as_u16(),
                message: text,
            },
        })
    }

    /// Send and decode a JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.send(request).await?;
        Self::handle_response(response).await
    }

    /// Decode a successful response body
    pub async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(self.request(Method::GET, path)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send_json(self.request(Method::POST, path).json(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let http = HttpClient::new(&ClientConfig::default().with_api_key("anon")).unwrap();
        let clone = http.clone();
        assert_eq!(http.auth_header().as_deref(), Some("Bearer anon"));

        clone.set_token(Some("session".into()));
        assert_eq!(http.token().as_deref(), Some("session"));
        assert_eq!(http.auth_header().as_deref(), Some("Bearer session"));

        http.set_token(None);
        assert!(clone.token().is_none());
    }
}
