//! Client configuration

use std::time::Duration;

/// Client configuration for connecting to the backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "http://localhost:54321")
    pub base_url: String,

    /// API key sent as `apikey` (and as bearer token until signed in)
    pub api_key: Option<String>,

    /// Access token for an existing session
    pub token: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Bucket holding member photos
    pub bucket: String,

    /// Table holding admin roles
    pub admin_table: String,
}

impl ClientConfig {
    /// Create a new client configuration with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            token: None,
            timeout_ms: 30_000,
            bucket: "photos".to_string(),
            admin_table: "admins".to_string(),
        }
    }

    /// Set the API key; empty means none
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_admin_table(mut self, table: impl Into<String>) -> Self {
        self.admin_table = table.into();
        self
    }

    /// Absolute URL for a path under the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_url() {
        let config = ClientConfig::new("http://db.local/")
            .with_api_key("")
            .with_bucket("foto")
            .with_timeout(Duration::from_secs(5));

        assert!(config.api_key.is_none());
        assert_eq!(config.bucket, "foto");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.url("/rest/v1/jemaat"), "http://db.local/rest/v1/jemaat");
        assert_eq!(
            ClientConfig::default().with_api_key("k").api_key.as_deref(),
            Some("k")
        );
    }
}
