//! Object storage blob store (one bucket)

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use shared::backend::{BackendResult, BlobStore, PutOptions};

use crate::HttpClient;

/// Objects fetched per list call
const LIST_PAGE: usize = 1000;

#[derive(Debug, Clone)]
pub struct RestBlobStore {
    http: HttpClient,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

impl RestBlobStore {
    pub fn new(http: HttpClient, bucket: impl Into<String>) -> Self {
        Self {
            http,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn put(&self, key: &str, content: Vec<u8>, options: PutOptions) -> BackendResult<()> {
        let mut request = self
            .http
            .request(Method::POST, &format!("storage/v1/object/{}/{}", self.bucket, key))
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(content);
        if let Some(content_type) = &options.content_type {
            request = request.header(http::header::CONTENT_TYPE, content_type);
        }
        if let Some(cache_control) = &options.cache_control {
            request = request.header(http::header::CACHE_CONTROL, cache_control);
        }

        self.http.send(request).await?;
        tracing::debug!(bucket = %self.bucket, key, "Object stored");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.http
            .config()
            .url(&format!("storage/v1/object/public/{}/{}", self.bucket, key))
    }

    async fn list(&self) -> BackendResult<Vec<String>> {
        let path = format!("storage/v1/object/list/{}", self.bucket);
        let mut keys = Vec::new();
        loop {
            let body = json!({
                "prefix": "",
                "limit": LIST_PAGE,
                "offset": keys.len(),
                "sortBy": { "column": "name", "order": "asc" },
            });
            let page: Vec<ObjectEntry> = self.http.post(&path, &body).await?;
            let fetched = page.len();
            keys.extend(page.into_iter().map(|entry| entry.name));
            if fetched < LIST_PAGE {
                break;
            }
        }
        Ok(keys)
    }

    async fn remove(&self, keys: &[String]) -> BackendResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let request = self
            .http
            .request(Method::DELETE, &format!("storage/v1/object/{}", self.bucket))
            .json(&json!({ "prefixes": keys }));
        self.http.send(request).await?;
        tracing::debug!(bucket = %self.bucket, count = keys.len(), "Objects removed");
        Ok(())
    }
}
