//! Backend client bundle

use std::sync::Arc;

use crate::rest::{RestAuthProvider, RestBlobStore, RestRowStore};
use crate::{ClientConfig, ClientResult, HttpClient};

/// The three collaborators over one shared HTTP session
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: HttpClient,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn row_store(&self) -> Arc<RestRowStore> {
        Arc::new(RestRowStore::new(self.http.clone()))
    }

    pub fn blob_store(&self) -> Arc<RestBlobStore> {
        Arc::new(RestBlobStore::new(
            self.http.clone(),
            self.http.config().bucket.clone(),
        ))
    }

    pub fn auth_provider(&self) -> Arc<RestAuthProvider> {
        Arc::new(RestAuthProvider::new(
            self.http.clone(),
            self.http.config().admin_table.clone(),
        ))
    }
}
