//! Roster Client - HTTP collaborators for the roster engine
//!
//! Implements the row store, blob store and auth contracts against a
//! PostgREST-style row API, an object storage API and a token auth API
//! that share one base URL and API key.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod rest;

pub use client::BackendClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use rest::{RestAuthProvider, RestBlobStore, RestRowStore};
