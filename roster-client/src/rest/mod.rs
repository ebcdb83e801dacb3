//! REST collaborators

pub mod auth;
pub mod blob_store;
pub mod row_store;

pub use auth::RestAuthProvider;
pub use blob_store::RestBlobStore;
pub use row_store::RestRowStore;
