//! Authentication module
//!
//! - [`AuthContext`] - session context over the auth collaborator
//! - [`Session`] - signed-in user and role snapshot

pub mod session;

pub use session::{AuthContext, Session};
