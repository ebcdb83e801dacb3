use async_trait::async_trait;

use super::{BackendError, BackendResult};
use crate::models::{AdminRole, Identity};

/// Identity / session contract
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Currently signed-in user, if any
    async fn current_user(&self) -> BackendResult<Option<Identity>>;

    /// Admin role row for a user, if any
    async fn admin_role(&self, identity: &Identity) -> BackendResult<Option<AdminRole>>;

    /// Password sign-in
    async fn sign_in(&self, _email: &str, _password: &str) -> BackendResult<Identity> {
        Err(BackendError::Unsupported("sign_in".into()))
    }

    async fn sign_out(&self) -> BackendResult<()>;
}
