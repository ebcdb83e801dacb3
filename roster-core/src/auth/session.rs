//! Session context
//!
//! Wraps the auth collaborator and publishes the current session through a
//! watch channel. Components receive an `Arc<AuthContext>` at construction
//! and subscribe for the duration of their own lifetime.

use std::sync::Arc;

use shared::backend::{AuthProvider, BackendError};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{AdminRole, Identity};
use tokio::sync::watch;

/// Snapshot of the signed-in user and their role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<Identity>,
    pub role: Option<AdminRole>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Only role 1 is admin; no role row means regular user
    pub fn is_admin(&self) -> bool {
        self.user.is_some() && self.role.as_ref().is_some_and(AdminRole::is_admin)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

fn auth_error(err: BackendError) -> AppError {
    match err {
        BackendError::Unauthorized => AppError::not_authenticated(),
        other => AppError::internal(format!("Auth service error: {}", other)),
    }
}

/// Session context shared by the controller and the services
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    session: watch::Sender<Session>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self { provider, session }
    }

    /// Re-read identity and role from the auth collaborator
    pub async fn refresh(&self) -> AppResult<Session> {
        let user = self.provider.current_user().await.map_err(auth_error)?;
        let session = match user {
            Some(user) => {
                let role = self.lookup_role(&user).await;
                Session {
                    user: Some(user),
                    role,
                }
            }
            None => Session::default(),
        };

        tracing::debug!(
            user_id = session.user_id().unwrap_or("-"),
            admin = session.is_admin(),
            "Session refreshed"
        );
        self.session.send_replace(session.clone());
        Ok(session)
    }

    /// A failed role lookup degrades to a regular user
    async fn lookup_role(&self, user: &Identity) -> Option<AdminRole> {
        match self.provider.admin_role(user).await {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Admin role lookup failed");
                None
            }
        }
    }

    /// Password sign-in through the auth collaborator
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let user = self
            .provider
            .sign_in(email, password)
            .await
            .map_err(|e| match e {
                BackendError::Unauthorized | BackendError::Rejected { status: 400..=403, .. } => {
                    AppError::new(ErrorCode::InvalidCredentials)
                }
                BackendError::Unsupported(_) => {
                    AppError::with_message(ErrorCode::InvalidRequest, "Sign-in is not supported")
                }
                other => auth_error(other),
            })?;

        let role = self.lookup_role(&user).await;
        let session = Session {
            user: Some(user),
            role,
        };
        tracing::info!(user_id = session.user_id().unwrap_or("-"), admin = session.is_admin(), "Signed in");
        self.session.send_replace(session.clone());
        Ok(session)
    }

    /// Sign out; the local session is cleared even if the collaborator fails
    pub async fn sign_out(&self) -> AppResult<()> {
        let result = self.provider.sign_out().await;
        self.session.send_replace(Session::default());
        tracing::info!("Signed out");
        result.map_err(auth_error)
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn current(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Signed-in user, or `NotAuthenticated`
    pub fn require_user(&self) -> AppResult<Identity> {
        self.session
            .borrow()
            .user
            .clone()
            .ok_or_else(AppError::not_authenticated)
    }

    /// Signed-in administrator, or `NotAuthenticated` / `AdminRequired`
    pub fn require_admin(&self) -> AppResult<Identity> {
        let session = self.session.borrow();
        match &session.user {
            None => Err(AppError::not_authenticated()),
            Some(_) if !session.is_admin() => Err(AppError::admin_required()),
            Some(user) => Ok(user.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::StaticAuthProvider;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.into(),
            email: Some(format!("{id}@gereja.id")),
        }
    }

    #[tokio::test]
    async fn test_refresh_admin_session() {
        let provider = StaticAuthProvider::admin(identity("u1"));
        let ctx = AuthContext::new(Arc::new(provider));

        assert!(ctx.require_user().is_err());
        let session = ctx.refresh().await.unwrap();
        assert!(session.is_admin());
        assert_eq!(ctx.require_admin().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_regular_user_is_not_admin() {
        let provider = StaticAuthProvider::user(identity("u2"));
        let ctx = AuthContext::new(Arc::new(provider));
        ctx.refresh().await.unwrap();

        assert_eq!(ctx.require_user().unwrap().id, "u2");
        let err = ctx.require_admin().unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }

    #[tokio::test]
    async fn test_role_other_than_one_is_not_admin() {
        let provider = StaticAuthProvider::with_role(
            identity("u3"),
            AdminRole {
                role: 2,
                name: Some("Pengurus".into()),
            },
        );
        let ctx = AuthContext::new(Arc::new(provider));
        assert!(!ctx.refresh().await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn test_sign_out_clears_and_notifies() {
        let ctx = AuthContext::new(Arc::new(StaticAuthProvider::admin(identity("u1"))));
        ctx.refresh().await.unwrap();
        let mut rx = ctx.subscribe();

        ctx.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_authenticated());
        assert_eq!(
            ctx.require_user().unwrap_err().code,
            ErrorCode::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_sign_in_with_static_provider() {
        let provider = StaticAuthProvider::signed_out()
            .with_account("admin@gereja.id", "rahasia", identity("u9"), Some(1));
        let ctx = AuthContext::new(Arc::new(provider));

        let err = ctx.sign_in("admin@gereja.id", "salah").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        let session = ctx.sign_in("admin@gereja.id", "rahasia").await.unwrap();
        assert!(session.is_admin());
        assert_eq!(ctx.current().user_id(), Some("u9"));
    }
}
