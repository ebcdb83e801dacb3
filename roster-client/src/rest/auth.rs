//! Token auth provider
//!
//! Password grant for sign-in; the admin role is looked up by email in the
//! admin table through the row API.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use shared::backend::{AuthProvider, BackendError, BackendResult};
use shared::models::{AdminRole, Identity};

use crate::{ClientError, HttpClient};

#[derive(Debug, Clone)]
pub struct RestAuthProvider {
    http: HttpClient,
    admin_table: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Identity,
}

impl RestAuthProvider {
    pub fn new(http: HttpClient, admin_table: impl Into<String>) -> Self {
        Self {
            http,
            admin_table: admin_table.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn current_user(&self) -> BackendResult<Option<Identity>> {
        if self.http.token().is_none() {
            return Ok(None);
        }
        match self.http.get::<Identity>("auth/v1/user").await {
            Ok(user) => Ok(Some(user)),
            // expired or revoked session
            Err(ClientError::Unauthorized) => {
                tracing::info!("Session token rejected, signing out locally");
                self.http.set_token(None);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn admin_role(&self, identity: &Identity) -> BackendResult<Option<AdminRole>> {
        let Some(email) = identity.email.as_deref() else {
            return Ok(None);
        };
        let request = self
            .http
            .request(Method::GET, &format!("rest/v1/{}", self.admin_table))
            .query(&[("select", "role,name".to_string()), ("email", format!("eq.{}", email))]);
        let rows: Vec<AdminRole> = self.http.send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity> {
        let body = json!({ "email": email, "password": password });
        let response: TokenResponse = match self
            .http
            .post("auth/v1/token?grant_type=password", &body)
            .await
        {
            Ok(response) => response,
            Err(ClientError::Rejected { status: 400, .. }) => return Err(BackendError::Unauthorized),
            Err(e) => return Err(e.into()),
        };

        self.http.set_token(Some(response.access_token));
        tracing::info!(user_id = %response.user.id, "Signed in");
        Ok(response.user)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        if self.http.token().is_none() {
            return Ok(());
        }
        let result = self
            .http
            .send(self.http.request(Method::POST, "auth/v1/logout"))
            .await;
        // the local session ends regardless of the server's answer
        self.http.set_token(None);
        result.map(|_| ()).map_err(Into::into)
    }
}
