//! Identity and admin role

use serde::{Deserialize, Serialize};

use super::serde_helpers::flexible_id;

/// Role value that grants administrator access
pub const ADMIN_ROLE: i32 = 1;

/// Authenticated user as reported by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Row of the admin table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRole {
    pub role: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl AdminRole {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role() {
        assert!(AdminRole { role: 1, name: None }.is_admin());
        assert!(!AdminRole { role: 2, name: Some("Staff".into()) }.is_admin());
        assert!(!AdminRole { role: 0, name: None }.is_admin());
    }

    #[test]
    fn test_identity_from_json() {
        let id: Identity =
            serde_json::from_str(r#"{"id":"9b2e","email":"admin@gereja.id","aud":"x"}"#).unwrap();
        assert_eq!(id.id, "9b2e");
        assert_eq!(id.email.as_deref(), Some("admin@gereja.id"));
    }
}
