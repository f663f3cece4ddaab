//! Operator credential and its persisted form

use crate::api::UserInstance;
use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of operator holds the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instance,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instance => "instance",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "instance" => Ok(Role::Instance),
            other => Err(format!("Unknown role: {} (expected admin or instance)", other)),
        }
    }
}

/// Bearer token plus the role it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: SecretString,
    pub role: Role,
}

impl Credential {
    pub fn new(token: impl Into<SecretString>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }
}

/// The document stored under the auth namespace.
///
/// Field names match what the web console persisted, so a state file can be
/// shared between the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthState {
    pub token: Option<SecretString>,
    #[serde(rename = "type")]
    pub role: Option<Role>,
    pub user: Option<UserInstance>,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl AuthState {
    pub fn authenticated(credential: &Credential, user: Option<UserInstance>) -> Self {
        Self {
            token: Some(credential.token.clone()),
            role: Some(credential.role),
            user,
            is_authenticated: true,
        }
    }

    /// The credential, if the state is authenticated and complete.
    pub fn credential(&self) -> Option<Credential> {
        if !self.is_authenticated {
            return None;
        }
        match (&self.token, self.role) {
            (Some(token), Some(role)) if !token.is_empty() => Some(Credential {
                token: token.clone(),
                role,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("instance".parse::<Role>().unwrap(), Role::Instance);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_state_wire_names() {
        let state = AuthState::authenticated(&Credential::new("tok-1234567890", Role::Admin), None);
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({"token": "tok-1234567890", "type": "admin", "user": null, "isAuthenticated": true})
        );
    }

    #[test]
    fn test_credential_requires_authenticated_flag() {
        let state: AuthState = serde_json::from_value(json!({
            "token": "tok", "type": "instance", "isAuthenticated": false
        }))
        .unwrap();
        assert!(state.credential().is_none());

        let state: AuthState = serde_json::from_value(json!({
            "token": "tok", "type": "instance", "isAuthenticated": true
        }))
        .unwrap();
        assert_eq!(state.credential().unwrap().role, Role::Instance);

        assert!(AuthState::default().credential().is_none());
    }
}
