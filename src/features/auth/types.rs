//! Request and response types for the auth endpoints. Token and password
//! fields must never be logged; the types that carry them do not derive
//! `Debug` unless the values are wrapped in `SecretString`.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

/// A console user as returned by login and by the admin user list. The API
/// may send the identifier as `id`, `_id` or both; read it through
/// [`User::id`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// `id` when non-empty, otherwise `_id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or_else(|| non_empty(self.object_id.as_deref()))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `data` of a login response; every field is optional on the wire and
/// checked by [`LoginResponse::into_session`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
}

impl LoginResponse {
    /// Complete session, or `None` when any part is missing or blank.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        let tokens = tokens(self.access_token, self.refresh_token)?;
        Some(Session {
            tokens,
            user: self.user?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `data` of a refresh response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl RefreshedTokens {
    #[must_use]
    pub fn into_pair(self) -> Option<TokenPair> {
        tokens(self.access_token, self.refresh_token)
    }
}

#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// Result of a successful login.
#[derive(Clone, Debug)]
pub struct Session {
    pub tokens: TokenPair,
    pub user: User,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn tokens(access: Option<String>, refresh: Option<String>) -> Option<TokenPair> {
    let access = access.filter(|value| !value.is_empty())?;
    let refresh = refresh.filter(|value| !value.is_empty())?;
    Some(TokenPair {
        access_token: SecretString::from(access),
        refresh_token: SecretString::from(refresh),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn user_accepts_underscore_id_and_defaults() {
        let user: User = serde_json::from_value(json!({
            "_id": "65f0",
            "email": "ops@example.com"
        }))
        .unwrap();

        assert_eq!(user.id(), Some("65f0"));
        assert_eq!(user.name, "");
        assert_eq!(user.role, Role::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn user_tolerates_both_ids_and_missing_email() {
        let both: User = serde_json::from_value(json!({
            "_id": "u1",
            "id": "u1-virtual",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "admin"
        }))
        .unwrap();
        assert_eq!(both.id(), Some("u1-virtual"));

        let bare: User =
            serde_json::from_value(json!({"_id": "u2", "name": "Grace", "role": "admin"})).unwrap();
        assert_eq!(bare.id(), Some("u2"));
        assert_eq!(bare.email, "");
        assert!(bare.is_admin());

        let blank: User = serde_json::from_value(json!({"id": "", "_id": "u3"})).unwrap();
        assert_eq!(blank.id(), Some("u3"));
    }

    #[test]
    fn user_serializes_with_camel_case_and_plain_id() {
        let user = User {
            id: Some("1".to_string()),
            object_id: None,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Admin,
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "id": "1",
                "name": "Ada",
                "email": "ada@example.com",
                "role": "admin",
                "createdAt": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn login_response_requires_every_part() {
        let complete: LoginResponse = serde_json::from_value(json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "user": {"id": "1", "name": "Ada", "email": "ada@example.com", "role": "admin"}
        }))
        .unwrap();
        let session = complete.into_session().unwrap();
        assert_eq!(session.tokens.access_token.expose_secret(), "a1");
        assert!(session.user.is_admin());

        let missing_user: LoginResponse =
            serde_json::from_value(json!({"accessToken": "a1", "refreshToken": "r1"})).unwrap();
        assert!(missing_user.into_session().is_none());

        let blank_token: LoginResponse = serde_json::from_value(json!({
            "accessToken": "",
            "refreshToken": "r1",
            "user": {"email": "ada@example.com"}
        }))
        .unwrap();
        assert!(blank_token.into_session().is_none());
    }

    #[test]
    fn refresh_request_uses_camel_case() {
        assert_eq!(
            serde_json::to_value(RefreshRequest { refresh_token: "r1" }).unwrap(),
            json!({"refreshToken": "r1"})
        );
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" user ".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }
}
