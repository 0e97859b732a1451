//! Input and wire types for the admin user endpoints. Passwords stay in
//! `SecretString` until the request body is built.

use crate::{
    errors::AppError,
    features::auth::types::{Role, User},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Form input for creating a user.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub role: Role,
}

/// Form input for updating a user. A blank password keeps the current one.
#[derive(Debug)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password: Option<SecretString>,
    pub role: Role,
}

#[derive(Serialize)]
pub struct CreateUserRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Serialize)]
pub struct UpdateUserRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

impl NewUser {
    /// Trims name and email and checks that every field is present. The
    /// password is sent as typed.
    ///
    /// # Errors
    /// `Validation` when name, email or password is blank.
    pub fn to_request(&self) -> Result<CreateUserRequest<'_>, AppError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let password = self.password.expose_secret();
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AppError::Validation(
                "Name, email, password are required".to_string(),
            ));
        }

        Ok(CreateUserRequest {
            name,
            email,
            password,
            role: self.role,
        })
    }
}

impl UserUpdate {
    /// # Errors
    /// `Validation` when name or email is blank.
    pub fn to_request(&self) -> Result<UpdateUserRequest<'_>, AppError> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "Name and email are required".to_string(),
            ));
        }

        Ok(UpdateUserRequest {
            name,
            email,
            role: self.role,
            password: self
                .password
                .as_ref()
                .map(|password| password.expose_secret())
                .filter(|password| !password.trim().is_empty()),
        })
    }
}

/// Keeps users whose name, email or role contains `query`, ignoring case.
/// A blank query keeps everything.
#[must_use]
pub fn filter_users(users: Vec<User>, query: &str) -> Vec<User> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return users;
    }

    users
        .into_iter()
        .filter(|user| {
            user.name.to_lowercase().contains(&query)
                || user.email.to_lowercase().contains(&query)
                || user.role.as_str().contains(&query)
        })
        .collect()
}
