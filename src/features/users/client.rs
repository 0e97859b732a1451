//! Client helpers for the admin user endpoints. Paths stay centralized here
//! and the backend is assumed to enforce the admin role.

use crate::{
    api::{delete, get_list, post_json, put_json},
    errors::AppError,
    features::{
        auth::types::User,
        users::types::{NewUser, UserUpdate},
    },
    gateway::{Gateway, Transport},
};
use tracing::instrument;

const ADMIN_USERS_PATH: &str = "/api/v1/admin";

/// Fetches every user.
///
/// # Errors
/// Gateway, HTTP and decoding errors.
#[instrument(skip_all)]
pub async fn list_users<T: Transport>(gateway: &Gateway<T>) -> Result<Vec<User>, AppError> {
    get_list(gateway, ADMIN_USERS_PATH, "users").await
}

/// Creates a user after presence checks.
///
/// # Errors
/// `Validation` for blank fields, otherwise gateway and HTTP errors.
#[instrument(skip_all)]
pub async fn create_user<T: Transport>(
    gateway: &Gateway<T>,
    input: &NewUser,
) -> Result<(), AppError> {
    let request = input.to_request()?;
    post_json(gateway, &format!("{ADMIN_USERS_PATH}/create"), &request).await
}

/// Replaces a user's profile; the password only changes when one is given.
///
/// # Errors
/// `Validation` for a blank id, name or email, otherwise gateway and HTTP errors.
#[instrument(skip(gateway, input))]
pub async fn update_user<T: Transport>(
    gateway: &Gateway<T>,
    id: &str,
    input: &UserUpdate,
) -> Result<(), AppError> {
    let id = require_id(id)?;
    let request = input.to_request()?;
    put_json(gateway, &format!("{ADMIN_USERS_PATH}/{id}"), &request).await
}

/// Deletes a user.
///
/// # Errors
/// `Validation` for a blank id, otherwise gateway and HTTP errors.
#[instrument(skip(gateway))]
pub async fn delete_user<T: Transport>(gateway: &Gateway<T>, id: &str) -> Result<(), AppError> {
    let id = require_id(id)?;
    delete(gateway, &format!("{ADMIN_USERS_PATH}/{id}")).await
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("User id missing".to_string()));
    }
    Ok(trimmed)
}
