//! Client wrappers for the auth endpoints. Login is the only call made
//! without a bearer token; the session helpers read local state only.

use crate::{
    api::{error_from_response, Envelope},
    errors::AppError,
    features::auth::types::{LoginRequest, LoginResponse, User},
    gateway::{ApiRequest, Credentials, Gateway, Transport},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Locally known session state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

/// Signs in and persists the token pair and user in one store write.
///
/// A 401 from the login endpoint means rejected credentials, so the call goes
/// through [`Gateway::exchange`] and never triggers a refresh.
///
/// # Errors
/// `Validation` for blank input, `Http` when the API rejects the credentials,
/// `Parse("Invalid login response")` when a token or the user is missing, and
/// `Storage` when the session cannot be persisted.
#[instrument(skip_all)]
pub async fn login<T: Transport>(
    gateway: &Gateway<T>,
    email: &str,
    password: &SecretString,
) -> Result<User, AppError> {
    let email = email.trim();
    if email.is_empty() || password.expose_secret().is_empty() {
        return Err(AppError::Validation(
            "Email and password are required.".to_string(),
        ));
    }

    let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
        email,
        password: password.expose_secret(),
    })?;

    let response = gateway.exchange(request).await?;
    if !response.is_success() {
        return Err(error_from_response(&response));
    }

    let session = serde_json::from_str::<Envelope<LoginResponse>>(&response.body)
        .ok()
        .and_then(|envelope| envelope.data.into_session())
        .ok_or_else(|| AppError::Parse("Invalid login response".to_string()))?;

    gateway.credentials().save_session(
        &session.tokens.access_token,
        &session.tokens.refresh_token,
        &session.user,
    )?;

    info!(role = %session.user.role, "signed in");

    Ok(session.user)
}

/// Clears the stored tokens and user. No API call is made.
///
/// # Errors
/// `Storage` when the store cannot be rewritten.
#[instrument(skip_all)]
pub fn logout(credentials: &Credentials) -> Result<(), AppError> {
    credentials.clear()?;
    info!("signed out");
    Ok(())
}

/// Reads the stored user and whether an access token is present.
///
/// # Errors
/// `Storage` when the store cannot be read.
pub fn session(credentials: &Credentials) -> Result<SessionState, AppError> {
    Ok(SessionState {
        user: credentials.user()?,
        is_authenticated: credentials.is_authenticated()?,
    })
}
