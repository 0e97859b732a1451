use std::fmt;

/// Status code the API uses to signal an expired or invalid access token.
pub const UNAUTHORIZED: u16 = 401;

/// Errors surfaced by the gateway, the typed API helpers and the feature clients.
///
/// The enum is `Clone` so one refresh failure can be delivered to every request
/// waiting on the same refresh exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Config(String),
    Network(String),
    Timeout(String),
    Http { status: u16, message: String },
    Parse(String),
    Serialization(String),
    Storage(String),
    Validation(String),
}

impl AppError {
    /// True for the authentication-expiry outcome that drives token refresh.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Http { status, .. } if *status == UNAUTHORIZED)
    }

    /// Message suitable for a toast or a terminal line, without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            AppError::Config(message)
            | AppError::Network(message)
            | AppError::Timeout(message)
            | AppError::Parse(message)
            | AppError::Serialization(message)
            | AppError::Storage(message)
            | AppError::Validation(message) => message,
            AppError::Http { message, .. } => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(message) => write!(formatter, "Config error: {message}"),
            AppError::Network(message) => write!(formatter, "Network error: {message}"),
            AppError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AppError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AppError::Parse(message) => write!(formatter, "Response error: {message}"),
            AppError::Serialization(message) => {
                write!(formatter, "Request error: {message}")
            }
            AppError::Storage(message) => write!(formatter, "Storage error: {message}"),
            AppError::Validation(message) => write!(formatter, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}
