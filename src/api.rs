//! JSON helpers over the gateway with consistent error handling. Feature
//! clients use these helpers so request setup, envelope decoding and error
//! extraction live in one place. The helpers never log bodies; callers must
//! still avoid logging sensitive data.

use crate::{
    errors::AppError,
    gateway::{ApiRequest, ApiResponse, Gateway, Transport},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Success envelope used by every endpoint: `{"data": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Fetches a list that may come back as `{"data": [..]}`,
/// `{"data": {"<key>": [..]}}` or a bare array.
///
/// # Errors
/// Gateway errors, `AppError::Http` for non-2xx statuses and `AppError::Parse`
/// when the items do not match `R`.
pub async fn get_list<T: Transport, R: DeserializeOwned>(
    gateway: &Gateway<T>,
    path: &str,
    key: &str,
) -> Result<Vec<R>, AppError> {
    let response = send_checked(gateway, ApiRequest::get(path)).await?;
    decode_list(&response.body, key)
}

/// Posts JSON and ignores the response body.
///
/// # Errors
/// Same as [`delete`], plus `AppError::Serialization` for unencodable bodies.
pub async fn post_json<T: Transport, B: Serialize + ?Sized>(
    gateway: &Gateway<T>,
    path: &str,
    body: &B,
) -> Result<(), AppError> {
    send_checked(gateway, ApiRequest::post(path).json(body)?).await?;
    Ok(())
}

/// Replaces a resource with a JSON body.
///
/// # Errors
/// Same as [`post_json`].
pub async fn put_json<T: Transport, B: Serialize + ?Sized>(
    gateway: &Gateway<T>,
    path: &str,
    body: &B,
) -> Result<(), AppError> {
    send_checked(gateway, ApiRequest::put(path).json(body)?).await?;
    Ok(())
}

/// Partially updates a resource with a JSON body.
///
/// # Errors
/// Same as [`post_json`].
pub async fn patch_json<T: Transport, B: Serialize + ?Sized>(
    gateway: &Gateway<T>,
    path: &str,
    body: &B,
) -> Result<(), AppError> {
    send_checked(gateway, ApiRequest::patch(path).json(body)?).await?;
    Ok(())
}

/// Deletes a resource.
///
/// # Errors
/// Gateway errors and `AppError::Http` for non-2xx statuses.
pub async fn delete<T: Transport>(gateway: &Gateway<T>, path: &str) -> Result<(), AppError> {
    send_checked(gateway, ApiRequest::delete(path)).await?;
    Ok(())
}

/// Sends through the gateway and turns non-2xx responses into errors.
async fn send_checked<T: Transport>(
    gateway: &Gateway<T>,
    request: ApiRequest,
) -> Result<ApiResponse, AppError> {
    let response = gateway.send(request).await?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(error_from_response(&response))
    }
}

fn decode_list<R: DeserializeOwned>(body: &str, key: &str) -> Result<Vec<R>, AppError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))?;

    let items = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => match object.remove("data") {
            Some(data @ Value::Array(_)) => data,
            Some(Value::Object(mut data)) => data.remove(key).unwrap_or(Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        },
        _ => {
            return Err(AppError::Parse(
                "Failed to decode response: expected a list".to_string(),
            ))
        }
    };

    serde_json::from_value(items)
        .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
}

/// Builds the error for a non-2xx response, preferring the body's `message`.
#[must_use]
pub fn error_from_response(response: &ApiResponse) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.message)
        .map_or_else(|| sanitize_body(&response.body), |message| sanitize_body(&message));

    AppError::Http {
        status: response.status,
        message,
    }
}

/// Trims and truncates error text for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
