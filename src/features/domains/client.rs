//! Client helpers for the user domain endpoints.

use crate::{
    api::{get_list, patch_json, post_json},
    errors::AppError,
    features::domains::types::{AddDomainRequest, Domain, DomainStatus, StatusUpdate},
    gateway::{Gateway, Transport},
};
use tracing::instrument;

const DOMAINS_PATH: &str = "/api/v1/user/domains";

/// Fetches the signed-in user's domains.
///
/// # Errors
/// Gateway, HTTP and decoding errors.
#[instrument(skip_all)]
pub async fn list_domains<T: Transport>(gateway: &Gateway<T>) -> Result<Vec<Domain>, AppError> {
    get_list(gateway, DOMAINS_PATH, "domains").await
}

/// Looks a domain up by id in the current list.
///
/// # Errors
/// `Validation` when no listed domain has `id`, plus the errors of
/// [`list_domains`].
pub async fn find_domain<T: Transport>(gateway: &Gateway<T>, id: &str) -> Result<Domain, AppError> {
    let id = require_id(id)?;
    list_domains(gateway)
        .await?
        .into_iter()
        .find(|domain| domain.id() == Some(id))
        .ok_or_else(|| AppError::Validation(format!("Domain {id} not found")))
}

/// Registers a new domain.
///
/// # Errors
/// `Validation` for a blank name, otherwise gateway and HTTP errors.
#[instrument(skip(gateway))]
pub async fn add_domain<T: Transport>(gateway: &Gateway<T>, name: &str) -> Result<(), AppError> {
    let domain_name = name.trim();
    if domain_name.is_empty() {
        return Err(AppError::Validation("Domain name is required".to_string()));
    }

    post_json(gateway, DOMAINS_PATH, &AddDomainRequest { domain_name }).await
}

/// Flips the domain between active and inactive and returns the new status.
///
/// # Errors
/// `Validation` when the domain has no id, otherwise gateway and HTTP errors.
pub async fn toggle_status<T: Transport>(
    gateway: &Gateway<T>,
    domain: &Domain,
) -> Result<DomainStatus, AppError> {
    let next = domain.status.toggled();
    set_status(gateway, domain.id().unwrap_or_default(), next).await?;
    Ok(next)
}

/// Sets the status of the domain with `id`.
///
/// # Errors
/// `Validation` for a blank id, otherwise gateway and HTTP errors.
#[instrument(skip(gateway))]
pub async fn set_status<T: Transport>(
    gateway: &Gateway<T>,
    id: &str,
    status: DomainStatus,
) -> Result<(), AppError> {
    let id = require_id(id)?;
    patch_json(gateway, &format!("{DOMAINS_PATH}/{id}"), &StatusUpdate { status }).await
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Domain id missing".to_string()));
    }
    Ok(trimmed)
}
