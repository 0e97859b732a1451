use crate::features::auth::types::non_empty;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Active,
    /// Also used when the API omits the status, so a toggle activates it.
    #[default]
    Inactive,
}

impl DomainStatus {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DomainStatus::Active => DomainStatus::Inactive,
            DomainStatus::Inactive => DomainStatus::Active,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DomainStatus::Active => "active",
            DomainStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.pad(self.as_str())
    }
}

/// A domain as listed by the API, which may send the identifier as `id`,
/// `_id` or both.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub domain_name: String,
    #[serde(default)]
    pub status: DomainStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Domain {
    /// `id` when non-empty, otherwise `_id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or_else(|| non_empty(self.object_id.as_deref()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDomainRequest<'a> {
    pub domain_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub status: DomainStatus,
}

/// Keeps domains whose name contains `query`, ignoring case.
#[must_use]
pub fn filter_domains(domains: Vec<Domain>, query: &str) -> Vec<Domain> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return domains;
    }

    domains
        .into_iter()
        .filter(|domain| domain.domain_name.to_lowercase().contains(&query))
        .collect()
}
