//! Domains owned by the signed-in user: list, add and activation toggle.

pub mod client;
pub mod types;

pub use client::{add_domain, find_domain, list_domains, set_status, toggle_status};
pub use types::{filter_domains, Domain, DomainStatus};
