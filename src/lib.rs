//! # admin-console
//!
//! Command-line console for the user and domain management API. Every
//! protected call goes through the authenticated request [`gateway`], which
//! attaches the stored bearer token and transparently recovers from expiry.
//!
//! ## Token refresh
//!
//! Access tokens are short lived. When a call comes back with `401`, the
//! gateway exchanges the stored refresh token for a new pair and replays the
//! call once. Only one exchange runs per expiry: every other call that fails
//! while it is in flight waits for its outcome and then replays with the new
//! token, or fails with the same error. A request is never replayed twice,
//! and an unrecoverable failure clears the stored credentials so later calls
//! fail fast until the next login.
//!
//! ## Credential store
//!
//! The token pair and the signed-in user live in a small JSON file (see
//! [`gateway::FileStore`]) written with owner-only permissions. Multi-key
//! updates land in one write.
//!
//! ## Features
//!
//! - [`features::auth`]: login, logout, session and the screen gate.
//! - [`features::users`]: admin user management.
//! - [`features::domains`]: the signed-in user's domains.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod features;
pub mod gateway;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
