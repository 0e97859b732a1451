//! Auth feature covering login, logout, session inspection and route gating.
//! This module touches security boundaries and must avoid logging secrets or
//! token material.
//!
//! Flow Overview: login posts credentials without a bearer token and persists
//! the returned token pair together with the user. Every later call goes
//! through the gateway, which refreshes the pair on expiry. Logout only clears
//! local state.

pub mod client;
pub mod guards;
pub mod types;

pub use client::{login, logout, session, SessionState};
pub use guards::{gate, landing, Access, Route};
