//! Console feature areas (auth, users, domains). Each keeps endpoint paths and
//! request shapes next to its types so the CLI layer only deals with typed
//! calls, and every protected call goes through the gateway.

pub mod auth;
pub mod domains;
pub mod users;
