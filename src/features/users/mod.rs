//! Admin user management. Every call needs an admin session; the API enforces
//! the role and these helpers only validate input before sending.

pub mod client;
pub mod types;

pub use client::{create_user, delete_user, list_users, update_user};
pub use types::{filter_users, NewUser, UserUpdate};
