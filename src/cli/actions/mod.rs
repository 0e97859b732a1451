pub mod auth;
pub mod domains;
pub mod users;

mod run;

use crate::{
    features::auth::{gate, session, Access, Route},
    gateway::Credentials,
};
use anyhow::{anyhow, Result};

#[derive(Debug)]
pub enum Action {
    Auth(auth::Args),
    Users(users::Args),
    Domains(domains::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}

/// Refuses to run a command whose screen the stored session may not open.
fn require(route: Route, credentials: &Credentials) -> Result<()> {
    match gate(route, &session(credentials)?) {
        Access::Granted => Ok(()),
        Access::Redirect(Route::Unauthorized) => Err(anyhow!(
            "Unauthorized: {} requires the admin role",
            route
        )),
        Access::Redirect(_) => Err(anyhow!(
            "Not signed in. Run `admin-console login` first."
        )),
    }
}

/// Placeholder for optional values in listings.
fn or_dash(value: Option<&str>) -> &str {
    value.filter(|value| !value.is_empty()).unwrap_or("-")
}
