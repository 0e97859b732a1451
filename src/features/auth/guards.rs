//! Route gate for the console screens. The gate is UX only; the API enforces
//! access on every call.

use crate::features::auth::{client::SessionState, types::Role};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Unauthorized,
    Dashboard,
    Admin,
    User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Route),
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Unauthorized => "/unauthorized",
            Route::Dashboard => "/dashboard",
            Route::Admin => "/admin",
            Route::User => "/user",
        }
    }

    /// Unknown paths fall back to the login screen.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/unauthorized" => Route::Unauthorized,
            "/dashboard" => Route::Dashboard,
            "/admin" => Route::Admin,
            "/user" => Route::User,
            _ => Route::Login,
        }
    }

    #[must_use]
    pub fn requires_auth(self) -> bool {
        matches!(self, Route::Dashboard | Route::Admin | Route::User)
    }

    #[must_use]
    pub fn requires_admin(self) -> bool {
        self == Route::Admin
    }
}

impl fmt::Display for Route {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.pad(self.path())
    }
}

/// Decides whether `session` may open `route`.
#[must_use]
pub fn gate(route: Route, session: &SessionState) -> Access {
    if !route.requires_auth() {
        return Access::Granted;
    }
    if !session.is_authenticated {
        return Access::Redirect(Route::Login);
    }
    if route.requires_admin() && session.user.as_ref().map(|user| user.role) != Some(Role::Admin) {
        return Access::Redirect(Route::Unauthorized);
    }
    Access::Granted
}

/// Screen a user lands on after signing in.
#[must_use]
pub fn landing(role: Role) -> Route {
    match role {
        Role::Admin => Route::Admin,
        Role::User => Route::User,
    }
}
