use crate::cli::actions::{auth, domains, users, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::Users(args) => users::execute(args).await,
        Action::Domains(args) => domains::execute(args).await,
    }
}
