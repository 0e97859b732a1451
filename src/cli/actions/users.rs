use crate::{
    cli::{
        actions::{or_dash, require},
        globals::GlobalArgs,
    },
    features::{
        auth::Route,
        users::{self, filter_users, NewUser, UserUpdate},
    },
};
use anyhow::Result;

#[derive(Debug)]
pub enum Command {
    List { search: Option<String> },
    Create(NewUser),
    Update { id: String, update: UserUpdate },
    Delete { id: String },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute a user management action.
/// # Errors
/// Returns an error if the session is not an admin session or the API call fails.
pub async fn execute(args: Args) -> Result<()> {
    let gateway = args.globals.connect()?;
    require(Route::Admin, gateway.credentials())?;

    match args.command {
        Command::List { search } => {
            let users = filter_users(
                users::list_users(&gateway).await?,
                search.as_deref().unwrap_or_default(),
            );

            if users.is_empty() {
                println!("No users found");
            }
            for user in users {
                println!(
                    "{:<26} {:<24} {:<32} {:<6} {}",
                    or_dash(user.id()),
                    or_dash(Some(&user.name)),
                    user.email,
                    user.role,
                    or_dash(user.created_at.as_deref()),
                );
            }
        }
        Command::Create(input) => {
            users::create_user(&gateway, &input).await?;
            println!("User created");
        }
        Command::Update { id, update } => {
            users::update_user(&gateway, &id, &update).await?;
            println!("User updated");
        }
        Command::Delete { id } => {
            users::delete_user(&gateway, &id).await?;
            println!("User deleted");
        }
    }

    Ok(())
}
