use crate::{
    cli::{actions::or_dash, globals::GlobalArgs},
    features::auth::{self, landing, Route},
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub enum Command {
    Login { email: String, password: SecretString },
    Logout,
    Whoami,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute an auth action.
/// # Errors
/// Returns an error if the login is rejected or the credential store fails.
pub async fn execute(args: Args) -> Result<()> {
    let gateway = args.globals.connect()?;

    match args.command {
        Command::Login { email, password } => {
            let user = auth::login(&gateway, &email, &password).await?;
            let route = landing(user.role);
            debug!(%route, "landing route");

            println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
            println!("Next: admin-console {}", next_command(route));
        }
        Command::Logout => {
            auth::logout(gateway.credentials())?;
            println!("Signed out");
        }
        Command::Whoami => {
            let state = auth::session(gateway.credentials())?;
            match (state.user, state.is_authenticated) {
                (Some(user), true) => {
                    println!("{} <{}>", user.name, user.email);
                    println!("role: {}", user.role);
                    println!("id:   {}", or_dash(user.id()));
                }
                (None, true) => println!("Signed in (no stored profile)"),
                (_, false) => println!("Not signed in"),
            }
        }
    }

    Ok(())
}

fn next_command(route: Route) -> &'static str {
    match route {
        Route::Admin => "users list",
        _ => "domains list",
    }
}
