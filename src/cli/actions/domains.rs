use crate::{
    cli::{
        actions::{or_dash, require},
        globals::GlobalArgs,
    },
    features::{
        auth::Route,
        domains::{self, filter_domains},
    },
};
use anyhow::Result;

#[derive(Debug)]
pub enum Command {
    List { search: Option<String> },
    Add { name: String },
    Toggle { id: String },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute a domain action.
/// # Errors
/// Returns an error if no session is stored or the API call fails.
pub async fn execute(args: Args) -> Result<()> {
    let gateway = args.globals.connect()?;
    require(Route::User, gateway.credentials())?;

    match args.command {
        Command::List { search } => {
            let domains = filter_domains(
                domains::list_domains(&gateway).await?,
                search.as_deref().unwrap_or_default(),
            );

            if domains.is_empty() {
                println!("No domains found");
            }
            for domain in domains {
                println!(
                    "{:<26} {:<40} {:<8} {}",
                    or_dash(domain.id()),
                    domain.domain_name,
                    domain.status,
                    or_dash(domain.created_at.as_deref()),
                );
            }
        }
        Command::Add { name } => {
            domains::add_domain(&gateway, &name).await?;
            println!("Domain added");
        }
        Command::Toggle { id } => {
            let domain = domains::find_domain(&gateway, &id).await?;
            let status = domains::toggle_status(&gateway, &domain).await?;
            println!("{} is now {}", domain.domain_name, status);
        }
    }

    Ok(())
}
