use crate::{
    cli::{
        actions::{auth, domains, users, Action},
        commands::{
            ARG_API_URL, ARG_DOMAIN, ARG_EMAIL, ARG_ID, ARG_NAME, ARG_PASSWORD, ARG_ROLE,
            ARG_SEARCH, ARG_STORE, ARG_TIMEOUT,
        },
        globals::GlobalArgs,
    },
    features::{
        auth::types::Role,
        users::{NewUser, UserUpdate},
    },
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = GlobalArgs {
        api_url: matches.get_one::<String>(ARG_API_URL).cloned(),
        store: matches.get_one::<String>(ARG_STORE).cloned(),
        timeout_secs: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
    };

    match matches.subcommand() {
        Some(("login", sub_m)) => Ok(Action::Auth(auth::Args {
            globals,
            command: auth::Command::Login {
                email: required(sub_m, ARG_EMAIL)?,
                password: SecretString::from(required(sub_m, ARG_PASSWORD)?),
            },
        })),
        Some(("logout", _)) => Ok(Action::Auth(auth::Args {
            globals,
            command: auth::Command::Logout,
        })),
        Some(("whoami", _)) => Ok(Action::Auth(auth::Args {
            globals,
            command: auth::Command::Whoami,
        })),
        Some(("users", sub_m)) => Ok(Action::Users(users::Args {
            globals,
            command: users_command(sub_m)?,
        })),
        Some(("domains", sub_m)) => Ok(Action::Domains(domains::Args {
            globals,
            command: domains_command(sub_m)?,
        })),
        Some((name, _)) => Err(anyhow!("unknown command: {name}")),
        None => Err(anyhow!("missing command")),
    }
}

fn users_command(matches: &ArgMatches) -> Result<users::Command> {
    match matches.subcommand() {
        Some(("list", sub_m)) => Ok(users::Command::List {
            search: sub_m.get_one::<String>(ARG_SEARCH).cloned(),
        }),
        Some(("create", sub_m)) => Ok(users::Command::Create(NewUser {
            name: required(sub_m, ARG_NAME)?,
            email: required(sub_m, ARG_EMAIL)?,
            password: SecretString::from(required(sub_m, ARG_PASSWORD)?),
            role: role(sub_m)?,
        })),
        Some(("update", sub_m)) => Ok(users::Command::Update {
            id: required(sub_m, ARG_ID)?,
            update: UserUpdate {
                name: required(sub_m, ARG_NAME)?,
                email: required(sub_m, ARG_EMAIL)?,
                password: sub_m
                    .get_one::<String>(ARG_PASSWORD)
                    .cloned()
                    .map(SecretString::from),
                role: role(sub_m)?,
            },
        }),
        Some(("delete", sub_m)) => Ok(users::Command::Delete {
            id: required(sub_m, ARG_ID)?,
        }),
        _ => Err(anyhow!("missing users subcommand")),
    }
}

fn domains_command(matches: &ArgMatches) -> Result<domains::Command> {
    match matches.subcommand() {
        Some(("list", sub_m)) => Ok(domains::Command::List {
            search: sub_m.get_one::<String>(ARG_SEARCH).cloned(),
        }),
        Some(("add", sub_m)) => Ok(domains::Command::Add {
            name: required(sub_m, ARG_DOMAIN)?,
        }),
        Some(("toggle", sub_m)) => Ok(domains::Command::Toggle {
            id: required(sub_m, ARG_ID)?,
        }),
        _ => Err(anyhow!("missing domains subcommand")),
    }
}

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn role(matches: &ArgMatches) -> Result<Role> {
    matches
        .get_one::<String>(ARG_ROLE)
        .map_or(Ok(Role::User), |value| value.parse::<Role>())
        .map_err(|err| anyhow!(err))
}
