pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STORE: &str = "store";
pub const ARG_TIMEOUT: &str = "timeout";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_NAME: &str = "name";
pub const ARG_ROLE: &str = "role";
pub const ARG_ID: &str = "id";
pub const ARG_SEARCH: &str = "search";
pub const ARG_DOMAIN: &str = "domain";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("admin-console")
        .about("User and domain administration")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("API base URL, example: https://console.example.com")
                .env("ADMIN_CONSOLE_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STORE)
                .long(ARG_STORE)
                .help("Credential store file (default: ~/.admin-console/credentials.json)")
                .env("ADMIN_CONSOLE_STORE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Per-request timeout in seconds, 0 disables it (default: 10)")
                .env("ADMIN_CONSOLE_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(
                    Arg::new(ARG_EMAIL)
                        .long(ARG_EMAIL)
                        .help("Account email")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .long(ARG_PASSWORD)
                        .help("Account password")
                        .env("ADMIN_CONSOLE_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(users())
        .subcommand(domains());

    logging::with_args(command)
}

fn users() -> Command {
    Command::new("users")
        .about("Manage console users (admin only)")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List users").arg(search()))
        .subcommand(
            Command::new("create")
                .about("Create a user")
                .arg(Arg::new(ARG_NAME).long(ARG_NAME).help("Full name").required(true))
                .arg(Arg::new(ARG_EMAIL).long(ARG_EMAIL).help("Email").required(true))
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .long(ARG_PASSWORD)
                        .help("Initial password")
                        .required(true),
                )
                .arg(role()),
        )
        .subcommand(
            Command::new("update")
                .about("Update a user")
                .arg(id())
                .arg(Arg::new(ARG_NAME).long(ARG_NAME).help("Full name").required(true))
                .arg(Arg::new(ARG_EMAIL).long(ARG_EMAIL).help("Email").required(true))
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .long(ARG_PASSWORD)
                        .help("New password, omit to keep the current one"),
                )
                .arg(role()),
        )
        .subcommand(Command::new("delete").about("Delete a user").arg(id()))
}

fn domains() -> Command {
    Command::new("domains")
        .about("Manage your domains")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List domains").arg(search()))
        .subcommand(
            Command::new("add").about("Add a domain").arg(
                Arg::new(ARG_DOMAIN)
                    .help("Domain name, example: example.com")
                    .required(true),
            ),
        )
        .subcommand(
            Command::new("toggle")
                .about("Switch a domain between active and inactive")
                .arg(id()),
        )
}

fn id() -> Arg {
    Arg::new(ARG_ID).help("Resource id").required(true)
}

fn search() -> Arg {
    Arg::new(ARG_SEARCH)
        .short('s')
        .long(ARG_SEARCH)
        .help("Only show entries containing this text")
}

fn role() -> Arg {
    Arg::new(ARG_ROLE)
        .long(ARG_ROLE)
        .help("Role")
        .default_value("user")
        .value_parser(["admin", "user"])
        .action(ArgAction::Set)
}
