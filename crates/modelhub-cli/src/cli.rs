//! Command-line arguments.

use clap::{Parser, Subcommand};

use modelhub_core::config::{StoreKind, BASE_URL_ENV};

#[derive(Parser, Debug)]
#[command(name = "modelhub", version, about = "Datasets, models and training runs from the command line")]
pub struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Where to keep the login token: memory, file, keyring or encrypted
    #[arg(long, env = "MODELHUB_STORE")]
    pub store: Option<StoreKind>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG wins if set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the access token
    Login {
        /// Defaults to the last email used
        email: Option<String>,
    },
    /// Create an account
    Signup { email: String },
    /// Forget the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
    #[command(subcommand)]
    Datasets(ResourceCommand),
    #[command(subcommand)]
    Models(ResourceCommand),
    #[command(subcommand)]
    Trainings(TrainingCommand),
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Show the view a front-end path maps to, e.g. `/datasets/3`
    Open { path: String },
    /// User, datasets, models and trainings at a glance
    Dashboard,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    List,
    Show { id: i64 },
    Create { name: String },
}

#[derive(Subcommand, Debug)]
pub enum TrainingCommand {
    List,
    Show {
        id: i64,
    },
    Create {
        /// Experiment name
        #[arg(long)]
        name: String,
        /// Model id
        #[arg(long)]
        model: i64,
        /// Dataset id
        #[arg(long)]
        dataset: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List all users
    Users,
    /// Delete a user by email
    DeleteUser { email: String },
    #[command(subcommand)]
    Datasets(AdminResourceCommand),
    #[command(subcommand)]
    Models(AdminResourceCommand),
}

#[derive(Subcommand, Debug)]
pub enum AdminResourceCommand {
    List,
    Show { id: i64 },
    Create { name: String },
    Delete { id: i64 },
}
