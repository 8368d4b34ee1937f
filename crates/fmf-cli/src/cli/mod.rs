//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fmf_core::api::ContentKind;
use fmf_core::config;
use fmf_core::models::{ContactMessage, Registration};
use fmf_core::services::Services;
use fmf_core::theme::Theme;

mod commands;

#[derive(Parser)]
#[command(name = "fmf")]
#[command(version = "0.1")]
#[command(about = "ForkMyFolio portfolio client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (FMF_API_BASE_URL takes precedence)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    #[command(flatten)]
    Api(ApiCommands),
}

/// Commands that talk to the backend.
#[derive(clap::Subcommand)]
enum ApiCommands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FMF_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FMF_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,

    /// Show the public portfolio profile
    Profile,
    /// List public projects, or show one by ID
    Projects {
        #[arg(value_name = "ID")]
        id: Option<String>,
    },
    /// List public skills
    Skills,
    /// Send a message through the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },

    /// Inspect or change feature settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Manage portfolio content (admin)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Download or restore a portfolio backup (admin)
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Download the portfolio as PDF
    Pdf {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
    /// Show where navigating to PATH would lead
    Route {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

#[derive(clap::Subcommand)]
enum SettingsCommands {
    /// List all settings
    List,
    /// Print whether a feature is enabled
    Enabled {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Change a setting (admin)
    Set {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Show the admin account
    Account,
    /// Show dashboard statistics
    Stats,
    /// List items of a content kind
    List {
        #[arg(value_name = "KIND")]
        kind: ContentKind,
    },
    /// Create an item from a JSON file
    Create {
        #[arg(value_name = "KIND")]
        kind: ContentKind,
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace an item from a JSON file
    Update {
        #[arg(value_name = "KIND")]
        kind: ContentKind,
        #[arg(value_name = "UUID")]
        uuid: String,
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Delete an item
    Delete {
        #[arg(value_name = "KIND")]
        kind: ContentKind,
        #[arg(value_name = "UUID")]
        uuid: String,
    },
}

#[derive(clap::Subcommand)]
enum BackupCommands {
    /// Save the full backup as JSON
    Download {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Restore from a backup file
    Ingest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(clap::Subcommand)]
enum ThemeCommands {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme
    Set {
        #[arg(value_name = "THEME")]
        theme: Theme,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load().context("load config")?;
    let _log_guard = fmf_core::logging::init(&config.logging).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
        Commands::Api(command) => {
            let services =
                Services::new(config, cli.base_url.as_deref()).context("set up services")?;
            dispatch_api(command, &services).await
        }
    }
}

async fn dispatch_api(command: ApiCommands, services: &Services) -> Result<()> {
    match command {
        ApiCommands::Login { email, password } => {
            commands::auth::login(services, email, password).await
        }
        ApiCommands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            commands::auth::register(
                services,
                &Registration {
                    email,
                    password,
                    first_name,
                    last_name,
                },
            )
            .await
        }
        ApiCommands::Logout => commands::auth::logout(services).await,
        ApiCommands::Whoami => commands::auth::whoami(services).await,

        ApiCommands::Profile => commands::content::profile(services).await,
        ApiCommands::Projects { id } => commands::content::projects(services, id.as_deref()).await,
        ApiCommands::Skills => commands::content::skills(services).await,
        ApiCommands::Contact {
            name,
            email,
            message,
        } => {
            commands::content::contact(
                services,
                &ContactMessage {
                    name,
                    email,
                    message,
                },
            )
            .await
        }

        ApiCommands::Settings { command } => match command {
            SettingsCommands::List => commands::settings::list(services).await,
            SettingsCommands::Enabled { name } => commands::settings::enabled(services, &name).await,
            SettingsCommands::Set { name, value } => {
                commands::settings::set(services, &name, &value).await
            }
        },

        ApiCommands::Admin { command } => match command {
            AdminCommands::Account => commands::admin::account(services).await,
            AdminCommands::Stats => commands::admin::stats(services).await,
            AdminCommands::List { kind } => commands::admin::list(services, kind).await,
            AdminCommands::Create { kind, file } => {
                commands::admin::create(services, kind, &file).await
            }
            AdminCommands::Update { kind, uuid, file } => {
                commands::admin::update(services, kind, &uuid, &file).await
            }
            AdminCommands::Delete { kind, uuid } => {
                commands::admin::delete(services, kind, &uuid).await
            }
        },

        ApiCommands::Backup { command } => match command {
            BackupCommands::Download { out } => commands::backup::download(services, &out).await,
            BackupCommands::Ingest { file } => commands::backup::ingest(services, &file).await,
        },
        ApiCommands::Pdf { out } => commands::backup::pdf(services, &out).await,

        ApiCommands::Theme { command } => match command {
            ThemeCommands::Show => {
                commands::theme::show(services);
                Ok(())
            }
            ThemeCommands::Toggle => commands::theme::toggle(services),
            ThemeCommands::Set { theme } => commands::theme::set(services, theme),
        },

        ApiCommands::Route { path } => commands::route::decide(services, &path).await,
    }
}
