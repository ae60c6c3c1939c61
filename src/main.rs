use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reportdesk::auth::Argon2Credentials;
use reportdesk::config::ServerConfig;
use reportdesk::server::{AppState, create_router};
use reportdesk::store::{SqliteStore, Store};
use reportdesk::workflow::users::{self, BOOTSTRAP_ADMIN};

const GENERATED_PASSWORD_LEN: usize = 20;

#[derive(Parser)]
#[command(name = "reportdesk")]
#[command(about = "A report desk server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and uploads
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the data directory and create the admin account
    Init {
        /// Data directory for the database and uploads
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Password for the admin account
        #[arg(long)]
        admin_password: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn prompt_password() -> anyhow::Result<String> {
    let password = inquire::Password::new("Admin password:")
        .with_validator(|input: &str| {
            if input.is_empty() {
                Err("Password cannot be empty".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(password)
}

fn run_init(
    data_dir: PathBuf,
    admin_password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    if users::find_by_username(&store, BOOTSTRAP_ADMIN)?.is_some() {
        bail!(
            "Server already initialized. Admin account exists in {}",
            config.db_path().display()
        );
    }

    let (password, generated) = match admin_password {
        Some(password) => (password, false),
        None if non_interactive => (generate_password(), true),
        None => (prompt_password()?, false),
    };

    let credentials = Argon2Credentials::new();
    users::bootstrap_admin(&store, &credentials, &password)?;
    info!("Initialized {}", config.db_path().display());

    println!();
    println!("========================================");
    println!("Created admin account '{BOOTSTRAP_ADMIN}'.");
    if generated {
        println!("Generated password (save this, it won't be shown again):");
        println!();
        println!("  {password}");
    }
    println!("========================================");
    println!();

    Ok(())
}

fn load_config(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reportdesk=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                admin_password,
                non_interactive,
            } => {
                run_init(data_dir, admin_password, non_interactive)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let config = load_config(config.as_deref(), host, port, data_dir)?;

            if !config.db_path().exists() {
                bail!("Server not initialized. Run 'reportdesk admin init' first.");
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            if users::find_by_username(&store, BOOTSTRAP_ADMIN)?.is_none() {
                bail!("Server not initialized. Run 'reportdesk admin init' first.");
            }

            let state = Arc::new(AppState::new(Arc::new(store), &config)?);
            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
