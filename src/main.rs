use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use homepage::cli::{
    AdminCommands, SessionArgs, run_admin_info, run_admin_init, run_admin_remove_group,
    run_create, run_join, run_nickname, run_rename, run_status, run_switch, run_watch,
};
use homepage::config::ServerConfig;
use homepage::server::{AppState, create_router};
use homepage::store::{DocumentStore, SqliteStore};

#[derive(Parser)]
#[command(name = "homepage")]
#[command(about = "Shared household groups with unique names", long_about = None)]
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

    /// Create a new group and make it this device's group
    Create {
        #[command(flatten)]
        session: SessionArgs,

        /// Name for the new group
        name: Option<String>,

        /// Skip interactive prompts (requires a name)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Join an existing group by name
    Join {
        #[command(flatten)]
        session: SessionArgs,

        /// Name of the group to join
        name: Option<String>,

        /// Skip interactive prompts (requires a name)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Rename the current group
    Rename {
        #[command(flatten)]
        session: SessionArgs,

        /// New name for the group
        name: Option<String>,

        /// Skip interactive prompts (requires a name)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Leave the current group on this device
    Switch {
        #[command(flatten)]
        session: SessionArgs,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show or set this device's nickname
    Nickname {
        #[command(flatten)]
        session: SessionArgs,

        /// New nickname; omit to print the current one
        name: Option<String>,

        /// Remove the nickname
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Show the current group and nickname
    Status {
        #[command(flatten)]
        session: SessionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow the current group until it is removed
    Watch {
        #[command(flatten)]
        session: SessionArgs,

        /// How often to check for changes made by other processes
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory holding the database
        #[arg(long, default_value = "./data", env = "HOMEPAGE_DATA_DIR")]
        data_dir: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("homepage=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_admin_init(data_dir)?,
            AdminCommands::Info { data_dir, json } => run_admin_info(data_dir, json)?,
            AdminCommands::RemoveGroup {
                data_dir,
                group_id,
                non_interactive,
                yes,
            } => run_admin_remove_group(data_dir, group_id, non_interactive, yes)?,
        },
        Commands::Create {
            session,
            name,
            non_interactive,
        } => run_create(session, name, non_interactive)?,
        Commands::Join {
            session,
            name,
            non_interactive,
        } => run_join(session, name, non_interactive)?,
        Commands::Rename {
            session,
            name,
            non_interactive,
        } => run_rename(session, name, non_interactive)?,
        Commands::Switch {
            session,
            non_interactive,
            yes,
        } => run_switch(session, non_interactive, yes)?,
        Commands::Nickname {
            session,
            name,
            clear,
        } => run_nickname(session, name, clear)?,
        Commands::Status { session, json } => run_status(session, json)?,
        Commands::Watch {
            session,
            interval_ms,
        } => run_watch(session, interval_ms).await?,
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let db_path = config.db_path();
            if !db_path.exists() {
                bail!("Database not found. Run 'homepage admin init' first.");
            }

            let store = Arc::new(SqliteStore::new(&db_path)?);
            store.initialize()?;

            // the CLI writes to the same file; forward its changes to event streams
            let poller = Arc::clone(&store);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(1));
                loop {
                    ticker.tick().await;
                    if let Err(e) = poller.refresh_watches() {
                        warn!("Failed to refresh watched documents: {}", e);
                    }
                }
            });

            let state = Arc::new(AppState { store });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
