use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Where the database and this device's session live.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Data directory holding the database
    #[arg(long, default_value = "./data", env = "HOMEPAGE_DATA_DIR")]
    pub data_dir: String,

    /// Session file (defaults to session.toml in the user config directory)
    #[arg(long, env = "HOMEPAGE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory and database
    Init {
        /// Data directory holding the database
        #[arg(long, default_value = "./data", env = "HOMEPAGE_DATA_DIR")]
        data_dir: String,
    },

    /// Show groups and name claims
    Info {
        /// Data directory holding the database
        #[arg(long, default_value = "./data", env = "HOMEPAGE_DATA_DIR")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a group and every name claim pointing at it
    RemoveGroup {
        /// Data directory holding the database
        #[arg(long, default_value = "./data", env = "HOMEPAGE_DATA_DIR")]
        data_dir: String,

        /// Group ID to remove
        #[arg(long)]
        group_id: String,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}
