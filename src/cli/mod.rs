mod admin;
mod commands;
mod group;
mod prompts;
mod watch;

pub use admin::{run_admin_info, run_admin_init, run_admin_remove_group};
pub use commands::{AdminCommands, SessionArgs};
pub use group::{run_create, run_join, run_nickname, run_rename, run_status, run_switch};
pub use watch::run_watch;

use crate::config::db_path;
use crate::error::Error;
use crate::session::{FileKeyValueStore, Session};
use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let db_path = db_path(std::path::Path::new(data_dir));

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'homepage admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

/// Load this device's session from `--session-file` or the default location.
pub fn open_session(args: &SessionArgs) -> anyhow::Result<Session> {
    let path = match &args.session_file {
        Some(path) => path.clone(),
        None => FileKeyValueStore::default_path()?,
    };
    let kv = FileKeyValueStore::open(&path)?;
    Ok(Session::load(Box::new(kv))?)
}

/// Turns a protocol failure into a message the user can act on.
fn describe(err: Error, name: &str) -> anyhow::Error {
    match err.into_protocol() {
        Error::InvalidName => anyhow::anyhow!(
            "'{}' is not a usable name. Use at least one letter or digit.",
            name.trim()
        ),
        Error::NameTaken => anyhow::anyhow!(
            "The name '{}' is already taken. Choose a different name.",
            name.trim()
        ),
        Error::NotFound => anyhow::anyhow!("No group named '{}' exists.", name.trim()),
        other => anyhow::anyhow!("{}. Try again.", other),
    }
}

const NOT_IN_GROUP: &str =
    "Not in a group. Run 'homepage create' or 'homepage join' first.";
