//! # Homepage
//!
//! Shared household groups ("home pages") addressed by human-readable name,
//! usable both as a standalone binary and as a library.
//!
//! A group's name is normalized into a canonical key, and each key is claimed
//! by at most one group. Creating, joining and renaming groups goes through
//! [`groups`], which does its check-then-write inside the store's atomic
//! transactions. Each device keeps a [`session::Session`] recording its
//! current group and nickname, and [`guard`] drops that group from the session
//! once it has been deleted.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! homepage = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use homepage::groups;
//! use homepage::session::Session;
//! use homepage::store::{DocumentStore, SqliteStore};
//!
//! let store = SqliteStore::new("./data/homepage.db").unwrap();
//! store.initialize().unwrap();
//!
//! let mut session = Session::in_memory();
//! let id = groups::create(&store, "Magnus Home").unwrap();
//! session.set_group_id(&id).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod groups;
pub mod guard;
pub mod names;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
