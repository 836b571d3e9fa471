mod server;

pub use server::{ServerConfig, db_path};
