use std::fs;

use serde::Serialize;

use crate::config::db_path;
use crate::groups;
use crate::store::{DocumentStore, SqliteStore};
use crate::types::Group;

use super::init_store;
use super::prompts::confirm_action;

pub fn run_admin_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = db_path(&data_path);
    let existed = db_path.exists();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!();
    if existed {
        println!("Database already initialized at {}", db_path.display());
    } else {
        println!("Initialized database at {}", db_path.display());
    }
    println!();

    Ok(())
}

#[derive(Serialize)]
struct ClaimOutput {
    key: String,
    group_id: String,
}

#[derive(Serialize)]
struct InfoOutput {
    groups: Vec<Group>,
    claims: Vec<ClaimOutput>,
}

pub fn run_admin_info(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let info = InfoOutput {
        groups: groups::list(&store)?,
        claims: groups::claims(&store)?
            .into_iter()
            .map(|claim| ClaimOutput {
                key: claim.key,
                group_id: claim.group_id,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Homepage Status");
    println!("{}", "─".repeat(15));
    println!("Groups:  {}", info.groups.len());
    for group in &info.groups {
        println!("  {}  {} ({})", group.id, group.name, group.key);
    }
    println!("Claims:  {}", info.claims.len());
    for claim in &info.claims {
        println!("  {} -> {}", claim.key, claim.group_id);
    }
    println!();

    Ok(())
}

pub fn run_admin_remove_group(
    data_dir: String,
    group_id: String,
    non_interactive: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let label = match groups::get(&store, &group_id)? {
        Some(group) => format!("'{}'", group.name),
        None => group_id.clone(),
    };

    let confirmed = confirm_action(&format!("Delete group {}?", label), yes, non_interactive)?;
    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    if !groups::remove(&store, &group_id)? {
        anyhow::bail!("Group not found: {}", group_id);
    }

    println!();
    println!("Deleted group {}", label);
    println!();

    Ok(())
}
