use serde::Serialize;

use crate::groups;
use crate::guard::check_session;
use crate::names::validate_nickname;
use crate::types::Group;

use super::prompts::{confirm_action, name_or_prompt};
use super::{NOT_IN_GROUP, SessionArgs, describe, init_store, open_session};

pub fn run_create(
    args: SessionArgs,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;
    let mut session = open_session(&args)?;

    let name = name_or_prompt(name, "Group name:", non_interactive)?;
    let id = groups::create(&store, &name).map_err(|e| describe(e, &name))?;
    session.set_group_id(&id)?;

    let group = groups::get(&store, &id)?;
    println!();
    match group {
        Some(group) => println!("Created group \"{}\" ({})", group.name, group.key),
        None => println!("Created group {}", id),
    }
    println!("Group ID: {}", id);
    println!();

    Ok(())
}

pub fn run_join(
    args: SessionArgs,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;
    let mut session = open_session(&args)?;

    let name = name_or_prompt(name, "Group name:", non_interactive)?;
    let id = groups::join(&store, &name).map_err(|e| describe(e, &name))?;
    session.set_group_id(&id)?;

    // the claim can outlive a group removed behind our back
    let Some(group) = check_session(&store, &mut session)? else {
        anyhow::bail!("Group '{}' no longer exists.", name.trim());
    };

    println!();
    println!("Joined group \"{}\" ({})", group.name, group.key);
    println!();

    Ok(())
}

pub fn run_rename(
    args: SessionArgs,
    name: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;
    let mut session = open_session(&args)?;

    let Some(current) = check_session(&store, &mut session)? else {
        anyhow::bail!(NOT_IN_GROUP);
    };

    let name = name_or_prompt(name, "New group name:", non_interactive)?;
    let group = groups::rename(&store, &current.id, &name).map_err(|e| describe(e, &name))?;

    println!();
    println!(
        "Renamed group \"{}\" to \"{}\" ({})",
        current.name, group.name, group.key
    );
    println!();

    Ok(())
}

pub fn run_switch(args: SessionArgs, non_interactive: bool, yes: bool) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;
    let mut session = open_session(&args)?;

    let Some(current) = check_session(&store, &mut session)? else {
        println!("Not in a group.");
        return Ok(());
    };

    let confirmed = confirm_action(
        &format!("Leave group '{}'?", current.name),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    session.clear_group_id()?;

    println!();
    println!("Left group \"{}\"", current.name);
    println!("Run 'homepage create' or 'homepage join' to pick another group.");
    println!();

    Ok(())
}

pub fn run_nickname(args: SessionArgs, name: Option<String>, clear: bool) -> anyhow::Result<()> {
    let mut session = open_session(&args)?;

    if clear {
        session.clear_nickname()?;
        println!("Nickname cleared.");
        return Ok(());
    }

    match name {
        Some(name) => {
            let nickname = validate_nickname(&name).map_err(anyhow::Error::msg)?;
            session.set_nickname(&nickname)?;
            println!("Nickname set to \"{}\"", nickname);
        }
        None => match session.nickname() {
            Some(nickname) => println!("{}", nickname),
            None => println!("No nickname set."),
        },
    }

    Ok(())
}

#[derive(Serialize)]
struct StatusOutput {
    group: Option<Group>,
    nickname: Option<String>,
}

pub fn run_status(args: SessionArgs, json: bool) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;
    let mut session = open_session(&args)?;

    let status = StatusOutput {
        group: check_session(&store, &mut session)?,
        nickname: session.nickname().map(str::to_string),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    match &status.group {
        Some(group) => {
            println!("Group:     {} ({})", group.name, group.key);
            println!("Group ID:  {}", group.id);
        }
        None => println!("Group:     {}", NOT_IN_GROUP),
    }
    println!(
        "Nickname:  {}",
        status.nickname.as_deref().unwrap_or("<none>")
    );
    println!();

    Ok(())
}
