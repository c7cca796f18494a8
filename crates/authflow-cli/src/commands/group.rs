use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::models::Group;
use comfy_table::{Cell, Table};

use crate::cli::GroupCommands;
use crate::commands::utils::{format_timestamp, short_id};

pub fn run(core: &AppCore, command: GroupCommands) -> Result<()> {
    match command {
        GroupCommands::Add {
            email,
            nickname,
            max_identities,
        } => add_group(core, email, nickname, max_identities),
        GroupCommands::List => list_groups(core),
        GroupCommands::Delete { id } => delete_group(core, &id),
    }
}

fn add_group(core: &AppCore, email: String, nickname: String, max_identities: u32) -> Result<()> {
    if core.storage.groups.find_by_email(&email)?.is_some() {
        return Err(anyhow::anyhow!("A group with email {} already exists", email));
    }

    let group = Group::new(email, nickname, max_identities);
    core.storage.groups.save(&group)?;
    println!("Group created: {} ({})", group.nickname, group.id);
    Ok(())
}

fn list_groups(core: &AppCore) -> Result<()> {
    let groups = core.storage.groups.list()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Nickname", "Email", "Members", "Created"]);

    for group in groups {
        let members = core.storage.identities.list_for_group(&group.id)?.len();
        table.add_row(vec![
            Cell::new(short_id(&group.id)),
            Cell::new(&group.nickname),
            Cell::new(&group.email),
            Cell::new(format!("{}/{}", members, group.max_identities)),
            Cell::new(format_timestamp(group.created_at)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn delete_group(core: &AppCore, id: &str) -> Result<()> {
    let (group, removed) = core.storage.delete_group_cascade(id)?;
    println!(
        "Group deleted: {} ({} identities removed)",
        group.nickname, removed
    );
    Ok(())
}
