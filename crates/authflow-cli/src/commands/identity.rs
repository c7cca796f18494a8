use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::services::OutcomeSink;
use comfy_table::{Cell, Table};

use crate::cli::IdentityCommands;
use crate::commands::utils::{format_timestamp, short_id, styled_status};

pub fn run(core: &AppCore, command: IdentityCommands) -> Result<()> {
    match command {
        IdentityCommands::Add {
            email,
            group,
            password,
            totp,
        } => add_identity(core, &group, email, password, totp),
        IdentityCommands::List { group } => list_identities(core, group.as_deref()),
        IdentityCommands::Delete { id } => delete_identity(core, &id),
        IdentityCommands::Reset { id } => reset_identity(core, &id),
    }
}

fn add_identity(
    core: &AppCore,
    group_id: &str,
    email: String,
    password: String,
    totp: Option<String>,
) -> Result<()> {
    let identity = core.storage.create_identity(group_id, email, password, totp)?;
    println!("Identity created: {} ({})", identity.email, identity.id);
    Ok(())
}

fn list_identities(core: &AppCore, group_id: Option<&str>) -> Result<()> {
    let identities = match group_id {
        Some(group_id) => core.storage.identities.list_for_group(group_id)?,
        None => core.storage.identities.list()?,
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Email", "Status", "Error", "Updated"]);

    for identity in identities {
        table.add_row(vec![
            Cell::new(short_id(&identity.id)),
            Cell::new(&identity.email),
            Cell::new(styled_status(identity.status)),
            Cell::new(identity.error.as_deref().unwrap_or("-")),
            Cell::new(format_timestamp(identity.updated_at)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn delete_identity(core: &AppCore, id: &str) -> Result<()> {
    if !core.storage.identities.delete(id)? {
        return Err(anyhow::anyhow!("Identity {} not found", id));
    }
    println!("Identity deleted: {}", id);
    Ok(())
}

fn reset_identity(core: &AppCore, id: &str) -> Result<()> {
    core.outcome_sink().reset_to_pending(id)?;
    println!("Identity reset to pending: {}", id);
    Ok(())
}
