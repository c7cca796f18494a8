use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::models::IdentityStatus;
use comfy_table::{Cell, Table};

use crate::commands::utils::short_id;

/// Operator summary: identities per status, per group.
pub fn run(core: &AppCore) -> Result<()> {
    let groups = core.storage.groups.list()?;

    let mut table = Table::new();
    table.set_header(vec![
        "Group", "ID", "Pending", "Activated", "Joined", "Failed", "Total",
    ]);

    let mut totals = [0usize; 4];
    for group in groups {
        let identities = core.storage.identities.list_for_group(&group.id)?;
        let mut counts = [0usize; 4];
        for identity in &identities {
            let slot = match identity.status {
                IdentityStatus::Pending => 0,
                IdentityStatus::Activated => 1,
                IdentityStatus::Joined => 2,
                IdentityStatus::Failed => 3,
            };
            counts[slot] += 1;
            totals[slot] += 1;
        }
        table.add_row(vec![
            Cell::new(&group.nickname),
            Cell::new(short_id(&group.id)),
            Cell::new(counts[0]),
            Cell::new(counts[1]),
            Cell::new(counts[2]),
            Cell::new(counts[3]),
            Cell::new(identities.len()),
        ]);
    }

    table.add_row(vec![
        Cell::new("(all)"),
        Cell::new("-"),
        Cell::new(totals[0]),
        Cell::new(totals[1]),
        Cell::new(totals[2]),
        Cell::new(totals[3]),
        Cell::new(totals.iter().sum::<usize>()),
    ]);

    println!("{table}");
    Ok(())
}
