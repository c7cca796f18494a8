use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::models::RunStatus;
use comfy_table::{Cell, Table};

use crate::cli::TaskCommands;
use crate::commands::utils::{format_timestamp, short_id};

pub fn run(core: &AppCore, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::List => list_runs(core),
    }
}

fn list_runs(core: &AppCore) -> Result<()> {
    let runs = core.registry.list();
    if runs.is_empty() {
        println!("No runs launched by this process.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Kind", "Progress", "Status", "Started", "Error"]);

    for run in runs {
        let status = match run.status {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        table.add_row(vec![
            Cell::new(short_id(&run.id)),
            Cell::new(run.kind.as_str()),
            Cell::new(format!("{}/{}", run.progress, run.total)),
            Cell::new(status),
            Cell::new(format_timestamp(run.started_at)),
            Cell::new(run.error.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
    Ok(())
}
