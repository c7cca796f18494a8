use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::pipeline;
use colored::Colorize;

use crate::cli::{CaptureArgs, RunArgs};
use crate::commands::utils::styled_status;

pub async fn run(core: &AppCore, args: RunArgs) -> Result<()> {
    if let Some(identity_id) = &args.identity_id {
        let status = pipeline::run_for_identity(core, identity_id).await?;
        println!("Run finished: {}", styled_status(status));
        return Ok(());
    }

    if let Some(group_id) = &args.group_id {
        pipeline::run_for_group(core, group_id).await?;
        print_batch_summary(core, Some(group_id))?;
        return Ok(());
    }

    if args.all {
        pipeline::run_all_pending(core).await?;
        print_batch_summary(core, None)?;
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "Nothing to run: pass --identity-id, --group-id, or --all"
    ))
}

pub async fn capture(core: &AppCore, args: CaptureArgs) -> Result<()> {
    let url = pipeline::capture_for_identity(core, &args.identity_id, &args.url).await?;
    println!("{} {}", "Captured:".green().bold(), url);
    Ok(())
}

fn print_batch_summary(core: &AppCore, group_id: Option<&str>) -> Result<()> {
    let identities = match group_id {
        Some(group_id) => core.storage.identities.list_for_group(group_id)?,
        None => core.storage.identities.list()?,
    };
    for identity in identities {
        println!("  {} {}", identity.email, styled_status(identity.status));
    }
    Ok(())
}
