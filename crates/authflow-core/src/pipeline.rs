//! Run orchestration.
//!
//! `run_identity_pipeline` is the per-identity onboarding sequence over an
//! already-launched session; the `run_for_*` entry points add the real
//! plumbing: per-identity lock, Chrome launch against the identity's
//! profile, run-registry bookkeeping, and session teardown.
//!
//! Failure policy: every failing step writes exactly one terminal identity
//! update and attempts a diagnostic screenshot whose own failure is
//! swallowed. Diagnostics never mask the primary failure.

use crate::AppCore;
use crate::config::Config;
use crate::flow::{activate, drive_callback_flow, invite, signin};
use crate::models::{Identity, IdentityStatus, RunKind};
use crate::paths;
use crate::services::OutcomeSink;
use anyhow::Result;
use authflow_browser::{CdpSession, LaunchOptions, PageSession};
use authflow_storage::time_utils;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Drive one identity through sign-in, activation, and invite acceptance.
/// Returns the identity's final status; flow failures are persisted through
/// the sink rather than propagated.
pub async fn run_identity_pipeline(
    session: &dyn PageSession,
    sink: &dyn OutcomeSink,
    config: &Config,
    identity_id: &str,
    screenshot_dir: Option<&Path>,
) -> Result<IdentityStatus> {
    let identity = sink
        .load(identity_id)?
        .ok_or_else(|| anyhow::anyhow!("Identity {} not found", identity_id))?;

    if identity.status == IdentityStatus::Joined {
        info!(email = %identity.email, "identity already joined, nothing to do");
        return Ok(IdentityStatus::Joined);
    }

    if let Err(err) = signin::sign_in(
        session,
        &identity.email,
        &identity.password,
        identity.totp_secret.as_deref(),
        &config.flow,
        &config.endpoints,
    )
    .await
    {
        return fail_step(session, sink, &identity, screenshot_dir, "sign-in", err).await;
    }

    if identity.status == IdentityStatus::Pending {
        if let Err(err) = activate::activate(session, &config.flow, &config.endpoints).await {
            return fail_step(session, sink, &identity, screenshot_dir, "activation", err).await;
        }
        sink.mark_activated(&identity.id)?;
    }

    if let Err(err) = invite::accept_invite(session, &config.flow, &config.endpoints).await {
        return fail_step(session, sink, &identity, screenshot_dir, "invite", err).await;
    }
    sink.mark_joined(&identity.id)?;

    info!(email = %identity.email, "identity fully onboarded");
    Ok(IdentityStatus::Joined)
}

/// Drive the OAuth callback-capture flow and stash the captured URL in the
/// identity's annotation slot.
pub async fn run_callback_capture(
    session: &dyn PageSession,
    sink: &dyn OutcomeSink,
    config: &Config,
    identity_id: &str,
    oauth_url: &str,
    screenshot_dir: Option<&Path>,
) -> Result<String> {
    let identity = sink
        .load(identity_id)?
        .ok_or_else(|| anyhow::anyhow!("Identity {} not found", identity_id))?;

    match drive_callback_flow(
        session,
        &identity.email,
        identity.totp_secret.as_deref(),
        oauth_url,
        &config.flow,
    )
    .await
    {
        Ok(url) => {
            sink.store_note(&identity.id, &url)?;
            info!(email = %identity.email, "stored captured callback URL");
            Ok(url)
        }
        Err(err) => {
            sink.mark_failed(&identity.id, &err.to_string())?;
            capture_diagnostic(session, screenshot_dir, &identity.id).await;
            Err(err.into())
        }
    }
}

async fn fail_step(
    session: &dyn PageSession,
    sink: &dyn OutcomeSink,
    identity: &Identity,
    screenshot_dir: Option<&Path>,
    step: &str,
    err: anyhow::Error,
) -> Result<IdentityStatus> {
    let reason = format!("{} failed: {}", step, err);
    warn!(email = %identity.email, %reason, "run failed");
    sink.mark_failed(&identity.id, &reason)?;
    capture_diagnostic(session, screenshot_dir, &identity.id).await;
    Ok(IdentityStatus::Failed)
}

async fn capture_diagnostic(
    session: &dyn PageSession,
    screenshot_dir: Option<&Path>,
    identity_id: &str,
) {
    let Some(dir) = screenshot_dir else {
        return;
    };
    let path = dir.join(format!("{}-{}.png", identity_id, time_utils::now_ms()));
    match session.screenshot(&path).await {
        Ok(()) => info!(path = %path.display(), "saved diagnostic screenshot"),
        Err(err) => warn!(error = %err, "diagnostic screenshot failed"),
    }
}

/// Run the onboarding pipeline for one identity, with lock, browser, and
/// registry bookkeeping.
pub async fn run_for_identity(core: &AppCore, identity_id: &str) -> Result<IdentityStatus> {
    let identity = core
        .storage
        .identities
        .get(identity_id)?
        .ok_or_else(|| anyhow::anyhow!("Identity {} not found", identity_id))?;

    let run_id = core
        .registry
        .register(RunKind::Identity, vec![identity.email.clone()]);

    let result = run_one_locked(core, &identity).await;
    match &result {
        Ok(_) => {
            core.registry.update_progress(&run_id, 1);
            core.registry.finish(&run_id);
        }
        Err(err) => core.registry.fail(&run_id, err.to_string()),
    }
    result
}

/// Whether a batch run may pick an identity up. Failed identities stay
/// failed until an operator resets them; there is no automatic retry.
fn batch_eligible(status: IdentityStatus) -> bool {
    matches!(status, IdentityStatus::Pending | IdentityStatus::Activated)
}

/// Run the pipeline for every eligible identity in a group, one at a time.
pub async fn run_for_group(core: &AppCore, group_id: &str) -> Result<()> {
    let identities: Vec<Identity> = core
        .storage
        .identities
        .list_for_group(group_id)?
        .into_iter()
        .filter(|i| batch_eligible(i.status))
        .collect();
    run_batch(core, RunKind::Group, identities).await
}

/// Run the pipeline for every pending or activated identity, across all
/// groups.
pub async fn run_all_pending(core: &AppCore) -> Result<()> {
    let identities: Vec<Identity> = core
        .storage
        .identities
        .list()?
        .into_iter()
        .filter(|i| batch_eligible(i.status))
        .collect();
    run_batch(core, RunKind::AllPending, identities).await
}

async fn run_batch(core: &AppCore, kind: RunKind, identities: Vec<Identity>) -> Result<()> {
    let emails: Vec<String> = identities.iter().map(|i| i.email.clone()).collect();
    let run_id = core.registry.register(kind, emails);

    let mut processed = 0u32;
    for identity in &identities {
        if let Err(err) = run_one_locked(core, identity).await {
            // Hard faults (lock contention, browser launch) are recorded on
            // the identity; the batch keeps going.
            warn!(email = %identity.email, error = %err, "run aborted for identity");
            let _ = core.outcome_sink().mark_failed(&identity.id, &err.to_string());
        }
        processed += 1;
        core.registry.update_progress(&run_id, processed);
    }

    core.registry.finish(&run_id);
    Ok(())
}

/// Capture an OAuth callback for one identity using an externally supplied
/// authorization URL.
pub async fn capture_for_identity(
    core: &AppCore,
    identity_id: &str,
    oauth_url: &str,
) -> Result<String> {
    let identity = core
        .storage
        .identities
        .get(identity_id)?
        .ok_or_else(|| anyhow::anyhow!("Identity {} not found", identity_id))?;

    let run_id = core
        .registry
        .register(RunKind::Capture, vec![identity.email.clone()]);

    let result = async {
        let _guard = core.locks.acquire(&identity.id)?;
        let session = launch_session(&core.config, &identity.id).await?;
        let sink = core.outcome_sink();
        let screenshots = paths::screenshots_dir()?;
        let outcome = run_callback_capture(
            &session,
            &sink,
            &core.config,
            &identity.id,
            oauth_url,
            Some(&screenshots),
        )
        .await;
        close_session(session).await;
        outcome
    }
    .await;

    match &result {
        Ok(_) => {
            core.registry.update_progress(&run_id, 1);
            core.registry.finish(&run_id);
        }
        Err(err) => core.registry.fail(&run_id, err.to_string()),
    }
    result
}

async fn run_one_locked(core: &AppCore, identity: &Identity) -> Result<IdentityStatus> {
    let _guard = core.locks.acquire(&identity.id)?;
    let session = launch_session(&core.config, &identity.id).await?;
    let sink = core.outcome_sink();
    let screenshots = paths::screenshots_dir()?;
    let status = run_identity_pipeline(
        &session,
        &sink,
        &core.config,
        &identity.id,
        Some(&screenshots),
    )
    .await;
    close_session(session).await;
    status
}

async fn launch_session(config: &Config, identity_id: &str) -> Result<CdpSession> {
    let opts = LaunchOptions {
        profile_dir: paths::profile_dir_for(identity_id)?,
        headless: config.browser.headless,
        chrome_executable: config.browser.chrome_executable.clone(),
        action_delay: Duration::from_millis(config.browser.slow_down_ms),
        navigation_timeout: Duration::from_secs(config.browser.navigation_timeout_secs),
    };
    CdpSession::launch(opts).await
}

async fn close_session(session: CdpSession) {
    if let Err(err) = session.close().await {
        warn!(error = %err, "browser session did not close cleanly");
    }
}
