//! Direct provider sign-in.
//!
//! The precursor flow: establish an authenticated browser session before the
//! activation, invite, or callback-capture flows run. Same classify-and-act
//! pattern as the driver, at smaller scale and with a fixed step order.

use crate::config::{Endpoints, FlowSettings};
use crate::flow::classify::TOTP_INPUT;
use crate::flow::totp;
use anyhow::Result;
use authflow_browser::PageSession;
use std::time::Instant;
use tracing::{debug, info};

const EMAIL_INPUT: &str = "input[type='email']";
const EMAIL_NEXT: &str = "#identifierNext";
const PASSWORD_INPUT: &str = "input[type='password']";
const PASSWORD_NEXT: &str = "#passwordNext";
const TOTP_NEXT: &str = "#totpNext";

/// Post-login upsell dialogs, dismissed in order when present.
const UPSELL_DISMISSALS: [&str; 3] = [
    "button:text('Not now')",
    "button:text('No thanks')",
    "button:text('Skip')",
];

/// Authenticated-area host used to confirm a completed sign-in.
const ACCOUNT_HOME_HOST: &str = "myaccount.google.com";

fn is_on_signin_path(url: &str) -> bool {
    url.contains("/signin") || url.contains("/v3/signin") || url.contains("ServiceLogin")
}

/// Whether the session already carries a valid login.
///
/// This is a heuristic: the provider redirects authenticated visitors away
/// from the sign-in path, so "not on the sign-in path" is read as "signed
/// in". A provider page change can make this answer wrongly in either
/// direction; callers decide whether to trust it or force re-authentication.
pub async fn has_active_session(session: &dyn PageSession) -> Result<bool> {
    let url = session.current_url().await?;
    Ok(!is_on_signin_path(&url))
}

/// Sign the identity in, reusing an existing session when one is detected.
pub async fn sign_in(
    session: &dyn PageSession,
    email: &str,
    password: &str,
    totp_seed: Option<&str>,
    settings: &FlowSettings,
    endpoints: &Endpoints,
) -> Result<()> {
    session.navigate(&endpoints.signin_url).await?;
    tokio::time::sleep(settings.settle_delay()).await;

    if has_active_session(session).await? {
        info!(email, "session already authenticated, skipping sign-in");
        return Ok(());
    }

    if session.fill(EMAIL_INPUT, email).await? {
        debug!(email, "entered login address");
        if !session.click(EMAIL_NEXT).await? {
            session.press_key("Enter").await?;
        }
        tokio::time::sleep(settings.post_action_delay()).await;
    }

    if session.fill(PASSWORD_INPUT, password).await? {
        debug!("entered login secret");
        if !session.click(PASSWORD_NEXT).await? {
            session.press_key("Enter").await?;
        }
        tokio::time::sleep(settings.post_action_delay()).await;
    }

    if let Some(seed) = totp_seed
        && session.is_visible(TOTP_INPUT).await?
    {
        let code = totp::current_code(seed)?;
        session.fill(TOTP_INPUT, &code).await?;
        if !session.click(TOTP_NEXT).await? {
            session.press_key("Enter").await?;
        }
        debug!("answered second-factor prompt");
        tokio::time::sleep(settings.post_action_delay()).await;
    }

    dismiss_upsells(session, settings).await?;

    verify_signed_in(session, email, settings).await
}

/// Passkey enrollment and sync opt-in dialogs appear unpredictably after
/// login; each is optional and safely declinable.
async fn dismiss_upsells(session: &dyn PageSession, settings: &FlowSettings) -> Result<()> {
    for selector in UPSELL_DISMISSALS {
        if session.click(selector).await? {
            debug!(selector, "dismissed upsell dialog");
            tokio::time::sleep(settings.settle_delay()).await;
        }
    }
    Ok(())
}

async fn verify_signed_in(
    session: &dyn PageSession,
    email: &str,
    settings: &FlowSettings,
) -> Result<()> {
    let deadline = Instant::now() + settings.login_timeout();
    loop {
        let url = session.current_url().await?;
        if url.contains(ACCOUNT_HOME_HOST) || !is_on_signin_path(&url) {
            info!(email, "sign-in complete");
            return Ok(());
        }
        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(settings.poll_delay()).await;
    }
    Err(anyhow::anyhow!("Sign-in did not complete for {}", email))
}
