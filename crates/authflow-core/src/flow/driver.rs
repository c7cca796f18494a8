//! The callback-capture flow driver.
//!
//! A polling loop over classify/dispatch with a fixed iteration budget.
//! Budget exhaustion is the sole timeout mechanism; the external pages
//! navigate on their own schedule and signal nothing, so per-action
//! timeouts would only add noise.

use crate::config::FlowSettings;
use crate::flow::capture::{self, CaptureSlot};
use crate::flow::classify::{PageState, classify};
use crate::flow::dispatch::{DispatchOutcome, dispatch};
use authflow_browser::PageSession;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FlowError {
    /// A required control or account entry never matched.
    #[error("{0}")]
    NoMatch(String),
    #[error("OAuth flow did not complete")]
    Timeout,
    /// Three consecutive no-op dispatches at the same state.
    #[error("Flow stalled at state {state}")]
    Stalled { state: &'static str },
    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

/// Drive the OAuth page sequence until a callback URL is captured or the
/// iteration budget runs out. Returns the captured URL verbatim.
pub async fn drive_callback_flow(
    session: &dyn PageSession,
    email: &str,
    totp_seed: Option<&str>,
    oauth_url: &str,
    settings: &FlowSettings,
) -> Result<String, FlowError> {
    let slot = CaptureSlot::new();
    let urls = session.request_urls().await?;
    let listener = capture::spawn_listener(slot.clone(), urls, settings.callback_prefixes.clone());

    let result = run_loop(session, email, totp_seed, oauth_url, settings, &slot).await;

    // The listener must not outlive the run; a reused session would keep
    // feeding it events.
    listener.abort();
    result
}

async fn run_loop(
    session: &dyn PageSession,
    email: &str,
    totp_seed: Option<&str>,
    oauth_url: &str,
    settings: &FlowSettings,
    slot: &CaptureSlot,
) -> Result<String, FlowError> {
    session.navigate(oauth_url).await?;

    let mut noop_streak = 0u32;
    let mut noop_state: Option<&'static str> = None;

    for attempt in 1..=settings.max_attempts {
        // Give the capture listener a chance to drain pending events before
        // the slot check; a captured callback always wins over DOM state.
        tokio::task::yield_now().await;
        if let Some(url) = slot.get() {
            info!(%url, "callback captured");
            return Ok(url);
        }

        let state = classify(session, slot, totp_seed.is_some(), settings).await?;
        debug!(attempt, state = state.name(), "classified page");

        match &state {
            PageState::CallbackCaptured(url) | PageState::CallbackReached(url) => {
                info!(url = %url, "callback reached");
                return Ok(url.clone());
            }
            PageState::ErrorPage | PageState::IntermediateRedirect | PageState::Unrecognized => {
                tokio::time::sleep(settings.poll_delay()).await;
                continue;
            }
            _ => {}
        }

        match dispatch(session, &state, email, totp_seed).await? {
            DispatchOutcome::Acted => {
                noop_streak = 0;
                noop_state = None;
                tokio::time::sleep(settings.settle_delay()).await;
            }
            DispatchOutcome::Waited => {
                tokio::time::sleep(settings.poll_delay()).await;
            }
            DispatchOutcome::NoOp => {
                if noop_state == Some(state.name()) {
                    noop_streak += 1;
                } else {
                    noop_state = Some(state.name());
                    noop_streak = 1;
                }
                if noop_streak >= 3 {
                    return Err(FlowError::Stalled { state: state.name() });
                }
                tokio::time::sleep(settings.poll_delay()).await;
            }
            DispatchOutcome::Fatal(reason) => {
                return Err(FlowError::NoMatch(reason));
            }
        }
    }

    Err(FlowError::Timeout)
}
