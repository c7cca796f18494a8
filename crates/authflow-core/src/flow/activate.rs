//! One-time activation flow.
//!
//! First use of the provider's assistant product requires walking an
//! onboarding sequence: agree to terms, name the created assistant, save,
//! and dismiss the completion dialog. Runs once per identity, advancing it
//! from pending to activated.

use crate::config::{Endpoints, FlowSettings};
use anyhow::Result;
use authflow_browser::PageSession;
use rand::RngExt;
use tracing::{debug, info};

/// Consent/onboarding dialogs, in the order they tend to appear.
const AGREE_VARIANTS: [&str; 5] = [
    "button:text('I agree')",
    "button:text('Agree')",
    "button:text('Accept all')",
    "button:text('Got it')",
    "button:text('Continue')",
];

const NAME_INPUT: &str = "input[type='text']";
const SAVE_BUTTON: &str = "button:text('Save')";

const COMPLETION_DISMISSALS: [&str; 2] = ["button:text('Start chat')", "button:text('Got it')"];

/// Host the activation page settles on when the account is provisioned.
const ACTIVATION_HOST: &str = "gemini.google.com";

/// Display names for the required name field. The value is irrelevant to the
/// provider; it only needs to be non-empty and human-looking.
const DISPLAY_NAMES: [&str; 12] = [
    "Alex", "Casey", "Jordan", "Morgan", "Riley", "Sam", "Taylor", "Jamie", "Avery", "Quinn",
    "Rowan", "Skyler",
];

pub fn pick_display_name() -> &'static str {
    let index = rand::rng().random_range(0..DISPLAY_NAMES.len());
    DISPLAY_NAMES[index]
}

/// Run the activation sequence for the signed-in identity.
pub async fn activate(
    session: &dyn PageSession,
    settings: &FlowSettings,
    endpoints: &Endpoints,
) -> Result<()> {
    session.navigate(&endpoints.activation_url).await?;
    tokio::time::sleep(settings.settle_delay()).await;

    // Onboarding dialogs stack; a pass that dismisses one can reveal the
    // next, so sweep until a pass clicks nothing (bounded at three).
    for _ in 0..3 {
        let mut dismissed_any = false;
        for selector in AGREE_VARIANTS {
            if session.click(selector).await? {
                debug!(selector, "dismissed onboarding dialog");
                dismissed_any = true;
                tokio::time::sleep(settings.settle_delay()).await;
            }
        }
        if !dismissed_any {
            break;
        }
    }

    let name = pick_display_name();
    if session.fill(NAME_INPUT, name).await? {
        debug!(name, "filled display name");
        if !session.click(SAVE_BUTTON).await? {
            session.press_key("Enter").await?;
        }
        tokio::time::sleep(settings.post_action_delay()).await;
    }

    for selector in COMPLETION_DISMISSALS {
        if session.click(selector).await? {
            debug!(selector, "dismissed completion dialog");
            tokio::time::sleep(settings.settle_delay()).await;
        }
    }

    let url = session.current_url().await?;
    if url.contains(ACTIVATION_HOST) {
        info!("activation complete");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Activation did not complete, landed on {}",
            url
        ))
    }
}
