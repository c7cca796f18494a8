//! Page state classification.
//!
//! One observation of the live page (captured-callback slot, current URL,
//! DOM markers) maps to exactly one state. Evaluation order matters: several
//! provider pages share markers, and the narrowing predicates must run
//! first. In particular the consent page shows a single account identifier,
//! so "account chooser" additionally requires that no confirmation control
//! is visible.

use crate::config::FlowSettings;
use crate::flow::capture::CaptureSlot;
use anyhow::Result;
use authflow_browser::PageSession;

/// Confirmation controls whose presence rules out the account chooser.
pub(crate) const CONFIRM_CONTROLS: [&str; 3] = [
    "button:text('Sign in')",
    "button:text('Cancel')",
    "button:text('Allow')",
];

/// A selectable account entry on the chooser page.
pub(crate) const ACCOUNT_ENTRY: &str = "[data-identifier]";

/// Numeric one-time-code input.
pub(crate) const TOTP_INPUT: &str = "input[type='tel']";

/// "Continue" controls, exact English button labels first, then link and
/// localized variants, then the bare submit input.
pub(crate) const SIGN_IN_VARIANTS: [&str; 8] = [
    "button:text('Sign in')",
    "button:text('Continue')",
    "button:text('Next')",
    "button:text('Confirm')",
    "a:text('Sign in')",
    "button:text('继续')",
    "button:text('登录')",
    "input[type='submit']",
];

/// Consent-page authorize control.
pub(crate) const CONSENT_APPROVE: &str = "#submit_approve_access";

#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    /// The listener already holds a callback URL; DOM state is irrelevant.
    CallbackCaptured(String),
    /// Browser-internal error page; transient.
    ErrorPage,
    /// The page itself navigated to the callback URL.
    CallbackReached(String),
    /// Known transitional provider page that self-navigates.
    IntermediateRedirect,
    /// Explicit authorize/allow step.
    ConsentConfirmation,
    /// Multiple selectable accounts, no confirmation controls.
    AccountChooser,
    /// One-time-code input, and the identity has a seed to answer it.
    SecondFactorPrompt,
    /// Generic continue/sign-in control.
    SignInAffirmation,
    Unrecognized,
}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::CallbackCaptured(_) => "callback-captured",
            PageState::ErrorPage => "error-page",
            PageState::CallbackReached(_) => "callback-reached",
            PageState::IntermediateRedirect => "intermediate-redirect",
            PageState::ConsentConfirmation => "consent-confirmation",
            PageState::AccountChooser => "account-chooser",
            PageState::SecondFactorPrompt => "second-factor-prompt",
            PageState::SignInAffirmation => "sign-in-affirmation",
            PageState::Unrecognized => "unrecognized",
        }
    }
}

/// Classify the session's current observable state.
pub async fn classify(
    session: &dyn PageSession,
    capture: &CaptureSlot,
    has_totp_seed: bool,
    settings: &FlowSettings,
) -> Result<PageState> {
    if let Some(url) = capture.get() {
        return Ok(PageState::CallbackCaptured(url));
    }

    let url = session.current_url().await?;

    if url.starts_with("chrome-error://") {
        return Ok(PageState::ErrorPage);
    }

    if settings.is_callback_url(&url) {
        return Ok(PageState::CallbackReached(url));
    }

    if url.contains("accounts.youtube.com") || url.contains("/SetSID") {
        return Ok(PageState::IntermediateRedirect);
    }

    if url.contains("oauth/consent") || session.is_visible(CONSENT_APPROVE).await? {
        return Ok(PageState::ConsentConfirmation);
    }

    let mut confirm_visible = false;
    for control in CONFIRM_CONTROLS {
        if session.is_visible(control).await? {
            confirm_visible = true;
            break;
        }
    }
    if !confirm_visible && session.count(ACCOUNT_ENTRY).await? > 0 {
        return Ok(PageState::AccountChooser);
    }

    if has_totp_seed && session.is_visible(TOTP_INPUT).await? {
        return Ok(PageState::SecondFactorPrompt);
    }

    for control in SIGN_IN_VARIANTS {
        if session.is_visible(control).await? {
            return Ok(PageState::SignInAffirmation);
        }
    }

    Ok(PageState::Unrecognized)
}
