//! Corrective action dispatch.
//!
//! Exactly one bounded action per classified state. Actions report whether
//! they did anything; "nothing matched" is a no-op answer the driver counts,
//! never an error, except for the account chooser where a missing exact
//! match fails the run on the spot. Clicking a near-match there would
//! silently authenticate the wrong account.

use crate::flow::classify::{
    CONSENT_APPROVE, PageState, SIGN_IN_VARIANTS, TOTP_INPUT,
};
use crate::flow::totp;
use anyhow::Result;
use authflow_browser::PageSession;
use tracing::{debug, warn};

/// Consent authorize controls, tried in order.
const CONSENT_VARIANTS: [&str; 3] = [
    CONSENT_APPROVE,
    "button:text('Allow')",
    "button:text('Continue')",
];

/// One-time-code submit control.
const TOTP_NEXT: &str = "#totpNext";

/// Last-resort consent click: scan every button-shaped element for an
/// authorize-like label.
const CONSENT_FALLBACK_JS: &str = r#"(function() {
  const labels = ['allow', 'continue', 'approve', 'confirm'];
  const els = Array.from(document.querySelectorAll("button, div[role='button'], input[type='submit']"));
  for (const el of els) {
    const text = ((el.innerText || el.value || '') + '').trim().toLowerCase();
    if (labels.some(l => text === l || text.startsWith(l + ' '))) {
      el.click();
      return true;
    }
  }
  return false;
})()"#;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A corrective action was performed; allow the page time to settle.
    Acted,
    /// Nothing to do for this state; just wait and re-classify.
    Waited,
    /// An action was called for but no control matched.
    NoOp,
    /// The run cannot proceed.
    Fatal(String),
}

/// Perform the one corrective action for a classified state.
pub async fn dispatch(
    session: &dyn PageSession,
    state: &PageState,
    email: &str,
    totp_seed: Option<&str>,
) -> Result<DispatchOutcome> {
    match state {
        PageState::ConsentConfirmation => confirm_consent(session).await,
        PageState::AccountChooser => choose_account(session, email).await,
        PageState::SecondFactorPrompt => answer_second_factor(session, totp_seed).await,
        PageState::SignInAffirmation => affirm_sign_in(session).await,
        _ => Ok(DispatchOutcome::Waited),
    }
}

async fn confirm_consent(session: &dyn PageSession) -> Result<DispatchOutcome> {
    for selector in CONSENT_VARIANTS {
        if session.click(selector).await? {
            debug!(selector, "clicked consent control");
            return Ok(DispatchOutcome::Acted);
        }
    }
    // Localized button text defeats the selector list; fall back to a scan.
    let clicked = session
        .evaluate(CONSENT_FALLBACK_JS)
        .await?
        .as_bool()
        .unwrap_or(false);
    if clicked {
        debug!("clicked consent control via text scan");
        return Ok(DispatchOutcome::Acted);
    }
    Ok(DispatchOutcome::NoOp)
}

async fn choose_account(session: &dyn PageSession, email: &str) -> Result<DispatchOutcome> {
    let by_identifier = format!("[data-identifier=\"{}\"]", email);
    if session.click(&by_identifier).await? {
        debug!(email, "selected account by identifier");
        return Ok(DispatchOutcome::Acted);
    }

    let by_email = format!("[data-email=\"{}\"]", email);
    if session.click(&by_email).await? {
        debug!(email, "selected account by email attribute");
        return Ok(DispatchOutcome::Acted);
    }

    if session
        .evaluate(&account_scan_js(email))
        .await?
        .as_bool()
        .unwrap_or(false)
    {
        debug!(email, "selected account via attribute scan");
        return Ok(DispatchOutcome::Acted);
    }

    warn!(email, "account chooser has no entry for this identity");
    Ok(DispatchOutcome::Fatal(format!(
        "No account entry matching {}",
        email
    )))
}

/// Exact-match scan over chooser entries. The comparison is full-string
/// equality on the entry's account attribute, never a substring test.
fn account_scan_js(email: &str) -> String {
    let needle = serde_json::to_string(&email.trim().to_lowercase())
        .unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(function() {{\n\
           const target = {needle};\n\
           const els = Array.from(document.querySelectorAll('[data-identifier], [data-email]'));\n\
           for (const el of els) {{\n\
             const id = (el.getAttribute('data-identifier') || el.getAttribute('data-email') || '')\n\
               .trim().toLowerCase();\n\
             if (id === target) {{ el.click(); return true; }}\n\
           }}\n\
           return false;\n\
         }})()"
    )
}

async fn answer_second_factor(
    session: &dyn PageSession,
    totp_seed: Option<&str>,
) -> Result<DispatchOutcome> {
    let Some(seed) = totp_seed else {
        return Ok(DispatchOutcome::NoOp);
    };
    let code = totp::current_code(seed)?;
    if !session.fill(TOTP_INPUT, &code).await? {
        return Ok(DispatchOutcome::NoOp);
    }
    if !session.click(TOTP_NEXT).await? {
        session.press_key("Enter").await?;
    }
    debug!("submitted one-time code");
    Ok(DispatchOutcome::Acted)
}

async fn affirm_sign_in(session: &dyn PageSession) -> Result<DispatchOutcome> {
    for selector in SIGN_IN_VARIANTS {
        if session.click(selector).await? {
            debug!(selector, "clicked continue control");
            return Ok(DispatchOutcome::Acted);
        }
    }
    Ok(DispatchOutcome::NoOp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::mock::MockSession;
    use serde_json::json;

    #[tokio::test]
    async fn chooser_clicks_the_exact_entry() {
        let session = MockSession::new("https://accounts.example.com/oauth/choose");
        session.set_visible("[data-identifier=\"a@x.com\"]");
        session.set_visible("[data-identifier=\"b@x.com\"]");

        let outcome = dispatch(&session, &PageState::AccountChooser, "a@x.com", None)
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Acted);
        assert!(session.clicked("[data-identifier=\"a@x.com\"]"));
        assert!(!session.clicked("[data-identifier=\"b@x.com\"]"));
    }

    #[tokio::test]
    async fn chooser_without_a_match_is_fatal() {
        let session = MockSession::new("https://accounts.example.com/oauth/choose");
        session.set_visible("[data-identifier=\"b@x.com\"]");

        let outcome = dispatch(&session, &PageState::AccountChooser, "a@x.com", None)
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Fatal(reason) => assert!(reason.contains("a@x.com")),
            other => panic!("expected fatal outcome, got {:?}", other),
        }
        // The near-miss entry was never clicked
        assert!(!session.clicked("[data-identifier=\"b@x.com\"]"));
    }

    #[tokio::test]
    async fn consent_falls_back_to_text_scan() {
        let session = MockSession::new("https://accounts.example.com/oauth/consent");
        session.stub_eval("labels.some", json!(true));

        let outcome = dispatch(&session, &PageState::ConsentConfirmation, "a@x.com", None)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Acted);
    }

    #[tokio::test]
    async fn consent_with_nothing_clickable_is_noop() {
        let session = MockSession::new("https://accounts.example.com/oauth/consent");
        session.stub_eval("labels.some", json!(false));

        let outcome = dispatch(&session, &PageState::ConsentConfirmation, "a@x.com", None)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoOp);
    }

    #[tokio::test]
    async fn second_factor_fills_a_six_digit_code() {
        let session = MockSession::new("https://accounts.example.com/challenge");
        session.set_visible("input[type='tel']");
        session.set_visible("#totpNext");

        let outcome = dispatch(
            &session,
            &PageState::SecondFactorPrompt,
            "a@x.com",
            Some("JBSWY3DPEHPK3PXP"),
        )
        .await
        .unwrap();

        assert_eq!(outcome, DispatchOutcome::Acted);
        let fills = session.fills.lock().clone();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].0, "input[type='tel']");
        assert_eq!(fills[0].1.len(), 6);
        assert!(session.clicked("#totpNext"));
    }

    #[tokio::test]
    async fn intermediate_redirect_just_waits() {
        let session = MockSession::new("https://accounts.youtube.com/SetSID");
        let outcome = dispatch(&session, &PageState::IntermediateRedirect, "a@x.com", None)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Waited);
        assert!(session.clicks.lock().is_empty());
    }
}
