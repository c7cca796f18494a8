//! Invite-acceptance flow.
//!
//! The group invitation arrives by mail. The flow opens the inbox, finds the
//! invitation (preferring the invitation mail itself over the later join
//! confirmation), follows its accept link, and confirms joining. Success
//! advances the identity from activated to joined.

use crate::config::{Endpoints, FlowSettings};
use anyhow::Result;
use authflow_browser::PageSession;
use serde_json::Value;
use tracing::{debug, info};

/// Inbox search queries, most specific first.
const SEARCH_QUERIES: [&str; 3] = ["family invitation", "Google family", "family"];

const SEARCH_INPUTS: [&str; 2] = ["input[name='q']", "input[type='text']"];

/// First-run and promo overlays the inbox likes to open with.
const OVERLAY_DISMISSALS: [&str; 5] = [
    "button:text('Not now')",
    "button:text('No thanks')",
    "button:text('Skip')",
    "button:text('Got it')",
    "button:text('Dismiss')",
];

const CONFIRM_VARIANTS: [&str; 4] = [
    "button:text('Accept')",
    "button:text('Join')",
    "button:text('Confirm')",
    "button:text('Continue')",
];

/// Host of the provider's membership pages.
const FAMILY_HOST: &str = "families.google.com";

/// Open the mail row matching the query. The invitation subject is a
/// question ("... wants you to join ...?"), so rows containing '?' are
/// preferred over the join-confirmation mail the same search also finds.
fn open_invite_row_js(query: &str) -> String {
    let needle = serde_json::to_string(&query.to_lowercase()).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(function() {{\n\
           const needle = {needle};\n\
           const candidates = Array.from(document.querySelectorAll('tr.zA, .zA'))\n\
             .filter(row => (row.innerText || '').toLowerCase().includes(needle));\n\
           if (candidates.length === 0) return false;\n\
           const invite = candidates.find(row => (row.innerText || '').includes('?'));\n\
           (invite || candidates[0]).click();\n\
           return true;\n\
         }})()"
    )
}

/// Find the accept link inside the opened mail, scanning same-origin frames
/// since the message body renders in one.
const ACCEPT_LINK_JS: &str = r#"(function() {
  function scan(doc) {
    for (const a of Array.from(doc.querySelectorAll('a'))) {
      if ((a.innerText || '').toLowerCase().includes('accept')) return a.href;
    }
    return null;
  }
  const hit = scan(document);
  if (hit) return hit;
  for (const frame of Array.from(window.frames)) {
    try {
      const found = scan(frame.document);
      if (found) return found;
    } catch (_) {}
  }
  return null;
})()"#;

/// Accept the pending group invitation for the signed-in identity.
pub async fn accept_invite(
    session: &dyn PageSession,
    settings: &FlowSettings,
    endpoints: &Endpoints,
) -> Result<()> {
    session.navigate(&endpoints.inbox_url).await?;
    tokio::time::sleep(settings.settle_delay()).await;

    for _ in 0..2 {
        session.press_key("Escape").await?;
    }
    for selector in OVERLAY_DISMISSALS {
        if session.click(selector).await? {
            debug!(selector, "dismissed inbox overlay");
            tokio::time::sleep(settings.settle_delay()).await;
        }
    }

    for query in SEARCH_QUERIES {
        if !search_inbox(session, query).await? {
            continue;
        }
        tokio::time::sleep(settings.post_action_delay()).await;

        let opened = session
            .evaluate(&open_invite_row_js(query))
            .await?
            .as_bool()
            .unwrap_or(false);
        if !opened {
            debug!(query, "no mail row matched");
            continue;
        }
        tokio::time::sleep(settings.settle_delay()).await;

        let href = match session.evaluate(ACCEPT_LINK_JS).await? {
            Value::String(href) if !href.is_empty() => href,
            _ => {
                debug!(query, "opened mail has no accept link");
                continue;
            }
        };

        debug!(%href, "following accept link");
        session.navigate(&href).await?;
        tokio::time::sleep(settings.post_action_delay()).await;

        let confirmed = confirm_joining(session, settings).await?;
        let url = session.current_url().await?;
        if confirmed || url.contains(FAMILY_HOST) {
            info!("invitation accepted");
            return Ok(());
        }
    }

    Err(anyhow::anyhow!("Family invitation could not be accepted"))
}

async fn search_inbox(session: &dyn PageSession, query: &str) -> Result<bool> {
    for input in SEARCH_INPUTS {
        if session.fill(input, query).await? {
            session.press_key("Enter").await?;
            debug!(query, "searched inbox");
            return Ok(true);
        }
    }
    Ok(false)
}

/// The accept page can chain more than one confirmation step.
async fn confirm_joining(session: &dyn PageSession, settings: &FlowSettings) -> Result<bool> {
    let mut confirmed = false;
    for _ in 0..3 {
        let mut clicked_any = false;
        for selector in CONFIRM_VARIANTS {
            if session.click(selector).await? {
                debug!(selector, "clicked join confirmation");
                clicked_any = true;
                confirmed = true;
                tokio::time::sleep(settings.settle_delay()).await;
            }
        }
        if !clicked_any {
            break;
        }
    }
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::mock::MockSession;
    use serde_json::json;

    fn fast_settings() -> FlowSettings {
        FlowSettings {
            poll_delay_secs: 0,
            settle_delay_secs: 0,
            post_action_delay_secs: 0,
            ..FlowSettings::default()
        }
    }

    #[tokio::test]
    async fn follows_the_accept_link_and_confirms() {
        let session = MockSession::new("about:blank");
        session.set_visible("input[name='q']");
        session.stub_eval("candidates", json!(true));
        session.stub_eval(
            "window.frames",
            json!("https://families.google.com/join?token=T"),
        );
        session.set_visible("button:text('Join')");
        session.on_click_hide("button:text('Join')");

        accept_invite(&session, &fast_settings(), &Endpoints::default())
            .await
            .unwrap();

        assert!(
            session
                .navigations
                .lock()
                .contains(&"https://families.google.com/join?token=T".to_string())
        );
        assert!(session.clicked("button:text('Join')"));
    }

    #[tokio::test]
    async fn no_matching_mail_is_an_error() {
        let session = MockSession::new("about:blank");
        session.set_visible("input[name='q']");
        session.stub_eval("candidates", json!(false));

        let err = accept_invite(&session, &fast_settings(), &Endpoints::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not be accepted"));
    }

    #[tokio::test]
    async fn dismisses_overlays_before_searching() {
        let session = MockSession::new("about:blank");
        session.set_visible("button:text('Got it')");
        session.on_click_hide("button:text('Got it')");
        session.set_visible("input[name='q']");
        session.stub_eval("candidates", json!(true));
        session.stub_eval("window.frames", json!("https://families.google.com/j"));

        // Lands on the membership host, so the missing confirm button is fine
        accept_invite(&session, &fast_settings(), &Endpoints::default())
            .await
            .unwrap();

        assert_eq!(session.keys.lock().iter().filter(|k| *k == "Escape").count(), 2);
        assert!(session.clicked("button:text('Got it')"));
    }
}
