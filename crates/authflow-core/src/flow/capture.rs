//! Callback capture.
//!
//! The final redirect of the OAuth flow targets a local URL that nothing
//! listens on, so the page usually lands on a browser error before the
//! address bar ever shows the callback. Watching the page's outbound
//! requests is the reliable signal: the first request whose URL matches a
//! callback prefix is captured verbatim, and later matches are ignored.

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::task::JoinHandle;
use tracing::debug;

/// Single-slot, first-write-wins buffer for the captured callback URL.
#[derive(Clone, Default)]
pub struct CaptureSlot {
    url: Arc<OnceLock<String>>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a URL if the slot is still empty. Returns whether this call won.
    pub fn record(&self, url: &str) -> bool {
        self.url.set(url.to_string()).is_ok()
    }

    pub fn get(&self) -> Option<String> {
        self.url.get().cloned()
    }
}

/// Watch a request-URL stream and capture the first callback match.
///
/// The returned task runs until the stream ends; the driver aborts it when
/// the run terminates so no listener outlives its run.
pub fn spawn_listener(
    slot: CaptureSlot,
    mut urls: BoxStream<'static, String>,
    prefixes: Vec<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(url) = urls.next().await {
            if prefixes.iter().any(|p| url.starts_with(p))
                && slot.record(&url)
            {
                debug!(%url, "captured callback request");
            }
        }
    })
}
