//! The page session capability trait.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::path::Path;

/// Capability set the flow engine needs from a live browser page.
///
/// Every query returns an explicit boolean/optional answer instead of
/// raising on missing elements, which keeps the page-state classification
/// logic testable against scripted fakes.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL and wait for the document to load.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// The page's current location.
    async fn current_url(&self) -> Result<String>;

    /// Whether at least one element matching the selector is visible.
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// How many elements match the selector.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Click the first visible match. Returns false when nothing matched.
    async fn click(&self, selector: &str) -> Result<bool>;

    /// Fill the first visible match with text. Returns false when nothing
    /// matched.
    async fn fill(&self, selector: &str, text: &str) -> Result<bool>;

    /// Send a keyboard key (e.g. "Enter", "Escape") to the page.
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&self, js: &str) -> Result<Value>;

    /// Stream of URLs for every outbound request the page issues.
    ///
    /// The subscription lives as long as the returned stream; dropping the
    /// stream unsubscribes.
    async fn request_urls(&self) -> Result<BoxStream<'static, String>>;

    /// Write a PNG screenshot of the current viewport to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;
}
