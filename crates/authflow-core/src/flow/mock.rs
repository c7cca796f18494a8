//! Scripted page session for flow tests.
//!
//! Selectors are matched by exact string, evaluated scripts by substring, so
//! tests read as "this page shows these controls" without a live browser.

use anyhow::Result;
use async_trait::async_trait;
use authflow_browser::PageSession;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct MockSession {
    url: Mutex<String>,
    visible: Mutex<HashSet<String>>,
    counts: Mutex<HashMap<String, usize>>,
    eval_stubs: Mutex<Vec<(String, Value)>>,
    requests: Mutex<Vec<String>>,
    on_click_url: Mutex<HashMap<String, String>>,
    redirects: Mutex<HashMap<String, String>>,
    on_click_hide: Mutex<HashSet<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub fills: Mutex<Vec<(String, String)>>,
    pub keys: Mutex<Vec<String>>,
    pub navigations: Mutex<Vec<String>>,
    pub screenshots: Mutex<Vec<PathBuf>>,
}

impl MockSession {
    pub fn new(url: &str) -> Self {
        let session = Self::default();
        *session.url.lock() = url.to_string();
        session
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock() = url.to_string();
    }

    pub fn set_visible(&self, selector: &str) {
        self.visible.lock().insert(selector.to_string());
    }

    pub fn hide(&self, selector: &str) {
        self.visible.lock().remove(selector);
    }

    pub fn set_count(&self, selector: &str, count: usize) {
        self.counts.lock().insert(selector.to_string(), count);
    }

    /// Navigating to `target` lands on `result` instead.
    pub fn map_navigation(&self, target: &str, result: &str) {
        self.redirects
            .lock()
            .insert(target.to_string(), result.to_string());
    }

    /// Clicking `selector` moves the page to `url`.
    pub fn on_click_set_url(&self, selector: &str, url: &str) {
        self.on_click_url
            .lock()
            .insert(selector.to_string(), url.to_string());
    }

    /// Clicking `selector` removes it from the page.
    pub fn on_click_hide(&self, selector: &str) {
        self.on_click_hide.lock().insert(selector.to_string());
    }

    /// Scripts containing `fragment` evaluate to `value`.
    pub fn stub_eval(&self, fragment: &str, value: Value) {
        self.eval_stubs.lock().push((fragment.to_string(), value));
    }

    /// Requests the page will issue, delivered through `request_urls`.
    pub fn push_request(&self, url: &str) {
        self.requests.lock().push(url.to_string());
    }

    pub fn clicked(&self, selector: &str) -> bool {
        self.clicks.lock().iter().any(|c| c == selector)
    }
}

#[async_trait]
impl PageSession for MockSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().push(url.to_string());
        let landed = self
            .redirects
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.url.lock() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().clone())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.visible.lock().contains(selector))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        if let Some(count) = self.counts.lock().get(selector) {
            return Ok(*count);
        }
        Ok(usize::from(self.visible.lock().contains(selector)))
    }

    async fn click(&self, selector: &str) -> Result<bool> {
        self.clicks.lock().push(selector.to_string());
        if !self.visible.lock().contains(selector) {
            return Ok(false);
        }
        if let Some(url) = self.on_click_url.lock().get(selector) {
            *self.url.lock() = url.clone();
        }
        if self.on_click_hide.lock().contains(selector) {
            self.visible.lock().remove(selector);
        }
        Ok(true)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<bool> {
        self.fills
            .lock()
            .push((selector.to_string(), text.to_string()));
        Ok(self.visible.lock().contains(selector))
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.keys.lock().push(key.to_string());
        Ok(())
    }

    async fn evaluate(&self, js: &str) -> Result<Value> {
        for (fragment, value) in self.eval_stubs.lock().iter() {
            if js.contains(fragment.as_str()) {
                return Ok(value.clone());
            }
        }
        Ok(Value::Null)
    }

    async fn request_urls(&self) -> Result<BoxStream<'static, String>> {
        let urls = self.requests.lock().clone();
        Ok(stream::iter(urls).boxed())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.screenshots.lock().push(path.to_path_buf());
        Ok(())
    }
}
