//! CDP-backed [`PageSession`] on chromiumoxide.
//!
//! Each session owns one Chrome process launched against a persistent
//! per-identity profile directory, so cookies and device trust survive
//! across runs. The CDP event handler runs on a spawned task that lives
//! exactly as long as the session.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dom;
use crate::session::PageSession;

/// Settings for launching a Chrome instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Persistent profile directory for this identity.
    pub profile_dir: PathBuf,
    pub headless: bool,
    /// Explicit Chrome binary. When None, well-known locations are probed.
    pub chrome_executable: Option<String>,
    /// Pause inserted after navigations and clicks so the page can settle.
    pub action_delay: Duration,
    /// Upper bound on a single navigation.
    pub navigation_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from(".authflow-profile"),
            headless: true,
            chrome_executable: None,
            action_delay: Duration::from_millis(500),
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

/// A live Chrome page driven over the DevTools protocol.
pub struct CdpSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    action_delay: Duration,
    navigation_timeout: Duration,
}

impl CdpSession {
    /// Launch Chrome with a persistent profile and open a blank page.
    pub async fn launch(opts: LaunchOptions) -> Result<Self> {
        let executable = match opts.chrome_executable.clone() {
            Some(path) => path,
            None => find_chrome().ok_or_else(|| {
                anyhow!("no Chrome binary found; install Google Chrome or set an explicit path")
            })?,
        };

        std::fs::create_dir_all(&opts.profile_dir)
            .with_context(|| format!("creating profile dir {}", opts.profile_dir.display()))?;
        clear_profile_locks(&opts.profile_dir);

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .user_data_dir(&opts.profile_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !opts.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|e| anyhow!(e))?;

        debug!(chrome = %executable, profile = %opts.profile_dir.display(), "launching browser");
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while (handler.next().await).is_some() {}
        });

        let page = browser.new_page("about:blank").await?;
        // Network events are off by default; the capture pipeline needs them.
        page.execute(EnableParams::default()).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            action_delay: opts.action_delay,
            navigation_timeout: opts.navigation_timeout,
        })
    }

    /// Close the browser process and stop the event handler.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler_task.abort();
        Ok(())
    }

    async fn settle(&self) {
        tokio::time::sleep(self.action_delay).await;
    }

    async fn eval_value(&self, js: &str) -> Result<Value> {
        let result = self.page.evaluate(js).await?;
        Ok(result.into_value::<Value>()?)
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageSession for CdpSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        // Chrome reports network failures as navigation errors while still
        // rendering a chrome-error:// document; the caller classifies that
        // page, so errors and timeouts are logged rather than propagated.
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => warn!(%url, error = %err, "navigation reported an error"),
            Err(_) => warn!(%url, "navigation timed out"),
        }
        self.settle().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.eval_value("window.location.href").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("location.href was not a string"))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let value = self.eval_value(&dom::probe_js(selector)).await?;
        Ok(value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let value = self.eval_value(&dom::count_js(selector)).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn click(&self, selector: &str) -> Result<bool> {
        let value = self.eval_value(&dom::click_js(selector)).await?;
        let clicked = value.as_bool().unwrap_or(false);
        if clicked {
            self.settle().await;
        }
        Ok(clicked)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<bool> {
        let value = self.eval_value(&dom::fill_js(selector, text)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let (vk, text) = key_definition(key);
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let params = key_event_params(kind, key, vk, text)?;
            self.page.execute(params).await?;
        }
        self.settle().await;
        Ok(())
    }

    async fn evaluate(&self, js: &str) -> Result<Value> {
        self.eval_value(js).await
    }

    async fn request_urls(&self) -> Result<BoxStream<'static, String>> {
        let events = self.page.event_listener::<EventRequestWillBeSent>().await?;
        Ok(Box::pin(events.map(|ev| ev.request.url.clone())))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
                path,
            )
            .await?;
        Ok(())
    }
}

/// Build one CDP key event. Only the key-down half carries generated text;
/// sending it on key-up would double the input.
fn key_event_params(
    kind: DispatchKeyEventType,
    key: &str,
    vk: i64,
    text: Option<&'static str>,
) -> Result<DispatchKeyEventParams> {
    let is_down = matches!(kind, DispatchKeyEventType::KeyDown);
    let mut builder = DispatchKeyEventParams::builder()
        .r#type(kind)
        .key(key)
        .code(key)
        .windows_virtual_key_code(vk)
        .native_virtual_key_code(vk);
    if is_down && let Some(text) = text {
        builder = builder.text(text);
    }
    builder.build().map_err(|e| anyhow!(e))
}

fn key_definition(key: &str) -> (i64, Option<&'static str>) {
    match key {
        "Enter" => (13, Some("\r")),
        "Tab" => (9, None),
        "Escape" => (27, None),
        _ => (0, None),
    }
}

/// Probe well-known locations for a Chrome binary.
pub fn find_chrome() -> Option<String> {
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(output) = Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    for path in [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/opt/google/chrome/chrome",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    ] {
        if Path::new(path).exists() {
            return Some(path.to_string());
        }
    }

    None
}

/// Remove stale singleton lock files left by a crashed Chrome.
///
/// Chrome refuses to reuse a profile whose previous owner died without
/// cleaning these up.
fn clear_profile_locks(profile_dir: &Path) {
    for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
        let lock = profile_dir.join(name);
        if lock.exists() {
            if let Err(err) = std::fs::remove_file(&lock) {
                warn!(path = %lock.display(), error = %err, "failed to remove stale profile lock");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn clear_profile_locks_removes_stale_files() {
        let dir = tempdir().unwrap();
        for name in ["SingletonLock", "SingletonSocket", "SingletonCookie"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::write(dir.path().join("Preferences"), b"{}").unwrap();

        clear_profile_locks(dir.path());

        assert!(!dir.path().join("SingletonLock").exists());
        assert!(!dir.path().join("SingletonSocket").exists());
        assert!(!dir.path().join("SingletonCookie").exists());
        // Regular profile files are untouched
        assert!(dir.path().join("Preferences").exists());
    }

    #[test]
    fn find_chrome_does_not_panic() {
        // The binary may or may not be installed; only the probe path matters.
        let _ = find_chrome();
    }

    #[test]
    fn enter_key_carries_text() {
        let (vk, text) = key_definition("Enter");
        assert_eq!(vk, 13);
        assert_eq!(text, Some("\r"));

        let (vk, text) = key_definition("Escape");
        assert_eq!(vk, 27);
        assert_eq!(text, None);
    }

    #[test]
    fn key_event_text_only_on_key_down() {
        let (vk, text) = key_definition("Enter");

        let down = key_event_params(DispatchKeyEventType::KeyDown, "Enter", vk, text).unwrap();
        assert_eq!(down.text.as_deref(), Some("\r"));

        let up = key_event_params(DispatchKeyEventType::KeyUp, "Enter", vk, text).unwrap();
        assert!(up.text.is_none());
    }
}
