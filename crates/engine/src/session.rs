use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use formpilot_core::FillError;
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::debug;

use crate::rules;
use crate::shared::{FillTiming, js, to_fill_error};
use crate::wire::page_origin;

/// One scriptable page: the only thing the executor needs from a browser.
#[async_trait]
pub trait PageTarget: Send + Sync {
    async fn evaluate(&self, script: String) -> Result<Value, FillError>;
}

pub struct ChromiumTarget {
    page: Page,
}

#[async_trait]
impl PageTarget for ChromiumTarget {
    async fn evaluate(&self, script: String) -> Result<Value, FillError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| to_fill_error(e, "evaluate"))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

/// Owns one Chromium instance and opens relay-equipped target pages on it.
pub struct ChromiumSession {
    browser: Browser,
    timing: FillTiming,
    extra_origins: Vec<String>,
}

impl ChromiumSession {
    pub async fn launch(headless: bool, timing: FillTiming) -> Result<Self, FillError> {
        // Unique user-data dir per instance to avoid SingletonLock conflicts.
        let temp_dir = std::env::temp_dir().join(format!("formpilot-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            FillError::dispatch_error(format!("failed to create browser profile dir: {}", e))
        })?;

        let config = ChromeConfig::builder()
            .headless_mode(if headless {
                HeadlessMode::True
            } else {
                HeadlessMode::False
            })
            .user_data_dir(temp_dir)
            .build()
            .map_err(|e| FillError::dispatch_error(format!("browser config failed: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FillError::dispatch_error(format!("browser launch failed: {}", e)))?;

        tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            timing,
            extra_origins: Vec::new(),
        })
    }

    /// Trust an additional sender origin for the cross-frame relay.
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.extra_origins.push(origin.into());
        self
    }

    /// Open the target page. The relay bootstrap is registered before
    /// navigation so every frame, cross-origin included, carries the
    /// matcher runtime and origin-validated listener before any page script
    /// runs.
    pub async fn open(&self, url: &str) -> Result<ChromiumTarget, FillError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FillError::dispatch_error(format!("new page failed: {}", e)))?;

        let mut origins = self.extra_origins.clone();
        if let Some(origin) = page_origin(url) {
            origins.insert(0, origin);
        }
        let params = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(relay_bootstrap(&origins))
            .build()
            .map_err(|e| FillError::dispatch_error(format!("relay bootstrap rejected: {}", e)))?;
        page.execute(params)
            .await
            .map_err(|e| to_fill_error(e, "install relay"))?;

        page.goto(url)
            .await
            .map_err(|e| FillError::dispatch_error(format!("navigation failed: {}", e)))?;
        tokio::time::timeout(self.timing.navigation, page.wait_for_navigation())
            .await
            .map_err(|_| {
                FillError::timeout_error(format!("navigation to {} timed out", url)).fatal()
            })?
            .map_err(|e| to_fill_error(e, "navigation wait"))?;

        debug!(url, "target page open, relay installed");
        Ok(ChromiumTarget { page })
    }
}

/// Matcher runtime + rule tables + origin-validated relay listener, as one
/// self-contained script.
pub fn relay_bootstrap(allowed_origins: &[String]) -> String {
    let listener = js::build_js_call(js::relay::RELAY_LISTENER, &[json!(allowed_origins)]);
    js::with_runtime(&rules::rules_bundle(), &listener)
}
