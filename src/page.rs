use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page as CrPage;
use chromiumoxide::page::ScreenshotParams;
use tracing::{debug, info};

use crate::element::{is_no_match, Element};
use crate::error::{Error, Result};
use crate::provider::{DocumentProvider, SelectOption, Selector, WaitCondition};

/// Wrapper around a chromiumoxide Page; the live document the form engine
/// drives.
pub struct Page {
    inner: CrPage,
}

/// Directory checkpoint screenshots are written to.
const SCREENSHOT_DIR: &str = "screenshots";

impl Page {
    pub(crate) fn new(inner: CrPage) -> Self {
        Self { inner }
    }

    /// Returns a reference to the underlying chromiumoxide Page.
    pub fn inner(&self) -> &CrPage {
        &self.inner
    }

    // ── Observations ────────────────────────────────────────────────

    /// Take a full-page screenshot and save it to a file.
    pub async fn screenshot_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.inner
            .save_screenshot(params, path)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))?;
        Ok(())
    }

    // ── Element Queries ─────────────────────────────────────────────

    /// Find all elements matching the given CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        match self.inner.find_elements(selector).await {
            Ok(els) => Ok(els.into_iter().map(Element::new).collect()),
            Err(e) if is_no_match(&e.to_string()) => Ok(Vec::new()),
            Err(e) => Err(Error::CdpError(e)),
        }
    }

    /// Find all elements matching the given XPath expression.
    pub async fn find_xpaths(&self, xpath: &str) -> Result<Vec<Element>> {
        match self.inner.find_xpaths(xpath).await {
            Ok(els) => Ok(els.into_iter().map(Element::new).collect()),
            Err(e) if is_no_match(&e.to_string()) => Ok(Vec::new()),
            Err(e) => Err(Error::CdpError(e)),
        }
    }

    async fn condition_holds(&self, el: &Element, condition: WaitCondition) -> Result<bool> {
        match condition {
            WaitCondition::Present => Ok(true),
            WaitCondition::Clickable => Ok(el.is_displayed().await? && el.is_enabled().await?),
        }
    }
}

/// Quote `s` as an XPath string literal.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[async_trait]
impl DocumentProvider for Page {
    type Handle = Element;

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Element>> {
        match selector {
            Selector::Css(css) => self.find_elements(css).await,
            Selector::XPath(xpath) => self.find_xpaths(xpath).await,
            Selector::ButtonText(text) => {
                self.find_xpaths(&format!("//button[contains(., {})]", xpath_literal(text)))
                    .await
            }
        }
    }

    async fn find_within(&self, scope: &Element, selector: &Selector) -> Result<Vec<Element>> {
        match selector {
            Selector::Css(css) => scope.find_elements(css).await,
            other => Err(Error::InteractionFailed(format!(
                "scoped lookups only support CSS, got {other}"
            ))),
        }
    }

    /// Polls every 100ms up to `timeout`.
    async fn wait_until(
        &self,
        selector: &Selector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Element> {
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();

        loop {
            for el in self.find_all(selector).await? {
                if self.condition_holds(&el, condition).await.unwrap_or(false) {
                    return Ok(el);
                }
            }
            if start.elapsed() >= timeout {
                return Err(Error::Timeout(format!(
                    "{selector} to be {}",
                    match condition {
                        WaitCondition::Present => "present",
                        WaitCondition::Clickable => "clickable",
                    }
                )));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Native click, falling back to a scripted click when the element is
    /// covered or has no layout box.
    async fn click(&self, handle: &Element) -> Result<()> {
        match handle.click().await {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(error = %e, "native click failed; retrying from script");
                handle
                    .js_click()
                    .await
                    .map_err(|js| Error::InteractionFailed(format!("click failed: {e}; {js}")))
            }
        }
    }

    async fn type_text(&self, handle: &Element, text: &str) -> Result<()> {
        handle
            .type_text(text)
            .await
            .map_err(|e| Error::InteractionFailed(format!("typing failed: {e}")))
    }

    async fn clear(&self, handle: &Element) -> Result<()> {
        handle.clear().await
    }

    async fn select_option(&self, handle: &Element, value: &str) -> Result<()> {
        handle.select_value(value).await
    }

    async fn scroll_into_view(&self, handle: &Element) -> Result<()> {
        handle.scroll_into_view().await
    }

    async fn is_selected(&self, handle: &Element) -> Result<bool> {
        handle.is_checked().await
    }

    async fn is_enabled(&self, handle: &Element) -> Result<bool> {
        handle.is_enabled().await
    }

    async fn is_displayed(&self, handle: &Element) -> Result<bool> {
        handle.is_displayed().await
    }

    async fn attribute(&self, handle: &Element, name: &str) -> Result<Option<String>> {
        handle.get_attribute(name).await
    }

    async fn text(&self, handle: &Element) -> Result<String> {
        handle.inner_text().await
    }

    async fn value(&self, handle: &Element) -> Result<String> {
        handle.value().await
    }

    async fn options(&self, handle: &Element) -> Result<Vec<SelectOption>> {
        handle.options().await
    }

    async fn associated_label(&self, handle: &Element) -> Result<Option<String>> {
        handle.associated_label().await
    }

    async fn preceding_sibling_text(&self, handle: &Element) -> Result<Option<String>> {
        handle.preceding_sibling_text().await
    }

    async fn container_text(&self, handle: &Element) -> Result<String> {
        handle.container_text().await
    }

    /// Saves `screenshots/<name>_<unix seconds>.png`.
    async fn checkpoint(&self, name: &str) -> Result<()> {
        std::fs::create_dir_all(SCREENSHOT_DIR)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = Path::new(SCREENSHOT_DIR).join(format!("{name}_{stamp}.png"));
        self.screenshot_to_file(&path).await?;
        info!(path = %path.display(), "screenshot saved");
        Ok(())
    }
}
