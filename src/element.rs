use chromiumoxide::element::Element as CrElement;

use crate::error::{Error, Result};
use crate::provider::SelectOption;

/// CDP reports some empty matches as errors rather than an empty list.
pub(crate) fn is_no_match(message: &str) -> bool {
    let message = message.to_lowercase();
    ["could not find node", "no node", "no search result"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Wrapper around a chromiumoxide Element, providing the reads and writes
/// the form engine needs.
pub struct Element {
    inner: CrElement,
}

impl Element {
    pub(crate) fn new(inner: CrElement) -> Self {
        Self { inner }
    }

    /// Returns a reference to the underlying chromiumoxide Element.
    pub fn inner(&self) -> &CrElement {
        &self.inner
    }

    /// Click this element (scrolls into view first).
    pub async fn click(&self) -> Result<()> {
        self.inner.click().await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Dispatch a click from script. Works on elements that are covered or
    /// have no layout box of their own.
    pub async fn js_click(&self) -> Result<()> {
        self.call("function() { this.click(); }").await?;
        Ok(())
    }

    /// Type text into this element (wraps type_str).
    pub async fn type_text(&self, text: &str) -> Result<()> {
        self.inner.type_str(text).await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Scroll this element into view.
    pub async fn scroll_into_view(&self) -> Result<()> {
        self.inner.scroll_into_view().await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Get the inner text of this element, empty when it has none.
    pub async fn inner_text(&self) -> Result<String> {
        Ok(self
            .inner
            .inner_text()
            .await
            .map_err(Error::CdpError)?
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }

    /// Get the value of an attribute on this element.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.inner.attribute(name).await.map_err(Error::CdpError)
    }

    /// Find all child elements matching the given CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        match self.inner.find_elements(selector).await {
            Ok(els) => Ok(els.into_iter().map(Element::new).collect()),
            Err(e) if is_no_match(&e.to_string()) => Ok(Vec::new()),
            Err(e) => Err(Error::CdpError(e)),
        }
    }

    // ── JS-backed reads ─────────────────────────────────────────────

    /// Call `function() { … }` with `this` bound to the element.
    async fn call(&self, function: &str) -> Result<Option<serde_json::Value>> {
        let returns = self
            .inner
            .call_js_fn(function, false)
            .await
            .map_err(|e| Error::JsError(e.to_string()))?;
        if let Some(exception) = returns.exception_details {
            return Err(Error::JsError(exception.text));
        }
        Ok(returns.result.value)
    }

    async fn call_string(&self, function: &str) -> Result<String> {
        Ok(self
            .call(function)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn call_bool(&self, function: &str) -> Result<bool> {
        Ok(self.call(function).await?.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    pub async fn value(&self) -> Result<String> {
        self.call_string("function() { return this.value == null ? '' : String(this.value); }")
            .await
    }

    /// Checked state of checkboxes and radios, including radios reached
    /// through their `<label>`.
    pub async fn is_checked(&self) -> Result<bool> {
        self.call_bool(
            r#"function() {
                const target = this.control || this;
                if (target.type === 'checkbox' || target.type === 'radio') return !!target.checked;
                if ('selected' in target) return !!target.selected;
                return this.getAttribute('aria-checked') === 'true'
                    || this.getAttribute('aria-selected') === 'true';
            }"#,
        )
        .await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.call_bool(
            "function() { return !this.disabled && this.getAttribute('aria-disabled') !== 'true'; }",
        )
        .await
    }

    /// Whether the element, or a label standing in for a visually hidden
    /// input, has a layout box.
    pub async fn is_displayed(&self) -> Result<bool> {
        self.call_bool(
            r#"function() {
                const shown = el => {
                    if (!el.getClientRects().length) return false;
                    const style = window.getComputedStyle(el);
                    return style.visibility !== 'hidden' && style.display !== 'none';
                };
                if (shown(this)) return true;
                return !!this.labels && Array.from(this.labels).some(shown);
            }"#,
        )
        .await
    }

    pub async fn clear(&self) -> Result<()> {
        self.call(
            r#"function() {
                this.focus();
                this.value = '';
                this.dispatchEvent(new Event('input', { bubbles: true }));
            }"#,
        )
        .await?;
        Ok(())
    }

    /// Set a `<select>` to the option with the given value attribute.
    pub async fn select_value(&self, value: &str) -> Result<()> {
        let value_js = serde_json::to_string(value).map_err(|e| Error::JsError(e.to_string()))?;
        let function = format!(
            r#"function() {{
                const wanted = {value_js};
                if (!Array.from(this.options || []).some(o => o.value === wanted)) {{
                    throw new Error('No option with value ' + wanted);
                }}
                this.value = wanted;
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }}"#,
        );
        self.call(&function).await?;
        Ok(())
    }

    pub async fn options(&self) -> Result<Vec<SelectOption>> {
        let json = self
            .call_string(
                r#"function() {
                    return JSON.stringify(Array.from(this.options || []).map(o => ({
                        text: (o.text || '').trim(),
                        value: o.value,
                        selected: o.selected
                    })));
                }"#,
            )
            .await?;
        if json.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|e| Error::JsError(e.to_string()))
    }

    /// Text of `<label for=id>` or the enclosing `<label>`.
    pub async fn associated_label(&self) -> Result<Option<String>> {
        let label = self
            .call_string(
                r#"function() {
                    if (this.id) {
                        const el = document.querySelector('label[for="' + CSS.escape(this.id) + '"]');
                        if (el) return (el.innerText || '').trim();
                    }
                    const wrapping = this.closest('label');
                    return wrapping ? (wrapping.innerText || '').trim() : '';
                }"#,
            )
            .await?;
        Ok(Some(label).filter(|l| !l.is_empty()))
    }

    pub async fn preceding_sibling_text(&self) -> Result<Option<String>> {
        let text = self
            .call_string(
                r#"function() {
                    const prev = this.previousElementSibling;
                    return prev ? (prev.innerText || '').trim() : '';
                }"#,
            )
            .await?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    pub async fn container_text(&self) -> Result<String> {
        self.call_string(
            r#"function() {
                const parent = this.parentElement;
                return parent ? (parent.innerText || '').trim() : '';
            }"#,
        )
        .await
    }
}
