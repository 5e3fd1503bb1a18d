use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page as CrPage;

use crate::error::{Error, Result};

/// Desktop Chrome user agent sent in stealth mode.
pub const STEALTH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36";

/// Key-only Chrome flags for stealth mode, without the `--` prefix.
pub fn stealth_key_args() -> Vec<&'static str> {
    vec!["disable-infobars", "no-first-run", "start-maximized"]
}

/// Key-value Chrome flags for stealth mode.
pub fn stealth_kv_args() -> Vec<(&'static str, &'static str)> {
    vec![
        ("disable-blink-features", "AutomationControlled"),
        ("user-agent", STEALTH_USER_AGENT),
    ]
}

/// Register the evasion script so it runs before any site script on every
/// document the page loads.
pub async fn apply_stealth(page: &CrPage) -> Result<()> {
    let params = AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS);
    page.execute(params)
        .await
        .map_err(|e| Error::JsError(format!("Failed to inject stealth scripts: {e}")))?;
    Ok(())
}

static STEALTH_JS: &str = r#"
Object.defineProperty(Navigator.prototype, 'webdriver', {
    get: () => false,
    configurable: true,
    enumerable: true,
});

if (!window.chrome) {
    window.chrome = {
        runtime: {
            connect: function() {},
            sendMessage: function() {},
        },
        loadTimes: function() { return {}; },
        csi: function() { return {}; },
    };
}

Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en'],
    configurable: true,
});

const originalQuery = window.Permissions && window.Permissions.prototype.query;
if (originalQuery) {
    window.Permissions.prototype.query = function(parameters) {
        if (parameters.name === 'notifications') {
            return Promise.resolve({ state: Notification.permission });
        }
        return originalQuery.call(this, parameters);
    };
}
"#;
