use std::sync::Arc;

use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Tab};
use serde_json::Value;

/// One loaded page. Evaluation runs arbitrary in-page JavaScript and returns
/// the resulting JSON value (callers stringify complex results themselves).
pub trait BrowserPage: Send {
    fn evaluate(&self, expression: &str) -> Result<Value, String>;
    fn click(&self, selector: &str) -> Result<(), String>;
    fn current_url(&self) -> String;
    fn screenshot_png(&self) -> Result<Vec<u8>, String>;
}

/// Headless-browser seam for the monitoring service. The production driver
/// launches Chrome; tests script a fake.
pub trait BrowserDriver: Send + Sync {
    fn open(&self, url: &str) -> Result<Box<dyn BrowserPage>, String>;
}

/// Stand-in used when no browser could be launched; every `open` fails with
/// the launch error so callers fold it the same way as a navigation failure.
pub struct UnavailableDriver(pub String);

impl BrowserDriver for UnavailableDriver {
    fn open(&self, _url: &str) -> Result<Box<dyn BrowserPage>, String> {
        Err(self.0.clone())
    }
}

pub struct ChromeDriver {
    browser: Browser,
}

impl ChromeDriver {
    /// Launch a headless Chrome. Fails when no usable browser binary exists;
    /// monitoring folds that into its best-effort results.
    pub fn launch() -> Result<Self, String> {
        let browser = Browser::default().map_err(|e| format!("browser launch failed: {e}"))?;
        Ok(Self { browser })
    }
}

impl BrowserDriver for ChromeDriver {
    fn open(&self, url: &str) -> Result<Box<dyn BrowserPage>, String> {
        let tab = self.browser
            .new_tab()
            .map_err(|e| format!("failed to open tab: {e}"))?;

        tab.navigate_to(url)
            .map_err(|e| format!("navigation to {url} failed: {e}"))?;
        tab.wait_until_navigated()
            .map_err(|e| format!("navigation to {url} did not settle: {e}"))?;

        Ok(Box::new(ChromePage { tab }))
    }
}

struct ChromePage {
    tab: Arc<Tab>,
}

impl BrowserPage for ChromePage {
    fn evaluate(&self, expression: &str) -> Result<Value, String> {
        let result = self.tab
            .evaluate(expression, false)
            .map_err(|e| format!("evaluation failed: {e}"))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn click(&self, selector: &str) -> Result<(), String> {
        let element = self.tab
            .wait_for_element(selector)
            .map_err(|e| format!("element {selector} not found: {e}"))?;
        element
            .click()
            .map_err(|e| format!("click on {selector} failed: {e}"))?;
        Ok(())
    }

    fn current_url(&self) -> String {
        self.tab.get_url()
    }

    fn screenshot_png(&self) -> Result<Vec<u8>, String> {
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| format!("screenshot failed: {e}"))
    }
}
