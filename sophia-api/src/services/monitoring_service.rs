// Best-effort site diagnostics driven through the browser seam. Every public
// function folds failures into its result struct instead of raising; a site
// being down is a finding, not an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use sophia_shared::clients::browser::{BrowserDriver, BrowserPage};

// ─── Uptime ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct UptimeCheck {
    pub url: String,
    pub is_up: bool,
    pub http_status: u16,
    pub response_time_ms: u64,
    pub page_title: Option<String>,
    pub broken_resources: i64,
    pub has_errors: bool,
    pub error_messages: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

const UPTIME_PROBE: &str = r#"JSON.stringify({
    title: document.title,
    brokenImages: Array.from(document.images)
        .filter(i => !i.complete || i.naturalWidth === 0).length,
})"#;

pub fn check_uptime(driver: &dyn BrowserDriver, url: &str) -> UptimeCheck {
    let started = Instant::now();
    let checked_at = Utc::now();

    let page = match driver.open(url) {
        Ok(page) => page,
        Err(e) => {
            return UptimeCheck {
                url: url.to_string(),
                is_up: false,
                http_status: 500,
                response_time_ms: started.elapsed().as_millis() as u64,
                page_title: None,
                broken_resources: 0,
                has_errors: true,
                error_messages: vec![e],
                checked_at,
            };
        }
    };
    let response_time_ms = started.elapsed().as_millis() as u64;

    let mut error_messages = Vec::new();
    let mut page_title = None;
    let mut broken_resources = 0;

    match eval_json(page.as_ref(), UPTIME_PROBE) {
        Ok(probe) => {
            page_title = probe
                .get("title")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            broken_resources = probe
                .get("brokenImages")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
        }
        Err(e) => error_messages.push(e),
    }

    if broken_resources > 0 {
        error_messages.push(format!("{broken_resources} broken resources on page"));
    }

    UptimeCheck {
        url: url.to_string(),
        is_up: true,
        http_status: 200,
        response_time_ms,
        page_title,
        broken_resources,
        has_errors: !error_messages.is_empty(),
        error_messages,
        checked_at,
    }
}

// ─── Site audit ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SiteAudit {
    pub url: String,
    pub performance_score: u32,
    pub accessibility_score: u32,
    pub seo_score: u32,
    pub load_ms: i64,
    pub images_missing_alt: i64,
    pub has_meta_description: bool,
    pub has_lang_attribute: bool,
    pub h1_count: i64,
    pub has_errors: bool,
    pub error_messages: Vec<String>,
    pub audited_at: DateTime<Utc>,
}

const AUDIT_PROBE: &str = r#"JSON.stringify({
    title: document.title,
    hasMetaDescription: !!document.querySelector('meta[name="description"]'),
    lang: document.documentElement.getAttribute('lang') || '',
    imagesMissingAlt: Array.from(document.images).filter(i => !i.hasAttribute('alt')).length,
    h1Count: document.querySelectorAll('h1').length,
    loadMs: (performance.timing.loadEventEnd - performance.timing.navigationStart) || 0,
})"#;

pub fn run_site_audit(driver: &dyn BrowserDriver, url: &str) -> SiteAudit {
    let audited_at = Utc::now();

    let failed = |messages: Vec<String>| SiteAudit {
        url: url.to_string(),
        performance_score: 0,
        accessibility_score: 0,
        seo_score: 0,
        load_ms: 0,
        images_missing_alt: 0,
        has_meta_description: false,
        has_lang_attribute: false,
        h1_count: 0,
        has_errors: true,
        error_messages: messages,
        audited_at,
    };

    let page = match driver.open(url) {
        Ok(page) => page,
        Err(e) => return failed(vec![e]),
    };

    let probe = match eval_json(page.as_ref(), AUDIT_PROBE) {
        Ok(probe) => probe,
        Err(e) => return failed(vec![e]),
    };

    let title = probe.get("title").and_then(|v| v.as_str()).unwrap_or("");
    let has_meta_description = probe
        .get("hasMetaDescription")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let has_lang_attribute = probe
        .get("lang")
        .and_then(|v| v.as_str())
        .map(|l| !l.is_empty())
        .unwrap_or(false);
    let images_missing_alt = probe
        .get("imagesMissingAlt")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let h1_count = probe.get("h1Count").and_then(|v| v.as_i64()).unwrap_or(0);
    let load_ms = probe.get("loadMs").and_then(|v| v.as_i64()).unwrap_or(0);

    SiteAudit {
        url: url.to_string(),
        performance_score: performance_bucket(load_ms),
        accessibility_score: accessibility_points(images_missing_alt, has_lang_attribute),
        seo_score: seo_points(title, has_meta_description, h1_count),
        load_ms,
        images_missing_alt,
        has_meta_description,
        has_lang_attribute,
        h1_count,
        has_errors: false,
        error_messages: Vec::new(),
        audited_at,
    }
}

fn performance_bucket(load_ms: i64) -> u32 {
    match load_ms {
        ms if ms <= 0 => 50,
        ms if ms < 1_000 => 100,
        ms if ms < 2_500 => 75,
        ms if ms < 5_000 => 50,
        _ => 25,
    }
}

fn accessibility_points(images_missing_alt: i64, has_lang: bool) -> u32 {
    let mut score: i64 = 100;
    score -= (images_missing_alt * 10).min(50);
    if !has_lang {
        score -= 25;
    }
    score.max(0) as u32
}

fn seo_points(title: &str, has_meta_description: bool, h1_count: i64) -> u32 {
    let mut score: i64 = 100;
    if title.trim().is_empty() {
        score -= 30;
    }
    if !has_meta_description {
        score -= 40;
    }
    if h1_count == 0 {
        score -= 30;
    }
    score.max(0) as u32
}

// ─── Payment flow ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FlowStep {
    pub step: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentFlowResult {
    pub url: String,
    pub steps: Vec<FlowStep>,
    pub completed: bool,
    pub tested_at: DateTime<Utc>,
}

/// Selector heuristics for a subscribe/checkout control, tried in order.
const SUBSCRIBE_SELECTORS: &[&str] = &[
    "#subscribe",
    "#subscribe-button",
    "button[data-action='subscribe']",
    ".subscribe-btn",
    ".btn-subscribe",
    "a[href*='checkout']",
];

pub fn test_payment_flow(driver: &dyn BrowserDriver, url: &str) -> PaymentFlowResult {
    let tested_at = Utc::now();
    let mut steps = Vec::new();

    let page = match driver.open(url) {
        Ok(page) => {
            steps.push(FlowStep {
                step: "navigate".to_string(),
                passed: true,
                detail: None,
            });
            page
        }
        Err(e) => {
            steps.push(FlowStep {
                step: "navigate".to_string(),
                passed: false,
                detail: Some(e),
            });
            return PaymentFlowResult {
                url: url.to_string(),
                steps,
                completed: false,
                tested_at,
            };
        }
    };

    let found = SUBSCRIBE_SELECTORS.iter().find(|selector| {
        let probe = format!("document.querySelector({:?}) !== null", selector);
        matches!(page.evaluate(&probe), Ok(Value::Bool(true)))
    });

    let Some(selector) = found else {
        steps.push(FlowStep {
            step: "find_subscribe_control".to_string(),
            passed: false,
            detail: Some("no subscribe control matched any known selector".to_string()),
        });
        return PaymentFlowResult {
            url: url.to_string(),
            steps,
            completed: false,
            tested_at,
        };
    };

    steps.push(FlowStep {
        step: "find_subscribe_control".to_string(),
        passed: true,
        detail: Some(format!("matched selector {selector}")),
    });

    match page.click(selector) {
        Ok(()) => steps.push(FlowStep {
            step: "click_subscribe".to_string(),
            passed: true,
            detail: None,
        }),
        Err(e) => {
            steps.push(FlowStep {
                step: "click_subscribe".to_string(),
                passed: false,
                detail: Some(e),
            });
            return PaymentFlowResult {
                url: url.to_string(),
                steps,
                completed: false,
                tested_at,
            };
        }
    }

    // Either the click navigated somewhere payment-shaped or an embedded
    // checkout frame appeared.
    let landed = page.current_url();
    let reached_checkout = ["checkout", "stripe", "payment", "subscribe"]
        .iter()
        .any(|needle| landed.to_lowercase().contains(needle))
        || matches!(
            page.evaluate(r#"document.querySelector('iframe[src*="stripe"]') !== null"#),
            Ok(Value::Bool(true))
        );

    steps.push(FlowStep {
        step: "reach_checkout".to_string(),
        passed: reached_checkout,
        detail: Some(format!("landed on {landed}")),
    });

    let completed = steps.iter().all(|s| s.passed);
    PaymentFlowResult {
        url: url.to_string(),
        steps,
        completed,
        tested_at,
    }
}

// ─── Shared helpers ─────────────────────────────────────────────────────────

/// Run a probe expression that stringifies its result and parse it back.
fn eval_json(page: &dyn BrowserPage, expression: &str) -> Result<Value, String> {
    match page.evaluate(expression)? {
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|e| format!("probe returned invalid JSON: {e}"))
        }
        other => Err(format!("probe returned unexpected value: {other}")),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Scripted page: dispatches on probe content the way a real page would
    /// answer, without a browser.
    struct FakePage {
        uptime_json: String,
        audit_json: String,
        present_selectors: Vec<&'static str>,
        click_fails: bool,
        url_after_click: String,
    }

    impl BrowserPage for FakePage {
        fn evaluate(&self, expression: &str) -> Result<Value, String> {
            if expression.contains("brokenImages") {
                return Ok(Value::String(self.uptime_json.clone()));
            }
            if expression.contains("hasMetaDescription") {
                return Ok(Value::String(self.audit_json.clone()));
            }
            if expression.contains("querySelector") {
                let hit = self
                    .present_selectors
                    .iter()
                    .any(|s| expression.contains(s));
                return Ok(Value::Bool(hit));
            }
            Err("unexpected probe".to_string())
        }

        fn click(&self, _selector: &str) -> Result<(), String> {
            if self.click_fails {
                Err("element not clickable".to_string())
            } else {
                Ok(())
            }
        }

        fn current_url(&self) -> String {
            self.url_after_click.clone()
        }

        fn screenshot_png(&self) -> Result<Vec<u8>, String> {
            Ok(vec![])
        }
    }

    struct FakeDriver {
        navigation_error: Option<String>,
        page: fn() -> FakePage,
    }

    impl BrowserDriver for FakeDriver {
        fn open(&self, _url: &str) -> Result<Box<dyn BrowserPage>, String> {
            match &self.navigation_error {
                Some(e) => Err(e.clone()),
                None => Ok(Box::new((self.page)())),
            }
        }
    }

    fn healthy_page() -> FakePage {
        FakePage {
            uptime_json: json!({ "title": "Acme", "brokenImages": 0 }).to_string(),
            audit_json: json!({
                "title": "Acme",
                "hasMetaDescription": true,
                "lang": "en",
                "imagesMissingAlt": 0,
                "h1Count": 1,
                "loadMs": 800,
            })
            .to_string(),
            present_selectors: vec!["#subscribe"],
            click_fails: false,
            url_after_click: "https://acme.test/checkout".to_string(),
        }
    }

    #[test]
    fn uptime_reports_healthy_site() {
        let driver = FakeDriver { navigation_error: None, page: healthy_page };
        let check = check_uptime(&driver, "https://acme.test");

        assert!(check.is_up);
        assert_eq!(check.http_status, 200);
        assert_eq!(check.page_title.as_deref(), Some("Acme"));
        assert!(!check.has_errors);
    }

    #[test]
    fn navigation_failure_folds_into_result() {
        let driver = FakeDriver {
            navigation_error: Some("connection refused".to_string()),
            page: healthy_page,
        };
        let check = check_uptime(&driver, "https://down.test");

        assert!(!check.is_up);
        assert_eq!(check.http_status, 500);
        assert!(check.has_errors);
        assert_eq!(check.error_messages, vec!["connection refused".to_string()]);
    }

    #[test]
    fn broken_resources_flag_errors_without_downtime() {
        fn page() -> FakePage {
            let mut p = healthy_page();
            p.uptime_json = json!({ "title": "Acme", "brokenImages": 3 }).to_string();
            p
        }
        let driver = FakeDriver { navigation_error: None, page };
        let check = check_uptime(&driver, "https://acme.test");

        assert!(check.is_up);
        assert_eq!(check.broken_resources, 3);
        assert!(check.has_errors);
    }

    #[test]
    fn audit_scores_clean_site_high() {
        let driver = FakeDriver { navigation_error: None, page: healthy_page };
        let audit = run_site_audit(&driver, "https://acme.test");

        assert_eq!(audit.performance_score, 100);
        assert_eq!(audit.accessibility_score, 100);
        assert_eq!(audit.seo_score, 100);
        assert!(!audit.has_errors);
    }

    #[test]
    fn audit_penalizes_missing_alt_and_meta() {
        fn page() -> FakePage {
            let mut p = healthy_page();
            p.audit_json = json!({
                "title": "",
                "hasMetaDescription": false,
                "lang": "",
                "imagesMissingAlt": 8,
                "h1Count": 0,
                "loadMs": 6000,
            })
            .to_string();
            p
        }
        let driver = FakeDriver { navigation_error: None, page };
        let audit = run_site_audit(&driver, "https://acme.test");

        assert_eq!(audit.performance_score, 25);
        // 100 - 50 (alt cap) - 25 (no lang)
        assert_eq!(audit.accessibility_score, 25);
        assert_eq!(audit.seo_score, 0);
    }

    #[test]
    fn payment_flow_completes_on_checkout_redirect() {
        let driver = FakeDriver { navigation_error: None, page: healthy_page };
        let result = test_payment_flow(&driver, "https://acme.test");

        assert!(result.completed);
        assert_eq!(result.steps.len(), 4);
        assert!(result.steps.iter().all(|s| s.passed));
    }

    #[test]
    fn payment_flow_falls_back_through_selectors() {
        fn page() -> FakePage {
            let mut p = healthy_page();
            p.present_selectors = vec![".btn-subscribe"];
            p
        }
        let driver = FakeDriver { navigation_error: None, page };
        let result = test_payment_flow(&driver, "https://acme.test");

        let find = result
            .steps
            .iter()
            .find(|s| s.step == "find_subscribe_control")
            .unwrap();
        assert!(find.passed);
        assert!(find.detail.as_deref().unwrap().contains(".btn-subscribe"));
    }

    #[test]
    fn payment_flow_records_partial_progress() {
        fn page() -> FakePage {
            let mut p = healthy_page();
            p.click_fails = true;
            p
        }
        let driver = FakeDriver { navigation_error: None, page };
        let result = test_payment_flow(&driver, "https://acme.test");

        assert!(!result.completed);
        let click = result.steps.iter().find(|s| s.step == "click_subscribe").unwrap();
        assert!(!click.passed);
    }

    #[test]
    fn payment_flow_without_control_stops_early() {
        fn page() -> FakePage {
            let mut p = healthy_page();
            p.present_selectors = vec![];
            p
        }
        let driver = FakeDriver { navigation_error: None, page };
        let result = test_payment_flow(&driver, "https://acme.test");

        assert!(!result.completed);
        assert_eq!(result.steps.len(), 2);
    }
}
