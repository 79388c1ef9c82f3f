//! UI Configuration
//!
//! Defaults come from the page location; an inline
//! `<script id="code-ui-config" type="application/json">` block may
//! override any field.

use rolling_logger::LevelFilter;
use serde::{Deserialize, Serialize};

pub const CONFIG_ELEMENT_ID: &str = "code-ui-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    /// Origin of the REST server, e.g. `http://localhost:8082`
    pub server_base: String,
    /// Namespace for client storage keys
    pub port: String,
    pub page_size: u32,
    /// Per-request timeout of the federated search
    pub request_timeout_ms: u32,
    pub recent_capacity: usize,
    pub log_level: String,
    pub log_capacity: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            server_base: String::new(),
            port: String::new(),
            page_size: 10_000,
            request_timeout_ms: 15_000,
            recent_capacity: crate::recent::RECENTLY_USED_CAPACITY,
            log_level: "info".to_string(),
            log_capacity: rolling_logger::DEFAULT_CAPACITY,
        }
    }
}

impl UiConfig {
    /// Parse an override block; absent fields keep their defaults
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Apply an optional override block and the page location. A malformed
    /// block falls back to defaults and is handed back for the caller to log,
    /// since logging is not up yet while the configuration is read.
    pub fn resolve(raw: Option<&str>, origin: &str, port: &str) -> (Self, Option<serde_json::Error>) {
        let (config, rejected) = match raw.map(UiConfig::from_json) {
            Some(Ok(config)) => (config, None),
            Some(Err(e)) => (UiConfig::default(), Some(e)),
            None => (UiConfig::default(), None),
        };
        (config.with_location(origin, port), rejected)
    }

    /// Fill blank location-derived fields
    pub fn with_location(mut self, origin: &str, port: &str) -> Self {
        if self.server_base.trim().is_empty() {
            self.server_base = origin.trim_end_matches('/').to_string();
        }
        if self.port.trim().is_empty() {
            self.port = if port.is_empty() { default_port(origin).to_string() } else { port.to_string() };
        }
        self
    }

    /// Configuration for the running page, plus the parse error of a rejected override block
    pub fn from_environment() -> (Self, Option<serde_json::Error>) {
        let Some(window) = web_sys::window() else {
            return (UiConfig::default(), None);
        };

        let raw = window
            .document()
            .and_then(|doc| doc.get_element_by_id(CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        let location = window.location();
        let origin = location.origin().unwrap_or_default();
        let port = location.port().unwrap_or_default();
        UiConfig::resolve(raw.as_deref(), &origin, &port)
    }

    pub fn level_filter(&self) -> LevelFilter {
        rolling_logger::parse_level(&self.log_level).unwrap_or(LevelFilter::INFO)
    }
}

fn default_port(origin: &str) -> &'static str {
    if origin.starts_with("https:") { "443" } else { "80" }
}
