//! Extraction of JSON payloads from raw model text.
//!
//! Strict-schema providers usually return bare JSON, but models routinely wrap
//! it in markdown fences or surround it with prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence regex"));
static BRACED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object regex"));
static BRACKETED_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array regex"));

/// Structured payload parsed out of a text response.
#[derive(Debug, Clone)]
pub struct StructuredOutput {
    /// Raw response content
    pub raw: String,
    /// Parsed JSON (None if nothing parseable was found)
    pub parsed: Option<Value>,
}

impl StructuredOutput {
    pub fn from_response(content: impl Into<String>) -> Self {
        let raw = content.into();
        let parsed = parse_json(raw.trim());
        Self { raw, parsed }
    }

    pub fn parsed(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    pub fn into_parsed(self) -> Option<Value> {
        self.parsed
    }
}

/// Parse JSON from text: bare JSON first, then a fenced block, then the widest object or array.
fn parse_json(text: &str) -> Option<Value> {
    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
        return Some(parsed);
    }

    if let Some(inner) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        if let Ok(parsed) = serde_json::from_str::<Value>(inner.as_str().trim()) {
            return Some(parsed);
        }
    }

    [&*BRACED_OBJECT, &*BRACKETED_ARRAY].iter().find_map(|re| {
        re.find(text)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
    })
}
