//! Mention-template resolution.
//!
//! A Generate block's prompt may reference the block immediately before it
//! with mention markup `@[display](id)`. Resolution replaces each mention with
//! the predecessor's value. Matching compares the *display* text against the
//! predecessor's current name; the identifier payload is carried but never
//! used for lookup, so renaming a block breaks templates that mention it.
//!
//! ```
//! use ai_flow_rust::template::resolve;
//! use ai_flow_rust::types::Block;
//!
//! let blocks = vec![
//!     Block::input("seed", "hello"),
//!     Block::generate("writer", "Expand on: @[seed](block-1)"),
//! ];
//! assert_eq!(resolve("Expand on: @[seed](block-1)", &blocks, 1), "Expand on: hello");
//! assert_eq!(resolve("Expand on: @[other](block-1)", &blocks, 1), "Expand on: ");
//! ```

pub mod mention;

pub use mention::{parse_mentions, Mention};

use serde_json::Value;
use tracing::debug;

use crate::types::{Block, BlockKind, BlockResult, FAILURE_MARKER};

/// Why a mention produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The block being resolved is first in the list, or has no block before it.
    NoPredecessor,
    /// The mention names a block other than the immediate predecessor.
    NameMismatch { expected: String, actual: String },
}

/// Result of resolving one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionOutcome {
    /// The predecessor matched; the value may legitimately be empty.
    Resolved(String),
    /// Rendered as the empty string.
    Unresolved(UnresolvedReason),
}

impl MentionOutcome {
    pub fn rendered(&self) -> &str {
        match self {
            MentionOutcome::Resolved(value) => value,
            MentionOutcome::Unresolved(_) => "",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, MentionOutcome::Resolved(_))
    }
}

/// A fully resolved template with per-mention outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    pub mentions: Vec<(Mention, MentionOutcome)>,
}

impl Resolution {
    pub fn unresolved(&self) -> impl Iterator<Item = (&Mention, &UnresolvedReason)> {
        self.mentions.iter().filter_map(|(m, o)| match o {
            MentionOutcome::Unresolved(reason) => Some((m, reason)),
            MentionOutcome::Resolved(_) => None,
        })
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.mentions.iter().all(|(_, o)| o.is_resolved())
    }
}

/// Resolve every mention in `template` against `blocks[current_index - 1]`.
///
/// Unresolved mentions render as the empty string.
pub fn resolve(template: &str, blocks: &[Block], current_index: usize) -> String {
    resolve_detailed(template, blocks, current_index).text
}

/// Like [`resolve`], but keeps the outcome of every mention.
pub fn resolve_detailed(template: &str, blocks: &[Block], current_index: usize) -> Resolution {
    let previous = current_index.checked_sub(1).and_then(|i| blocks.get(i));

    let mentions = parse_mentions(template);
    let mut text = String::with_capacity(template.len());
    let mut cursor = 0;
    let mut outcomes = Vec::with_capacity(mentions.len());

    for mention in mentions {
        let outcome = resolve_mention(&mention, previous);
        if let MentionOutcome::Unresolved(reason) = &outcome {
            debug!(display = %mention.display, ?reason, "mention left unresolved");
        }
        text.push_str(&template[cursor..mention.span.start]);
        text.push_str(outcome.rendered());
        cursor = mention.span.end;
        outcomes.push((mention, outcome));
    }
    text.push_str(&template[cursor..]);

    Resolution {
        text,
        mentions: outcomes,
    }
}

fn resolve_mention(mention: &Mention, previous: Option<&Block>) -> MentionOutcome {
    let Some(prev) = previous else {
        return MentionOutcome::Unresolved(UnresolvedReason::NoPredecessor);
    };
    if prev.name != mention.display {
        return MentionOutcome::Unresolved(UnresolvedReason::NameMismatch {
            expected: mention.display.clone(),
            actual: prev.name.clone(),
        });
    }

    let value = match prev.kind {
        BlockKind::Input => prev.settings.input.clone().unwrap_or_default(),
        BlockKind::Generate => prev.result.as_ref().map(stringify_result).unwrap_or_default(),
    };
    MentionOutcome::Resolved(value)
}

/// String form of a block result as substituted into templates.
pub fn stringify_result(result: &BlockResult) -> String {
    match result {
        BlockResult::Text(text) => text.clone(),
        BlockResult::Structured(Value::Array(items)) => items
            .iter()
            .map(stringify_element)
            .collect::<Vec<_>>()
            .join(", "),
        BlockResult::Structured(value) => stringify_element(value),
        BlockResult::Failed { .. } => FAILURE_MARKER.to_string(),
    }
}

fn stringify_element(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generated(name: &str, value: Value) -> Block {
        Block::generate(name, "").with_result(BlockResult::Structured(value))
    }

    #[test]
    fn test_template_without_mentions_is_unchanged() {
        let blocks = vec![Block::input("a", "x"), Block::generate("b", "")];
        let template = "Plain text with @ signs, [brackets] and (parens).";
        assert_eq!(resolve(template, &blocks, 1), template);
    }

    #[test]
    fn test_first_block_resolves_nothing() {
        let blocks = vec![Block::generate("Generate", "@[Generate](x)")];
        let resolution = resolve_detailed("say @[Generate](x)!", &blocks, 0);
        assert_eq!(resolution.text, "say !");
        assert_eq!(
            resolution.unresolved().next().map(|(_, r)| r.clone()),
            Some(UnresolvedReason::NoPredecessor)
        );
    }

    #[test]
    fn test_input_predecessor_substituted_in_place() {
        let blocks = vec![Block::input("X", "hello"), Block::generate("g", "")];
        assert_eq!(resolve("<@[X](id)>", &blocks, 1), "<hello>");
    }

    #[test]
    fn test_input_without_value_resolves_empty_but_resolved() {
        let mut input = Block::input("X", "");
        input.settings.input = None;
        let blocks = vec![input, Block::generate("g", "")];
        let resolution = resolve_detailed("@[X](id)", &blocks, 1);
        assert_eq!(resolution.text, "");
        assert!(resolution.is_fully_resolved());
    }

    #[test]
    fn test_array_result_joined() {
        let blocks = vec![
            generated("list", json!([{"a": 1}, {"a": 2}])),
            Block::generate("next", ""),
        ];
        assert_eq!(resolve("@[list](id)", &blocks, 1), r#"{"a":1}, {"a":2}"#);
    }

    #[test]
    fn test_object_and_primitive_results() {
        let object = vec![generated("o", json!({"k": "v"})), Block::generate("n", "")];
        assert_eq!(resolve("@[o](1)", &object, 1), r#"{"k":"v"}"#);

        let choice = vec![generated("c", json!("positive")), Block::generate("n", "")];
        assert_eq!(resolve("@[c](1)", &choice, 1), "positive");

        let number = vec![generated("n", json!(3)), Block::generate("m", "")];
        assert_eq!(resolve("@[n](1)", &number, 1), "3");

        let mixed = vec![generated("m", json!(["a", 1, true])), Block::generate("x", "")];
        assert_eq!(resolve("@[m](1)", &mixed, 1), "a, 1, true");
    }

    #[test]
    fn test_text_absent_and_failed_results() {
        let text = vec![
            Block::generate("t", "").with_result(BlockResult::Text("prose".into())),
            Block::generate("n", ""),
        ];
        assert_eq!(resolve("@[t](1)", &text, 1), "prose");

        let absent = vec![Block::generate("t", ""), Block::generate("n", "")];
        assert_eq!(resolve("[@[t](1)]", &absent, 1), "[]");

        let failed = vec![
            Block::generate("t", "").with_result(BlockResult::Failed {
                message: "boom".into(),
            }),
            Block::generate("n", ""),
        ];
        assert_eq!(resolve("@[t](1)", &failed, 1), FAILURE_MARKER);
    }

    #[test]
    fn test_name_mismatch_is_distinguishable() {
        let blocks = vec![Block::input("seed", "hi"), Block::generate("g", "")];
        let resolution = resolve_detailed("a@[Seed](1)b", &blocks, 1);
        assert_eq!(resolution.text, "ab");
        assert_eq!(
            resolution.mentions[0].1,
            MentionOutcome::Unresolved(UnresolvedReason::NameMismatch {
                expected: "Seed".into(),
                actual: "seed".into(),
            })
        );
    }

    #[test]
    fn test_only_immediate_predecessor_is_eligible() {
        let blocks = vec![
            Block::input("first", "one"),
            Block::input("second", "two"),
            Block::generate("third", ""),
        ];
        assert_eq!(resolve("@[first](a)|@[second](b)", &blocks, 2), "|two");
        // Forward references never resolve.
        assert_eq!(resolve("@[third](c)", &blocks, 1), "");
    }

    #[test]
    fn test_identifier_payload_is_ignored() {
        let blocks = vec![Block::input("seed", "v").with_id("block-1"), Block::generate("g", "")];
        assert_eq!(resolve("@[seed](block-999)", &blocks, 1), "v");
    }

    #[test]
    fn test_index_past_the_end() {
        let blocks = vec![Block::input("seed", "v")];
        // A block about to be appended sees the current last block.
        assert_eq!(resolve("@[seed](1)", &blocks, 1), "v");
        assert_eq!(resolve("@[seed](1)", &blocks, 7), "");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let blocks = vec![Block::input("s", "v"), Block::generate("g", "")];
        let template = "@[s](1) and @[s](2) and @[x](3)";
        let first = resolve_detailed(template, &blocks, 1);
        let second = resolve_detailed(template, &blocks, 1);
        assert_eq!(first, second);
        assert_eq!(first.text, "v and v and ");
    }
}
