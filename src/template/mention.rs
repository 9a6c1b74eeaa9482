//! Mention markup parsing: `@[display](identifier)`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

// Display text excludes `]`, identifier excludes `)`; both must be non-empty.
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\[([^\]]+)\]\(([^)]+)\)").expect("valid mention regex"));

/// One mention occurrence inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub display: String,
    pub identifier: String,
    /// Byte range of the whole markup token in the template.
    pub span: Range<usize>,
}

/// All well-formed mentions, in order of appearance.
pub fn parse_mentions(template: &str) -> Vec<Mention> {
    MENTION
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Mention {
                display: caps.get(1)?.as_str().to_string(),
                identifier: caps.get(2)?.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_display_and_identifier() {
        let mentions = parse_mentions("Use @[Blog Idea](block-17) here");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].display, "Blog Idea");
        assert_eq!(mentions[0].identifier, "block-17");
        assert_eq!(mentions[0].span, 4..26);
    }

    #[test]
    fn test_malformed_markup_is_not_matched() {
        for template in [
            "@[unclosed(block-1)",
            "@[name](unclosed",
            "@[](id)",
            "@[name]()",
            "[name](id)",
            "@ [name](id)",
        ] {
            assert!(parse_mentions(template).is_empty(), "{template}");
        }
    }

    #[test]
    fn test_multiple_mentions_in_order() {
        let mentions = parse_mentions("@[a](1)@[b](2) @[a](3)");
        let displays: Vec<&str> = mentions.iter().map(|m| m.display.as_str()).collect();
        assert_eq!(displays, vec!["a", "b", "a"]);
        assert_eq!(mentions[1].span, 7..14);
    }
}
