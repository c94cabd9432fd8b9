//! Summary cleaning: markup to plain text, then a hard length cap.
//!
//! Feed summaries arrive as anything from plain text to full HTML documents
//! with inline scripts. [`clean`] keeps only the visible text, and
//! [`truncate`] makes the result fit a spreadsheet cell.

use scraper::{Html, Node};

/// Default cell ceiling of the tabular sink, in characters.
pub const MAX_CELL: usize = 50_000;

/// Appended when [`truncate`] cuts a string.
pub const ELLIPSIS: char = '…';

/// Elements whose text content is never visible.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract the visible text of an HTML fragment.
///
/// Text nodes are split on whitespace and re-joined with single spaces, so
/// `"<p>A &amp; <b>B</b></p>"` becomes `"A & B"`. Content of `script`,
/// `style`, `noscript` and `template` elements is dropped.
///
/// The HTML5 parser recovers from any input, so this never fails; broken
/// markup simply yields whatever text the parser managed to place.
pub fn clean(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(raw);
    let mut words: Vec<&str> = Vec::new();

    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Cap `text` at `max` characters.
///
/// Text that already fits is returned unchanged. Longer text keeps its first
/// `max - 1` characters and gains a trailing [`ELLIPSIS`], so the result is
/// exactly `max` characters long. That makes the function idempotent.
pub fn truncate(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some(_) => {
            // Byte offset of the first character that no longer fits.
            let cut = text
                .char_indices()
                .nth(max - 1)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let mut out = String::with_capacity(cut + ELLIPSIS.len_utf8());
            out.push_str(&text[..cut]);
            out.push(ELLIPSIS);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_decodes_entities_and_joins_nodes() {
        assert_eq!(clean("<p>A &amp; <b>B</b></p>"), "A & B");
    }

    #[test]
    fn test_clean_plain_text_and_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n\t "), "");
        assert_eq!(clean("just  some\n text"), "just some text");
    }

    #[test]
    fn test_clean_drops_script_and_style() {
        let html = "<div><style>p { color: red }</style>Hello<script>alert('x')</script> world</div>";
        assert_eq!(clean(html), "Hello world");
    }

    #[test]
    fn test_clean_survives_malformed_markup() {
        assert_eq!(clean("<p>unclosed <b>bold <i>italic"), "unclosed bold italic");
        assert_eq!(clean("</div></span>stray closers"), "stray closers");
        assert_eq!(clean("a < b > c"), "a < b > c");

        let deep = format!("{}deep{}", "<div>".repeat(2_000), "</div>".repeat(2_000));
        assert_eq!(clean(&deep), "deep");
    }

    #[test]
    fn test_clean_block_elements_become_spaces() {
        assert_eq!(clean("<p>first</p><p>second</p>"), "first second");
        assert_eq!(clean("line<br>break"), "line break");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_adds_single_ellipsis_within_limit() {
        let out = truncate("abcdefghij", 5);
        assert_eq!(out, "abcd…");
        assert_eq!(out.chars().count(), 5);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "привет мир";
        let out = truncate(text, 4);
        assert_eq!(out, "при…");
        assert_eq!(out.chars().count(), 4);
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let long = "x".repeat(MAX_CELL + 123);
        for input in ["", "short", long.as_str(), "…………", "ab…cd…ef"] {
            for max in [1, 3, 5, MAX_CELL] {
                let once = truncate(input, max);
                assert!(once.chars().count() <= max);
                assert_eq!(truncate(&once, max), once);
            }
        }
    }

    #[test]
    fn test_truncate_zero_limit() {
        assert_eq!(truncate("anything", 0), "");
    }
}
