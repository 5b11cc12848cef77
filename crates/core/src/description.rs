//! Product description sectioning.
//!
//! Toy descriptions written by the merchandising team embed two optional
//! section markers in free text:
//!
//! ```text
//! A chunky wooden stacker for little hands.
//! Cool things mastered with this: colour sorting, stacking; fine motor skills
//! How to Play: Stack the rings from biggest to smallest.
//! ```
//!
//! [`ProductDescription::parse`] splits such text into an intro, a list of
//! "cool things" and a raw "how to play" paragraph. The markers may appear in
//! either order, or not at all.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static COOL_THINGS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cool\s+things\s+mastered\s+with\s+this\s*:")
        .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
});

static HOW_TO_PLAY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)how\s+to\s+play\s*:")
        .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
});

/// Characters that separate entries of the "cool things" list.
const TOKEN_SEPARATORS: &[char] = &['\n', ',', ';', '•', '-'];

/// A product description split into its sections.
///
/// Absent sections are `None` (serialized as `null`), never an empty string
/// or empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescription {
    /// Text before the first marker, trimmed. Always present, possibly empty.
    pub intro: String,
    /// Entries of the "Cool things mastered with this:" section.
    pub cool_things: Option<Vec<String>>,
    /// Raw text of the "How to Play:" section, trimmed.
    pub how_to_play: Option<String>,
}

impl ProductDescription {
    /// Split a description into intro, cool things and how to play.
    ///
    /// Markers are matched case-insensitively. Whichever marker appears first
    /// ends the intro; its section runs up to the other marker when that one
    /// follows, and the last marker's section runs to the end of the text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let cool = COOL_THINGS_MARKER.find(text).map(|m| m.range());
        let how = HOW_TO_PLAY_MARKER.find(text).map(|m| m.range());

        let (intro_end, cool_body, how_body) = match (cool, how) {
            (None, None) => (text.len(), None, None),
            (Some(c), None) => (c.start, Some(c.end..text.len()), None),
            (None, Some(h)) => (h.start, None, Some(h.end..text.len())),
            (Some(c), Some(h)) if c.start < h.start => (
                c.start,
                Some(c.end..h.start),
                Some(h.end..text.len()),
            ),
            (Some(c), Some(h)) => (
                h.start,
                Some(c.end..text.len()),
                Some(h.end..c.start),
            ),
        };

        Self {
            intro: section(text, 0..intro_end).trim().to_owned(),
            cool_things: cool_body.map(|range| split_tokens(section(text, range))),
            how_to_play: how_body.map(|range| section(text, range).trim().to_owned()),
        }
    }
}

fn section(text: &str, range: Range<usize>) -> &str {
    text.get(range).unwrap_or_default()
}

fn split_tokens(body: &str) -> Vec<String> {
    body.split(TOKEN_SEPARATORS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers() {
        let parsed = ProductDescription::parse("  Just a lovely plush bunny.  ");
        assert_eq!(parsed.intro, "Just a lovely plush bunny.");
        assert_eq!(parsed.cool_things, None);
        assert_eq!(parsed.how_to_play, None);
    }

    #[test]
    fn test_empty_input() {
        let parsed = ProductDescription::parse("");
        assert_eq!(parsed, ProductDescription::default());
    }

    #[test]
    fn test_only_how_to_play() {
        let parsed =
            ProductDescription::parse("A magnetic fishing set. \nHow to Play: Catch every fish!");
        assert_eq!(parsed.intro, "A magnetic fishing set.");
        assert_eq!(parsed.cool_things, None);
        assert_eq!(parsed.how_to_play.as_deref(), Some("Catch every fish!"));
    }

    #[test]
    fn test_only_cool_things() {
        let parsed = ProductDescription::parse(
            "Shape sorter.\nCool things mastered with this:\n• Shapes\n• Colours\n- Patience",
        );
        assert_eq!(parsed.intro, "Shape sorter.");
        assert_eq!(
            parsed.cool_things,
            Some(vec![
                "Shapes".to_owned(),
                "Colours".to_owned(),
                "Patience".to_owned()
            ])
        );
        assert_eq!(parsed.how_to_play, None);
    }

    #[test]
    fn test_both_markers_in_order() {
        let text = "Wooden stacker. Cool things mastered with this: sorting, stacking; \
                    counting How to Play: Stack the rings.";
        let parsed = ProductDescription::parse(text);
        assert_eq!(parsed.intro, "Wooden stacker.");
        assert_eq!(
            parsed.cool_things,
            Some(vec![
                "sorting".to_owned(),
                "stacking".to_owned(),
                "counting".to_owned()
            ])
        );
        assert_eq!(parsed.how_to_play.as_deref(), Some("Stack the rings."));
    }

    #[test]
    fn test_markers_out_of_order() {
        let text = "Puzzle mat.\nHow to Play: Match each piece.\n\
                    Cool things mastered with this: logic, memory";
        let parsed = ProductDescription::parse(text);
        assert_eq!(parsed.intro, "Puzzle mat.");
        assert_eq!(parsed.how_to_play.as_deref(), Some("Match each piece."));
        assert_eq!(
            parsed.cool_things,
            Some(vec!["logic".to_owned(), "memory".to_owned()])
        );
    }

    #[test]
    fn test_markers_case_insensitive() {
        let parsed = ProductDescription::parse(
            "Intro COOL THINGS MASTERED WITH THIS: focus how to play: roll it",
        );
        assert_eq!(parsed.intro, "Intro");
        assert_eq!(parsed.cool_things, Some(vec!["focus".to_owned()]));
        assert_eq!(parsed.how_to_play.as_deref(), Some("roll it"));
    }

    #[test]
    fn test_marker_at_start_gives_empty_intro() {
        let parsed = ProductDescription::parse("How to Play: Just build.");
        assert_eq!(parsed.intro, "");
        assert_eq!(parsed.how_to_play.as_deref(), Some("Just build."));
    }

    #[test]
    fn test_empty_cool_things_section_is_present_but_empty() {
        let parsed = ProductDescription::parse("Intro Cool things mastered with this: , ; -");
        assert_eq!(parsed.cool_things, Some(Vec::new()));
    }

    #[test]
    fn test_serializes_absent_sections_as_null() {
        let json = serde_json::to_value(ProductDescription::parse("Plain text")).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({"intro": "Plain text", "coolThings": null, "howToPlay": null})
        );
    }
}
