//! Structured tasting and observation notes
//!
//! Taste, visual and aroma notes arrive either as free text or as a set of
//! selected tags. Both shapes are accepted on input and normalized once, so
//! the rest of the engine only ever sees a [`Note`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A free-text note or a set of selected tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Note {
    Text(String),
    Tags(BTreeSet<String>),
}

/// Note as submitted by a client: a plain string or a list of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNote {
    Text(String),
    Tags(Vec<String>),
}

impl Note {
    /// Normalize raw input. Blank text and empty tag lists yield no note.
    pub fn normalize(raw: RawNote) -> Option<Note> {
        match raw {
            RawNote::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Note::Text(trimmed.to_string()))
                }
            }
            RawNote::Tags(tags) => {
                let tags: BTreeSet<String> = tags
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                if tags.is_empty() {
                    None
                } else {
                    Some(Note::Tags(tags))
                }
            }
        }
    }

    /// Normalize an optional raw note
    pub fn from_raw(raw: Option<RawNote>) -> Option<Note> {
        raw.and_then(Note::normalize)
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Note::Text(text) => write!(f, "{}", text),
            Note::Tags(tags) => {
                let joined: Vec<&str> = tags.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_no_note() {
        assert_eq!(Note::normalize(RawNote::Text("   ".to_string())), None);
    }

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(
            Note::normalize(RawNote::Text("  vinegary  ".to_string())),
            Some(Note::Text("vinegary".to_string()))
        );
    }

    #[test]
    fn test_tags_are_trimmed_and_deduplicated() {
        let note = Note::normalize(RawNote::Tags(vec![
            "fruity".to_string(),
            " fruity ".to_string(),
            "yeasty".to_string(),
            "".to_string(),
        ]))
        .unwrap();

        match note {
            Note::Tags(tags) => {
                assert_eq!(tags.len(), 2);
                assert!(tags.contains("fruity"));
                assert!(tags.contains("yeasty"));
            }
            other => panic!("expected tags, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_note_accepts_both_json_shapes() {
        let text: RawNote = serde_json::from_str("\"cloudy\"").unwrap();
        let tags: RawNote = serde_json::from_str("[\"cloudy\", \"pellicle\"]").unwrap();

        assert_eq!(Note::normalize(text), Some(Note::Text("cloudy".to_string())));
        assert!(matches!(Note::normalize(tags), Some(Note::Tags(_))));
    }

    #[test]
    fn test_display_joins_tags() {
        let note = Note::normalize(RawNote::Tags(vec!["tart".to_string(), "fizzy".to_string()]))
            .unwrap();
        assert_eq!(note.to_string(), "fizzy, tart");
    }
}
