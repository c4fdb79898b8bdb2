//! Tab-separated text format used for editing a whole deck at once.
//!
//! One card per line, `question<TAB>answer`. Blank lines are ignored.
//! Applying edited text matches lines to existing cards by position, so the
//! n-th line keeps the id, comment and flags of the n-th card.

use crate::error::{Error, Result};
use crate::model::Card;

const SEPARATOR: char = '\t';

/// Render cards as bulk text.
///
/// Tabs and newlines inside a field are replaced with spaces so every card
/// stays on its own line.
#[must_use]
pub fn render(cards: &[Card]) -> String {
    let mut out = String::new();
    for card in cards {
        out.push_str(&sanitize(&card.question));
        out.push(SEPARATOR);
        out.push_str(&sanitize(&card.answer));
        out.push('\n');
    }
    out
}

/// Merge edited bulk text into an existing card list.
///
/// Lines beyond the existing cards become new cards; existing cards beyond
/// the last line are dropped.
///
/// # Errors
///
/// Returns a parse error naming the first non-blank line without a tab.
pub fn apply(existing: &[Card], text: &str) -> Result<Vec<Card>> {
    let rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            line.split_once(SEPARATOR)
                .map(|(q, a)| (q.trim().to_string(), a.trim().to_string()))
                .ok_or_else(|| {
                    Error::parse(format!(
                        "line {}: expected question and answer separated by a tab",
                        number + 1
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut cards: Vec<Card> = Vec::with_capacity(rows.len());
    for (index, (question, answer)) in rows.into_iter().enumerate() {
        let card = match existing.get(index) {
            Some(card) => {
                let mut card = card.clone();
                card.question = question;
                card.answer = answer;
                card.clear_origin();
                card
            }
            None => Card::new(question, answer),
        };
        cards.push(card);
    }
    Ok(cards)
}

fn sanitize(field: &str) -> String {
    field.replace(['\t', '\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards() -> Vec<Card> {
        let mut first = Card::new("one", "uno");
        first.mastered = true;
        first.comment = Some("numbers".to_string());
        vec![first, Card::new("two", "dos")]
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&cards()), "one\tuno\ntwo\tdos\n");
    }

    #[test]
    fn test_render_sanitizes_fields() {
        let text = render(&[Card::new("multi\nline", "tab\there")]);
        assert_eq!(text, "multi line\ttab here\n");
    }

    #[test]
    fn test_apply_unchanged_keeps_cards() {
        let original = cards();
        let applied = apply(&original, &render(&original)).unwrap();
        assert_eq!(applied, original);
    }

    #[test]
    fn test_apply_edit_keeps_identity_and_flags() {
        let original = cards();
        let applied = apply(&original, "ONE\tUNO\ntwo\tdos\n").unwrap();

        assert_eq!(applied[0].id, original[0].id);
        assert_eq!(applied[0].question, "ONE");
        assert!(applied[0].mastered);
        assert_eq!(applied[0].comment.as_deref(), Some("numbers"));
    }

    #[test]
    fn test_apply_appends_new_cards() {
        let original = cards();
        let applied = apply(&original, "one\tuno\ntwo\tdos\nthree\ttres\n").unwrap();

        assert_eq!(applied.len(), 3);
        assert!(!applied[2].mastered);
        assert!(original.iter().all(|c| c.id != applied[2].id));
    }

    #[test]
    fn test_apply_removes_trailing_cards() {
        let applied = apply(&cards(), "one\tuno\n").unwrap();
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_apply_skips_blank_lines() {
        let applied = apply(&[], "\n  \na\tb\n\n").unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].question, "a");
    }

    #[test]
    fn test_apply_rejects_line_without_tab() {
        let err = apply(&cards(), "one\tuno\nmissing separator\n").unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("line 2"));
    }
}
