//! Core deck and card types for flashdeck.
//!
//! The JSON field names match the format written by earlier versions of the
//! app, so exported backups and stored collections stay interchangeable.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Id of the synthetic deck aggregating favorite cards across all decks.
pub const FAVORITES_DECK_ID: &str = "FAVORITE";

/// Display name of the favorites aggregate.
pub const FAVORITES_DECK_NAME: &str = "Favorites";

/// Length of a freshly generated card id.
const CARD_ID_LEN: usize = 9;

/// Length of the random suffix appended to deck ids.
const DECK_ID_SUFFIX_LEN: usize = 6;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// All decks, keyed by deck id.
pub type DeckCollection = BTreeMap<String, Deck>;

/// A single question/answer study card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique within the owning deck; stable for the card's lifetime.
    pub id: String,

    /// Front side.
    #[serde(default)]
    pub question: String,

    /// Back side. Older QR imports stored cards without one.
    #[serde(default)]
    pub answer: String,

    /// Optional free-form note shown with the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Whether the user has marked this card as learned.
    #[serde(default)]
    pub mastered: bool,

    /// Whether the card shows up in the favorites aggregate.
    #[serde(default)]
    pub favorite: bool,

    /// Owning deck, set only on cards surfaced through the favorites view.
    #[serde(
        rename = "_originDeckId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_deck_id: Option<String>,

    /// Position in the owning deck, set alongside `origin_deck_id`.
    #[serde(
        rename = "_originIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_index: Option<usize>,
}

impl Card {
    /// Create a fresh, unflagged card with a random id.
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: new_card_id(),
            question: question.into(),
            answer: answer.into(),
            comment: None,
            mastered: false,
            favorite: false,
            origin_deck_id: None,
            origin_index: None,
        }
    }

    /// Attach a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Stamp the card with the deck and position it really belongs to.
    #[must_use]
    pub fn with_origin(mut self, deck_id: impl Into<String>, index: usize) -> Self {
        self.origin_deck_id = Some(deck_id.into());
        self.origin_index = Some(index);
        self
    }

    /// Remove origin stamps so the card can be stored in its own deck.
    pub fn clear_origin(&mut self) {
        self.origin_deck_id = None;
        self.origin_index = None;
    }

    /// Whether this card carries origin stamps.
    #[must_use]
    pub fn has_origin(&self) -> bool {
        self.origin_deck_id.is_some()
    }
}

/// A named, ordered collection of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Unique key of the deck within the collection.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Cards in study order.
    #[serde(default)]
    pub cards: Vec<Card>,

    /// Creation time in Unix milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Deck {
    /// Create an empty deck with the given id, stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cards: Vec::new(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Whether this is the synthetic favorites aggregate.
    #[must_use]
    pub fn is_favorites(&self) -> bool {
        self.id == FAVORITES_DECK_ID
    }

    /// Find a card by id.
    #[must_use]
    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    /// Position of a card by id.
    #[must_use]
    pub fn position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }

    /// Summary counts for progress display.
    #[must_use]
    pub fn stats(&self) -> DeckStats {
        DeckStats {
            total: self.cards.len(),
            mastered: self.cards.iter().filter(|c| c.mastered).count(),
            favorite: self.cards.iter().filter(|c| c.favorite).count(),
        }
    }

    /// Check that card ids are unique within the deck.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first duplicated id.
    pub fn check_unique_card_ids(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.cards.len());
        for card in &self.cards {
            if !seen.insert(card.id.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate card id '{}' in deck '{}'",
                    card.id, self.id
                )));
            }
        }
        Ok(())
    }

    /// Give every card a unique id, re-drawing any id already taken.
    pub fn dedupe_card_ids(&mut self) {
        let mut seen = std::collections::HashSet::with_capacity(self.cards.len());
        for card in &mut self.cards {
            while card.id.is_empty() || !seen.insert(card.id.clone()) {
                card.id = new_card_id();
            }
        }
    }
}

/// Card counts for a single deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeckStats {
    /// Number of cards.
    pub total: usize,
    /// Cards marked as mastered.
    pub mastered: usize,
    /// Cards marked as favorite.
    pub favorite: usize,
}

/// Visual theme of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Indigo to purple.
    #[default]
    Default,
    /// Pink gradient.
    Sunset,
    /// Blue to cyan.
    Ocean,
    /// Greens.
    Forest,
}

impl Theme {
    /// Every theme, in picker order.
    pub const ALL: [Theme; 4] = [Self::Default, Self::Sunset, Self::Ocean, Self::Forest];

    /// The stored name of this theme.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Sunset => "sunset",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s.trim())
            .ok_or_else(|| Error::parse(format!("unknown theme '{s}'")))
    }
}

/// Generate a random base-36 string of the given length.
fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// Generate a fresh card id.
#[must_use]
pub fn new_card_id() -> String {
    random_base36(CARD_ID_LEN)
}

/// Generate a deck id from the current time plus a random suffix.
///
/// Uniqueness within a collection is enforced by the store, which re-draws
/// on collision.
#[must_use]
pub fn new_deck_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        random_base36(DECK_ID_SUFFIX_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_new() {
        let card = Card::new("What is 2+2?", "4");

        assert_eq!(card.id.len(), CARD_ID_LEN);
        assert_eq!(card.question, "What is 2+2?");
        assert_eq!(card.answer, "4");
        assert!(!card.mastered);
        assert!(!card.favorite);
        assert!(!card.has_origin());
    }

    #[test]
    fn test_card_ids_are_base36() {
        let id = new_card_id();
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_deck_ids_differ() {
        let a = new_deck_id();
        let b = new_deck_id();
        assert_ne!(a, b);
        assert!(a.contains('-'));
    }

    #[test]
    fn test_card_origin_roundtrip() {
        let mut card = Card::new("q", "a").with_origin("deck-1", 3);
        assert_eq!(card.origin_deck_id.as_deref(), Some("deck-1"));
        assert_eq!(card.origin_index, Some(3));

        card.clear_origin();
        assert!(!card.has_origin());
        assert!(card.origin_index.is_none());
    }

    #[test]
    fn test_card_json_field_names() {
        let card = Card::new("q", "a").with_comment("note").with_origin("d", 0);
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["comment"], "note");
        assert_eq!(json["_originDeckId"], "d");
        assert_eq!(json["_originIndex"], 0);
    }

    #[test]
    fn test_card_json_omits_absent_fields() {
        let card = Card::new("q", "a");
        let json = serde_json::to_string(&card).unwrap();

        assert!(!json.contains("comment"));
        assert!(!json.contains("_origin"));
    }

    #[test]
    fn test_deck_parses_legacy_json() {
        let json = r#"{
            "id": "1718000000000",
            "name": "Biology",
            "createdAt": 1718000000000,
            "cards": [
                {"id": "abc123xyz", "question": "Cell?", "answer": "Unit of life",
                 "mastered": true, "favorite": false}
            ]
        }"#;
        let deck: Deck = serde_json::from_str(json).unwrap();

        assert_eq!(deck.name, "Biology");
        assert_eq!(deck.created_at, 1_718_000_000_000);
        assert_eq!(deck.cards.len(), 1);
        assert!(deck.cards[0].mastered);
        assert!(deck.cards[0].comment.is_none());
    }

    #[test]
    fn test_card_missing_text_fields_default_to_empty() {
        let json = r#"{"id": "abc123xyz", "question": "", "mastered": false, "favorite": false}"#;
        let card: Card = serde_json::from_str(json).unwrap();

        assert_eq!(card.question, "");
        assert_eq!(card.answer, "");
    }

    #[test]
    fn test_deck_stats() {
        let mut deck = Deck::new("d", "Deck");
        let mut mastered = Card::new("q1", "a1");
        mastered.mastered = true;
        let mut fav = Card::new("q2", "a2");
        fav.favorite = true;
        deck.cards = vec![mastered, fav, Card::new("q3", "a3")];

        let stats = deck.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.favorite, 1);
    }

    #[test]
    fn test_check_unique_card_ids() {
        let mut deck = Deck::new("d", "Deck");
        let card = Card::new("q", "a");
        deck.cards = vec![card.clone(), card];

        let err = deck.check_unique_card_ids().unwrap_err();
        assert!(err.to_string().contains("duplicate card id"));
    }

    #[test]
    fn test_dedupe_card_ids() {
        let mut deck = Deck::new("d", "Deck");
        let card = Card::new("q", "a");
        let mut blank = Card::new("q2", "a2");
        blank.id = String::new();
        deck.cards = vec![card.clone(), card, blank];

        deck.dedupe_card_ids();
        assert!(deck.check_unique_card_ids().is_ok());
        assert!(deck.cards.iter().all(|c| !c.id.is_empty()));
    }

    #[test]
    fn test_card_lookup() {
        let mut deck = Deck::new("d", "Deck");
        let card = Card::new("q", "a");
        let id = card.id.clone();
        deck.cards.push(card);

        assert_eq!(deck.position(&id), Some(0));
        assert!(deck.card(&id).is_some());
        assert!(deck.card("missing").is_none());
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("ocean".parse::<Theme>().unwrap(), Theme::Ocean);
        assert_eq!(" forest ".parse::<Theme>().unwrap(), Theme::Forest);
        assert!("neon".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_display_matches_serde() {
        for theme in Theme::ALL {
            let json = serde_json::to_string(&theme).unwrap();
            assert_eq!(json, format!("\"{theme}\""));
        }
    }

    #[test]
    fn test_favorites_deck_detection() {
        assert!(Deck::new(FAVORITES_DECK_ID, FAVORITES_DECK_NAME).is_favorites());
        assert!(!Deck::new("1", "Other").is_favorites());
    }
}
