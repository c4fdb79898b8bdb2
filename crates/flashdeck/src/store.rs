//! The deck store: sole owner of all decks, the theme and the open deck.
//!
//! Every successful mutation writes the full collection through to the
//! [`Persistence`] backend. A failed write is logged and otherwise ignored;
//! the in-memory state stays authoritative.
//!
//! Operations on a missing deck or card are no-ops returning `false` (or
//! `None`), unless the store was opened in strict mode, in which case they
//! return [`Error::NotFound`].

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generator::{validate_topic, DeckGenerator, GeneratedCard};
use crate::model::{
    new_deck_id, Card, Deck, DeckCollection, Theme, FAVORITES_DECK_ID, FAVORITES_DECK_NAME,
};
use crate::qr::QrCodec;
use crate::storage::Persistence;

/// Suffix appended to the names of decks imported from a QR payload.
const QR_NAME_SUFFIX: &str = " (QR)";

/// Prefix of the names of generated decks.
const AI_NAME_PREFIX: &str = "AI: ";

/// In-memory deck state with write-through persistence.
#[derive(Debug)]
pub struct DeckStore<P> {
    persistence: P,
    decks: DeckCollection,
    theme: Theme,
    active: Option<String>,
    strict: bool,
    codec: QrCodec,
}

impl<P: Persistence> DeckStore<P> {
    /// Load the saved state from `persistence`.
    ///
    /// Missing or unreadable saved state starts an empty store.
    pub fn open(persistence: P, config: &Config) -> Self {
        let decks = persistence.load_collection();
        let theme = persistence.load_theme();
        info!("Loaded {} decks (theme: {theme})", decks.len());

        Self {
            persistence,
            decks,
            theme,
            active: None,
            strict: config.store.strict,
            codec: QrCodec::new(config.qr.max_payload_len),
        }
    }

    /// The persistence backend.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// All decks, keyed by id.
    pub fn collection(&self) -> &DeckCollection {
        &self.decks
    }

    /// Iterate over all decks in id order.
    pub fn decks(&self) -> impl Iterator<Item = &Deck> {
        self.decks.values()
    }

    /// Look up a deck.
    pub fn deck(&self, id: &str) -> Option<&Deck> {
        self.decks.get(id)
    }

    /// Number of decks.
    pub fn len(&self) -> usize {
        self.decks.len()
    }

    /// Whether there are no decks.
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// A deck as it is shown to the user: the favorites aggregate for
    /// [`FAVORITES_DECK_ID`], otherwise a copy of the stored deck.
    pub fn view(&self, id: &str) -> Option<Deck> {
        if id == FAVORITES_DECK_ID {
            Some(self.favorites_view())
        } else {
            self.decks.get(id).cloned()
        }
    }

    // === Deck lifecycle ===

    /// Create an empty deck and return its id.
    pub fn create_deck(&mut self, name: impl Into<String>) -> String {
        self.insert_deck(name.into(), Vec::new())
    }

    /// Delete a deck. Confirmation is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] in strict mode if the deck does not exist.
    pub fn delete_deck(&mut self, id: &str) -> Result<bool> {
        if self.decks.remove(id).is_none() {
            return self.missing(Error::deck_not_found(id));
        }
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        info!("Deleted deck {id}");
        self.persist();
        Ok(true)
    }

    /// Replace a stored deck wholesale.
    ///
    /// This is an overwrite, not a patch: callers read, modify and write the
    /// whole deck. The stored id is always `id`, and origin stamps are removed
    /// from the cards.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the favorites id or duplicate card ids,
    /// and [`Error::NotFound`] in strict mode if the deck does not exist.
    pub fn update_deck(&mut self, id: &str, mut deck: Deck) -> Result<bool> {
        if id == FAVORITES_DECK_ID {
            return Err(Error::validation("the favorites view cannot be stored"));
        }
        if !self.decks.contains_key(id) {
            return self.missing(Error::deck_not_found(id));
        }

        deck.id = id.to_string();
        deck.cards.iter_mut().for_each(Card::clear_origin);
        deck.check_unique_card_ids()?;

        debug!("Updated deck {id} ({} cards)", deck.cards.len());
        self.decks.insert(id.to_string(), deck);
        self.persist();
        Ok(true)
    }

    /// Rename a deck.
    ///
    /// # Errors
    ///
    /// See [`DeckStore::update_deck`].
    pub fn rename_deck(&mut self, id: &str, name: impl Into<String>) -> Result<bool> {
        let Some(mut deck) = self.decks.get(id).cloned() else {
            return self.missing(Error::deck_not_found(id));
        };
        deck.name = name.into();
        self.update_deck(id, deck)
    }

    /// Append a card to a deck, re-drawing its id if it is already taken.
    ///
    /// # Errors
    ///
    /// See [`DeckStore::update_deck`].
    pub fn add_card(&mut self, deck_id: &str, card: Card) -> Result<bool> {
        let Some(mut deck) = self.decks.get(deck_id).cloned() else {
            return self.missing(Error::deck_not_found(deck_id));
        };
        deck.cards.push(card);
        deck.dedupe_card_ids();
        self.update_deck(deck_id, deck)
    }

    /// Replace all cards of a deck, as saved from the bulk editor.
    ///
    /// # Errors
    ///
    /// See [`DeckStore::update_deck`].
    pub fn replace_cards(&mut self, deck_id: &str, cards: Vec<Card>) -> Result<bool> {
        let Some(mut deck) = self.decks.get(deck_id).cloned() else {
            if deck_id == FAVORITES_DECK_ID {
                return Err(Error::validation("the favorites view cannot be bulk edited"));
            }
            return self.missing(Error::deck_not_found(deck_id));
        };
        deck.cards = cards;
        self.update_deck(deck_id, deck)
    }

    // === Cards and the open deck ===

    /// Make `id` the deck that cards without origin stamps are written to.
    ///
    /// The favorites aggregate can be opened too.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] in strict mode if the deck does not exist.
    pub fn open_deck(&mut self, id: &str) -> Result<bool> {
        if id != FAVORITES_DECK_ID && !self.decks.contains_key(id) {
            return self.missing(Error::deck_not_found(id));
        }
        self.active = Some(id.to_string());
        Ok(true)
    }

    /// Close the open deck.
    pub fn close_deck(&mut self) {
        self.active = None;
    }

    /// The open deck, if any.
    pub fn active_deck(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Write a card back to the deck it belongs to.
    ///
    /// The owning deck is the card's origin stamp if present, otherwise the
    /// open deck. Cards resolving to the favorites aggregate are ignored,
    /// since it is never stored. The card replaces the one with the same id,
    /// keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] in strict mode if the deck or card does
    /// not exist.
    pub fn update_card(&mut self, mut card: Card) -> Result<bool> {
        let Some(deck_id) = card.origin_deck_id.clone().or_else(|| self.active.clone()) else {
            debug!("Ignoring update of card {}: no owning deck", card.id);
            return Ok(false);
        };
        if deck_id == FAVORITES_DECK_ID {
            debug!("Ignoring update of card {} addressed to favorites", card.id);
            return Ok(false);
        }

        let Some(mut deck) = self.decks.get(&deck_id).cloned() else {
            return self.missing(Error::deck_not_found(deck_id));
        };
        let Some(position) = deck.position(&card.id) else {
            return self.missing(Error::card_not_found(card.id));
        };

        card.clear_origin();
        deck.cards[position] = card;
        self.update_deck(&deck_id, deck)
    }

    /// Flip the mastered flag of a card in the open deck. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no deck is open or the id matches cards
    /// from several decks in the favorites view, and
    /// [`Error::NotFound`] in strict mode if the card does not exist.
    pub fn toggle_mastered(&mut self, card_id: &str) -> Result<Option<bool>> {
        self.toggle(card_id, |card| {
            card.mastered = !card.mastered;
            card.mastered
        })
    }

    /// Flip the favorite flag of a card in the open deck. Returns the new value.
    ///
    /// # Errors
    ///
    /// See [`DeckStore::toggle_mastered`].
    pub fn toggle_favorite(&mut self, card_id: &str) -> Result<Option<bool>> {
        self.toggle(card_id, |card| {
            card.favorite = !card.favorite;
            card.favorite
        })
    }

    fn toggle(
        &mut self,
        card_id: &str,
        flip: impl FnOnce(&mut Card) -> bool,
    ) -> Result<Option<bool>> {
        let active = self
            .active
            .clone()
            .ok_or_else(|| Error::validation("no deck is open"))?;
        let Some(view) = self.view(&active) else {
            return self.missing(Error::deck_not_found(active));
        };
        // Card ids are only unique per deck, so the favorites view may hold
        // the same id twice.
        let mut matches = view.cards.iter().filter(|card| card.id == card_id);
        let Some(mut card) = matches.next().cloned() else {
            return self.missing(Error::card_not_found(card_id));
        };
        if matches.next().is_some() {
            return Err(Error::validation(format!(
                "card id '{card_id}' appears in more than one deck; open its own deck instead"
            )));
        }

        let value = flip(&mut card);
        self.update_card(card)?;
        Ok(Some(value))
    }

    /// The synthetic deck of all favorite cards across all decks.
    ///
    /// Cards appear in deck order, then card order, each stamped with the
    /// deck and position it came from. The result is never stored.
    pub fn favorites_view(&self) -> Deck {
        let cards = self
            .decks
            .iter()
            .flat_map(|(deck_id, deck)| {
                deck.cards
                    .iter()
                    .enumerate()
                    .filter(|(_, card)| card.favorite)
                    .map(move |(index, card)| card.clone().with_origin(deck_id.clone(), index))
            })
            .collect();

        Deck {
            id: FAVORITES_DECK_ID.to_string(),
            name: FAVORITES_DECK_NAME.to_string(),
            cards,
            created_at: 0,
        }
    }

    // === Import and export ===

    /// Replace every deck with the collection in `raw` JSON.
    ///
    /// Returns the number of decks imported.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `raw` is not a `{deckId: Deck}` object, a key
    /// differs from its deck's id, or a deck repeats a card id. The current
    /// state is left untouched on error.
    pub fn import_collection(&mut self, raw: &str) -> Result<usize> {
        let mut decks: DeckCollection = serde_json::from_str(raw)
            .map_err(|e| Error::parse(format!("not a deck collection: {e}")))?;

        for (key, deck) in &mut decks {
            if key == FAVORITES_DECK_ID {
                return Err(Error::parse("the favorites view cannot be imported"));
            }
            if *key != deck.id {
                return Err(Error::parse(format!(
                    "deck stored under '{key}' has id '{}'",
                    deck.id
                )));
            }
            deck.check_unique_card_ids()
                .map_err(|e| Error::parse(e.to_string()))?;
            deck.cards.iter_mut().for_each(Card::clear_origin);
        }

        let count = decks.len();
        self.decks = decks;
        if let Some(active) = &self.active {
            if active != FAVORITES_DECK_ID && !self.decks.contains_key(active) {
                self.active = None;
            }
        }
        info!("Imported {count} decks");
        self.persist();
        Ok(count)
    }

    /// Serialize every deck as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_collection(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.decks)?)
    }

    /// Create a deck from a QR payload and return its id.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the payload is invalid; no deck is created.
    pub fn import_qr(&mut self, payload: &str) -> Result<String> {
        let decoded = self.codec.decode(payload)?;
        let name = format!("{}{QR_NAME_SUFFIX}", decoded.name);
        let id = self.insert_deck(name, decoded.cards);
        info!("Imported deck {id} from QR payload");
        Ok(id)
    }

    /// Encode a deck as a QR payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the deck does not exist, or
    /// [`Error::PayloadTooLarge`] if it does not fit in a single code.
    pub fn export_qr(&self, deck_id: &str) -> Result<String> {
        let deck = self
            .view(deck_id)
            .ok_or_else(|| Error::deck_not_found(deck_id))?;
        self.codec.encode(&deck)
    }

    /// Create a deck from generated cards and return its id.
    ///
    /// # Errors
    ///
    /// Returns a generation error if `cards` is empty; no deck is created.
    pub fn import_generated(&mut self, topic: &str, cards: Vec<GeneratedCard>) -> Result<String> {
        if cards.is_empty() {
            return Err(Error::generation("no cards were generated"));
        }
        let cards = cards
            .into_iter()
            .map(|generated| Card::new(generated.question, generated.answer))
            .collect();
        let id = self.insert_deck(format!("{AI_NAME_PREFIX}{}", topic.trim()), cards);
        info!("Created generated deck {id} for '{}'", topic.trim());
        Ok(id)
    }

    /// Generate a deck about `topic` and add it to the store.
    ///
    /// The deck is created only after generation succeeds. Holding `&mut self`
    /// across the call keeps a second generation from starting meanwhile.
    ///
    /// # Errors
    ///
    /// Returns a generation error if the topic is blank or generation fails.
    pub async fn generate_deck<G>(&mut self, generator: &G, topic: &str) -> Result<String>
    where
        G: DeckGenerator + ?Sized,
    {
        let topic = validate_topic(topic)?;
        let cards = generator.generate(topic).await?;
        self.import_generated(topic, cards)
    }

    // === Theme ===

    /// The selected theme.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Select and persist a theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = self.persistence.save_theme(theme) {
            warn!("Failed to save theme: {e}");
        }
    }

    // === Internals ===

    fn insert_deck(&mut self, name: String, cards: Vec<Card>) -> String {
        let id = loop {
            let id = new_deck_id();
            if !self.decks.contains_key(&id) {
                break id;
            }
        };

        let mut deck = Deck::new(id.clone(), name);
        deck.cards = cards;
        deck.cards.iter_mut().for_each(Card::clear_origin);
        deck.dedupe_card_ids();

        info!("Created deck {id} '{}' with {} cards", deck.name, deck.cards.len());
        self.decks.insert(id.clone(), deck);
        self.persist();
        id
    }

    fn missing<T: Default>(&self, err: Error) -> Result<T> {
        if self.strict {
            Err(err)
        } else {
            debug!("Ignoring: {err}");
            Ok(T::default())
        }
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save_collection(&self.decks) {
            warn!("Failed to save decks: {e}");
        }
    }
}
