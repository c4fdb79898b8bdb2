//! Compact deck encoding for sharing through QR codes.
//!
//! A deck is flattened to `<name>::<q1>|<a1>~<q2>|<a2>...` and compressed into
//! a URL-safe string. The delimiters are not escaped: text containing `|`, `~`
//! or `::` does not survive a round trip. Codes produced by earlier versions
//! use exactly this layout, so it is kept as is.
//!
//! Decoding splits at the first `::` and at the first `|` of each row, so
//! answers may contain `|`, but a deck name containing `::` is ambiguous.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Card, Deck};

/// Separates the deck name from the card block.
pub const NAME_DELIMITER: &str = "::";

/// Separates cards.
pub const CARD_DELIMITER: char = '~';

/// Separates question from answer.
pub const FIELD_DELIMITER: char = '|';

/// Reversible compression into a URL-safe string.
pub trait Compressor {
    /// Compress `input`.
    fn compress(&self, input: &str) -> String;

    /// Reverse [`Compressor::compress`]. Returns `None` for invalid input.
    fn decompress(&self, input: &str) -> Option<String>;
}

/// LZ-String "encoded URI component" compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzString;

impl Compressor for LzString {
    fn compress(&self, input: &str) -> String {
        lz_str::compress_to_encoded_uri_component(input)
    }

    fn decompress(&self, input: &str) -> Option<String> {
        let wide = lz_str::decompress_from_encoded_uri_component(input)?;
        String::from_utf16(&wide).ok()
    }
}

/// A deck recovered from a QR payload, before it is added to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDeck {
    /// Name as it was encoded.
    pub name: String,
    /// Cards with fresh ids and cleared flags.
    pub cards: Vec<Card>,
}

/// Encodes and decodes QR deck payloads.
#[derive(Debug, Clone)]
pub struct QrCodec<C = LzString> {
    compressor: C,
    max_payload_len: usize,
}

impl QrCodec<LzString> {
    /// Create a codec using LZ-String compression.
    #[must_use]
    pub fn new(max_payload_len: usize) -> Self {
        Self::with_compressor(LzString, max_payload_len)
    }
}

impl Default for QrCodec<LzString> {
    fn default() -> Self {
        Self::new(crate::config::QrConfig::default().max_payload_len)
    }
}

impl<C: Compressor> QrCodec<C> {
    /// Create a codec with a custom compressor.
    pub fn with_compressor(compressor: C, max_payload_len: usize) -> Self {
        Self {
            compressor,
            max_payload_len,
        }
    }

    /// Encode a deck into a compressed payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the compressed payload exceeds
    /// the configured limit.
    pub fn encode(&self, deck: &Deck) -> Result<String> {
        let plain = flatten(deck);
        let payload = self.compressor.compress(&plain);
        debug!(
            "Encoded deck '{}' ({} cards) into {} characters",
            deck.name,
            deck.cards.len(),
            payload.len()
        );

        if payload.len() > self.max_payload_len {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                limit: self.max_payload_len,
            });
        }
        Ok(payload)
    }

    /// Decode a compressed payload.
    ///
    /// # Errors
    ///
    /// Returns a decode error if decompression fails or the text does not
    /// have the expected layout. No cards are returned on error.
    pub fn decode(&self, payload: &str) -> Result<DecodedDeck> {
        let plain = self
            .compressor
            .decompress(payload.trim())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::decode("payload could not be decompressed"))?;
        parse(&plain)
    }
}

/// Flatten a deck into the uncompressed payload text.
#[must_use]
pub fn flatten(deck: &Deck) -> String {
    if contains_delimiter(&deck.name) {
        warn!(
            "Deck name '{}' contains a reserved delimiter and will not decode cleanly",
            deck.name
        );
    }

    let rows: Vec<String> = deck
        .cards
        .iter()
        .map(|card| {
            if contains_delimiter(&card.question) || contains_delimiter(&card.answer) {
                warn!(
                    "Card {} contains a reserved delimiter and will not decode cleanly",
                    card.id
                );
            }
            format!("{}{FIELD_DELIMITER}{}", card.question, card.answer)
        })
        .collect();

    format!(
        "{}{NAME_DELIMITER}{}",
        deck.name,
        rows.join(&CARD_DELIMITER.to_string())
    )
}

/// Parse uncompressed payload text.
///
/// # Errors
///
/// Returns a decode error if the name delimiter is missing or any row lacks
/// a question/answer separator.
pub fn parse(plain: &str) -> Result<DecodedDeck> {
    let (name, block) = plain
        .split_once(NAME_DELIMITER)
        .ok_or_else(|| Error::decode("missing deck name separator"))?;

    let cards = if block.is_empty() {
        Vec::new()
    } else {
        block
            .split(CARD_DELIMITER)
            .enumerate()
            .map(|(index, row)| {
                row.split_once(FIELD_DELIMITER)
                    .map(|(question, answer)| Card::new(question, answer))
                    .ok_or_else(|| {
                        Error::decode(format!(
                            "card {} has no question/answer separator",
                            index + 1
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(DecodedDeck {
        name: name.to_string(),
        cards,
    })
}

fn contains_delimiter(text: &str) -> bool {
    text.contains(NAME_DELIMITER) || text.contains(CARD_DELIMITER) || text.contains(FIELD_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(name: &str, pairs: &[(&str, &str)]) -> Deck {
        let mut deck = Deck::new("d", name);
        deck.cards = pairs.iter().map(|(q, a)| Card::new(*q, *a)).collect();
        deck
    }

    fn codec() -> QrCodec {
        QrCodec::default()
    }

    fn pairs(cards: &[Card]) -> Vec<(String, String)> {
        cards
            .iter()
            .map(|c| (c.question.clone(), c.answer.clone()))
            .collect()
    }

    #[test]
    fn test_flatten_layout() {
        let d = deck("Capitals", &[("France", "Paris"), ("Japan", "Tokyo")]);
        assert_eq!(flatten(&d), "Capitals::France|Paris~Japan|Tokyo");
    }

    #[test]
    fn test_flatten_empty_deck() {
        assert_eq!(flatten(&deck("Empty", &[])), "Empty::");
    }

    #[test]
    fn test_roundtrip_preserves_name_and_pairs() {
        let codec = codec();
        let d = deck(
            "日本語 単語",
            &[("犬", "dog"), ("猫", "cat"), ("What is 2+2?", "4 (four)")],
        );

        let payload = codec.encode(&d).unwrap();
        let decoded = codec.decode(&payload).unwrap();

        assert_eq!(decoded.name, d.name);
        assert_eq!(pairs(&decoded.cards), pairs(&d.cards));
    }

    #[test]
    fn test_decoded_cards_are_fresh() {
        let codec = codec();
        let mut d = deck("Flags", &[("q", "a")]);
        d.cards[0].mastered = true;
        d.cards[0].favorite = true;

        let decoded = codec.decode(&codec.encode(&d).unwrap()).unwrap();
        let card = &decoded.cards[0];
        assert!(!card.mastered);
        assert!(!card.favorite);
        assert_ne!(card.id, d.cards[0].id);
    }

    #[test]
    fn test_payload_is_url_safe() {
        let codec = codec();
        let payload = codec
            .encode(&deck("Symbols & spaces", &[("a b", "c/d?e=f")]))
            .unwrap();

        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-$".contains(c)));
    }

    #[test]
    fn test_decode_empty_payload_fails() {
        let codec = codec();
        assert!(codec.decode("").unwrap_err().is_decode_error());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let codec = codec();
        let err = codec.decode("!!!not a payload!!!").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_parse_missing_name_separator() {
        let err = parse("just some text").unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn test_parse_rejects_malformed_row() {
        let err = parse("Deck::q1|a1~broken~q3|a3").unwrap_err();
        assert!(err.is_decode_error());
        assert!(err.to_string().contains("card 2"));
    }

    #[test]
    fn test_parse_empty_block_has_no_cards() {
        let decoded = parse("Empty::").unwrap();
        assert_eq!(decoded.name, "Empty");
        assert!(decoded.cards.is_empty());
    }

    #[test]
    fn test_parse_keeps_extra_field_delimiters_in_answer() {
        let decoded = parse("Deck::q|a|b").unwrap();
        assert_eq!(decoded.cards[0].answer, "a|b");
    }

    #[test]
    fn test_name_with_separator_is_split_at_first() {
        let decoded = parse("A::B::q|a").unwrap();
        assert_eq!(decoded.name, "A");
        assert_eq!(decoded.cards.len(), 1);
        assert_eq!(decoded.cards[0].question, "B::q");
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let codec = QrCodec::new(16);
        let d = deck("Long", &[("a long question text", "a long answer text")]);

        let err = codec.encode(&d).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 16, .. }));
    }

    #[derive(Debug)]
    struct Identity;

    impl Compressor for Identity {
        fn compress(&self, input: &str) -> String {
            input.to_string()
        }

        fn decompress(&self, input: &str) -> Option<String> {
            Some(input.to_string())
        }
    }

    #[test]
    fn test_custom_compressor() {
        let codec = QrCodec::with_compressor(Identity, 1000);
        let payload = codec.encode(&deck("Plain", &[("q", "a")])).unwrap();

        assert_eq!(payload, "Plain::q|a");
        assert_eq!(codec.decode(&payload).unwrap().name, "Plain");
    }
}
