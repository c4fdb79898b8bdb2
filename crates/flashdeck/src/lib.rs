//! `flashdeck` - Local flashcard decks with JSON, QR and AI-generated imports
//!
//! This library provides the deck store and its persistence, the QR payload
//! codec used to share decks between devices, and the client that asks an
//! AI service to generate a deck about a topic.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod bulk;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod qr;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use generator::{DeckGenerator, GeminiGenerator, GeneratedCard};
pub use logging::init_logging;
pub use model::{Card, Deck, DeckCollection, Theme, FAVORITES_DECK_ID};
pub use qr::QrCodec;
pub use storage::{Persistence, Storage, StorageStats};
pub use store::DeckStore;
