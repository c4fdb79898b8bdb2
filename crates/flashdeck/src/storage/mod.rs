//! Storage layer for flashdeck.
//!
//! This module provides the [`Persistence`] contract the deck store writes
//! through to, and [`Storage`], its `SQLite`-backed implementation. Only two
//! keys are ever used: the serialized deck collection and the theme name.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{DeckCollection, Theme};

/// Key holding the JSON-serialized deck collection.
pub const DECKS_KEY: &str = "flashcards_v3_react";

/// Key holding the selected theme name.
pub const THEME_KEY: &str = "flashcards_theme";

/// Durable string key-value storage.
///
/// Implementors only provide `get` and `set`; the typed load/save helpers
/// are shared. Loads never fail: missing or unreadable state is treated as
/// "nothing saved yet".
pub trait Persistence {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Load the saved deck collection, or an empty one.
    fn load_collection(&self) -> DeckCollection {
        let raw = match self.get(DECKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return DeckCollection::new(),
            Err(e) => {
                warn!("Failed to read saved decks, starting empty: {e}");
                return DeckCollection::new();
            }
        };

        match serde_json::from_str::<DeckCollection>(&raw) {
            Ok(mut decks) => {
                for deck in decks.values_mut() {
                    deck.cards.iter_mut().for_each(crate::model::Card::clear_origin);
                }
                debug!("Loaded {} decks", decks.len());
                decks
            }
            Err(e) => {
                warn!("Saved decks are not valid JSON, starting empty: {e}");
                DeckCollection::new()
            }
        }
    }

    /// Serialize and store the full deck collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn save_collection(&self, decks: &DeckCollection) -> Result<()> {
        let raw = serde_json::to_string(decks)?;
        self.set(DECKS_KEY, &raw)
    }

    /// Load the saved theme, or the default theme.
    fn load_theme(&self) -> Theme {
        match self.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring saved theme: {e}");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to read saved theme: {e}");
                Theme::default()
            }
        }
    }

    /// Store the theme name.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_theme(&self, theme: Theme) -> Result<()> {
        self.set(THEME_KEY, theme.as_str())
    }
}

/// `SQLite`-backed key-value storage.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Summary of what is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of stored keys.
    pub keys: i64,
    /// Total size of all stored values in bytes.
    pub bytes: i64,
    /// When the deck collection was last written, if ever.
    pub decks_updated_at: Option<String>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (keys, bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let decks_updated_at: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                [DECKS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(StorageStats {
            keys,
            bytes,
            decks_updated_at,
        })
    }
}

impl Persistence for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }
}
