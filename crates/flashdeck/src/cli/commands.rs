//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::Theme;

/// Default file name for `export`.
pub const DEFAULT_EXPORT_FILE: &str = "flashcards_backup.json";

/// Deck management commands.
#[derive(Debug, Subcommand)]
pub enum DeckCommand {
    /// Create an empty deck
    New {
        /// Deck name
        name: String,
    },

    /// List all decks with card counts
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the cards of a deck (use FAVORITE for the favorites view)
    Show {
        /// Deck id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a deck and all of its cards
    Delete {
        /// Deck id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a deck
    Rename {
        /// Deck id
        id: String,

        /// New name
        name: String,
    },
}

/// Card commands.
#[derive(Debug, Subcommand)]
pub enum CardCommand {
    /// Append a card to a deck
    Add {
        /// Deck id
        deck: String,

        /// Front side
        question: String,

        /// Back side
        answer: String,

        /// Optional note shown with the answer
        #[arg(long)]
        comment: Option<String>,
    },

    /// Toggle the mastered flag of a card
    Mastered {
        /// Deck id (or FAVORITE)
        deck: String,

        /// Card id
        card: String,
    },

    /// Toggle the favorite flag of a card
    Favorite {
        /// Deck id (or FAVORITE)
        deck: String,

        /// Card id
        card: String,
    },
}

/// Tab-separated bulk editing commands.
#[derive(Debug, Subcommand)]
pub enum BulkCommand {
    /// Print a deck as one `question<TAB>answer` line per card
    Export {
        /// Deck id
        deck: String,
    },

    /// Replace a deck's cards with edited bulk text
    Apply {
        /// Deck id
        deck: String,

        /// File holding the edited text (`-` for stdin)
        file: PathBuf,
    },
}

/// QR payload commands.
#[derive(Debug, Subcommand)]
pub enum QrCommand {
    /// Print the QR payload for a deck
    Encode {
        /// Deck id (or FAVORITE)
        deck: String,
    },

    /// Create a deck from a scanned QR payload
    Import {
        /// The payload text
        payload: String,
    },
}

/// Theme commands.
#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Show the selected theme
    Show,

    /// Select a theme
    Set {
        /// Theme name
        #[arg(value_enum)]
        theme: ThemeArg,
    },
}

/// Favorites command arguments.
#[derive(Debug, Args)]
pub struct FavoritesCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file (`-` for stdout)
    #[arg(short, long, default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON file previously written by `export` (`-` for stdin)
    pub file: PathBuf,
}

/// Generate command arguments.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Topic to generate cards about
    pub topic: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Theme argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    /// Indigo
    Default,
    /// Orange and pink
    Sunset,
    /// Cyan and blue
    Ocean,
    /// Emerald and green
    Forest,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Default => Self::Default,
            ThemeArg::Sunset => Self::Sunset,
            ThemeArg::Ocean => Self::Ocean,
            ThemeArg::Forest => Self::Forest,
        }
    }
}
