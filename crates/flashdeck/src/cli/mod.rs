//! Command-line interface for flashdeck.
//!
//! This module provides the CLI structure for the `flashdeck` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BulkCommand, CardCommand, ConfigCommand, DeckCommand, ExportCommand, FavoritesCommand,
    GenerateCommand, ImportCommand, QrCommand, StatusCommand, ThemeArg, ThemeCommand,
    DEFAULT_EXPORT_FILE,
};

/// flashdeck - Study flashcards from the terminal
///
/// Keeps decks in a local database, shares them as QR payloads and JSON
/// backups, and can ask an AI service to write a deck about any topic.
#[derive(Debug, Parser)]
#[command(name = "flashdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, list, show, rename and delete decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Add cards and toggle their flags
    #[command(subcommand)]
    Card(CardCommand),

    /// Show all favorite cards across decks
    Favorites(FavoritesCommand),

    /// Edit a whole deck as tab-separated text
    #[command(subcommand)]
    Bulk(BulkCommand),

    /// Write all decks to a JSON backup
    Export(ExportCommand),

    /// Replace all decks with a JSON backup
    Import(ImportCommand),

    /// Share decks as QR payloads
    #[command(subcommand)]
    Qr(QrCommand),

    /// Generate a deck about a topic
    Generate(GenerateCommand),

    /// Show or select the color theme
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// Show storage and deck statistics
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
