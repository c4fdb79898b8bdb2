//! `flashdeck` - CLI for flashcard decks
//!
//! This binary provides the command-line interface for creating, studying,
//! sharing and generating flashcard decks.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tracing::warn;

use flashdeck::cli::{
    BulkCommand, CardCommand, Cli, Command, ConfigCommand, DeckCommand, QrCommand, ThemeCommand,
};
use flashdeck::model::DeckStats;
use flashdeck::{
    bulk, init_logging, Card, Config, Deck, DeckStore, GeminiGenerator, Storage, Theme,
    FAVORITES_DECK_ID,
};

type Store = DeckStore<Storage>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Commands that don't need the deck store
    let command = match cli.command {
        Command::Config(cmd) => return handle_config(&config, cmd),
        other => other,
    };

    let storage = Storage::open(config.database_path())?;
    let mut store = DeckStore::open(storage, &config);

    match command {
        Command::Deck(cmd) => handle_deck(&mut store, cmd),
        Command::Card(cmd) => handle_card(&mut store, cmd),
        Command::Favorites(cmd) => show_deck(&store, FAVORITES_DECK_ID, cmd.json),
        Command::Bulk(cmd) => handle_bulk(&mut store, cmd),
        Command::Export(cmd) => handle_export(&store, &cmd.output),
        Command::Import(cmd) => handle_import(&mut store, &cmd.file),
        Command::Qr(cmd) => handle_qr(&mut store, cmd),
        Command::Generate(cmd) => handle_generate(&mut store, &config, &cmd.topic).await,
        Command::Theme(cmd) => {
            handle_theme(&mut store, cmd);
            Ok(())
        }
        Command::Status(cmd) => handle_status(&store, &config, cmd.json),
        // Handled before the store is opened
        Command::Config(_) => Ok(()),
    }
}

fn handle_deck(store: &mut Store, cmd: DeckCommand) -> anyhow::Result<()> {
    match cmd {
        DeckCommand::New { name } => {
            let id = store.create_deck(name);
            println!("{id}");
        }
        DeckCommand::List { json } => {
            if json {
                let decks: Vec<_> = store
                    .decks()
                    .map(|deck| {
                        serde_json::json!({
                            "id": deck.id,
                            "name": deck.name,
                            "createdAt": deck.created_at,
                            "stats": deck.stats(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&decks)?);
            } else if store.is_empty() {
                println!("No decks yet. Create one with `flashdeck deck new <name>`.");
            } else {
                for deck in store.decks() {
                    println!("{:<24} {}  ({})", deck.id, deck.name, progress(deck.stats()));
                }
            }
        }
        DeckCommand::Show { id, json } => show_deck(store, &id, json)?,
        DeckCommand::Delete { id, yes } => {
            let deck = require_deck(store, &id)?;
            if yes {
                store.delete_deck(&id)?;
                println!("Deleted deck '{}'.", deck.name);
            } else {
                println!(
                    "This will delete deck '{}' and its {} cards.",
                    deck.name,
                    deck.cards.len()
                );
                println!("Use --yes to confirm.");
            }
        }
        DeckCommand::Rename { id, name } => {
            require_deck(store, &id)?;
            store.rename_deck(&id, name)?;
        }
    }
    Ok(())
}

fn handle_card(store: &mut Store, cmd: CardCommand) -> anyhow::Result<()> {
    match cmd {
        CardCommand::Add {
            deck,
            question,
            answer,
            comment,
        } => {
            require_deck(store, &deck)?;
            let mut card = Card::new(question, answer);
            card.comment = comment;
            let card_id = card.id.clone();
            store.add_card(&deck, card)?;
            println!("{card_id}");
        }
        CardCommand::Mastered { deck, card } => {
            open(store, &deck)?;
            let value = store
                .toggle_mastered(&card)?
                .ok_or_else(|| anyhow!("card not found: {card}"))?;
            println!("{card}: {}", if value { "mastered" } else { "not mastered" });
        }
        CardCommand::Favorite { deck, card } => {
            open(store, &deck)?;
            let value = store
                .toggle_favorite(&card)?
                .ok_or_else(|| anyhow!("card not found: {card}"))?;
            println!("{card}: {}", if value { "favorite" } else { "not favorite" });
        }
    }
    Ok(())
}

fn handle_bulk(store: &mut Store, cmd: BulkCommand) -> anyhow::Result<()> {
    match cmd {
        BulkCommand::Export { deck } => {
            let deck = require_deck(store, &deck)?;
            print!("{}", bulk::render(&deck.cards));
        }
        BulkCommand::Apply { deck, file } => {
            let existing = require_deck(store, &deck)?;
            let text = read_input(&file)?;
            let cards = bulk::apply(&existing.cards, &text)?;
            let count = cards.len();
            store.replace_cards(&deck, cards)?;
            println!("Saved {count} cards to '{}'.", existing.name);
        }
    }
    Ok(())
}

fn handle_export(store: &Store, output: &Path) -> anyhow::Result<()> {
    let json = store.export_collection()?;
    if output == Path::new("-") {
        println!("{json}");
    } else {
        std::fs::write(output, json)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Exported {} decks to {}", store.len(), output.display());
    }
    Ok(())
}

fn handle_import(store: &mut Store, file: &Path) -> anyhow::Result<()> {
    let raw = read_input(file)?;
    let count = store
        .import_collection(&raw)
        .with_context(|| format!("{} is not a valid backup", file.display()))?;
    println!("Imported {count} decks.");
    Ok(())
}

fn handle_qr(store: &mut Store, cmd: QrCommand) -> anyhow::Result<()> {
    match cmd {
        QrCommand::Encode { deck } => {
            println!("{}", store.export_qr(&deck)?);
        }
        QrCommand::Import { payload } => {
            let id = store.import_qr(&payload)?;
            let deck = require_deck(store, &id)?;
            println!(
                "Imported '{}' with {} cards as {id}.",
                deck.name,
                deck.cards.len()
            );
        }
    }
    Ok(())
}

async fn handle_generate(store: &mut Store, config: &Config, topic: &str) -> anyhow::Result<()> {
    if config.generator.resolved_api_key().is_none() {
        warn!("No generator API key configured; the request will likely be rejected");
    }
    let generator = GeminiGenerator::from_config(&config.generator)?;
    let id = store.generate_deck(&generator, topic).await?;
    let deck = require_deck(store, &id)?;
    println!(
        "Created '{}' with {} cards as {id}.",
        deck.name,
        deck.cards.len()
    );
    Ok(())
}

fn handle_theme(store: &mut Store, cmd: ThemeCommand) {
    match cmd {
        ThemeCommand::Show => {
            let current = store.theme();
            for theme in Theme::ALL {
                let marker = if theme == current { "*" } else { " " };
                println!("{marker} {theme}");
            }
        }
        ThemeCommand::Set { theme } => {
            store.set_theme(theme.into());
            println!("Theme set to {}.", store.theme());
        }
    }
}

fn handle_status(store: &Store, config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = store.persistence().stats()?;
    let cards: usize = store.decks().map(|deck| deck.cards.len()).sum();
    let mastered: usize = store.decks().map(|deck| deck.stats().mastered).sum();
    let favorites = store.favorites_view().cards.len();

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "decks": store.len(),
            "cards": cards,
            "mastered": mastered,
            "favorites": favorites,
            "theme": store.theme(),
            "storage": storage,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("flashdeck Status");
        println!("================");
        println!();
        println!("Database:     {}", config.database_path().display());
        println!("Stored bytes: {}", storage.bytes);
        println!(
            "Last saved:   {}",
            storage.decks_updated_at.as_deref().unwrap_or("never")
        );
        println!();
        println!("Decks:        {}", store.len());
        println!("Cards:        {cards} ({mastered} mastered, {favorites} favorite)");
        println!("Theme:        {}", store.theme());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let generator = &config.generator;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!();
                println!("[Store]");
                println!("  Strict:          {}", config.store.strict);
                println!();
                println!("[Generator]");
                println!("  Endpoint:        {}", generator.endpoint);
                println!("  Model:           {}", generator.model);
                println!(
                    "  API key:         {}",
                    if generator.resolved_api_key().is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!("  Cards per deck:  {}", generator.card_count);
                println!("  Timeout (secs):  {}", generator.timeout_secs);
                println!();
                println!("[QR]");
                println!("  Max payload:     {}", config.qr.max_payload_len);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

fn show_deck(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let deck = store
        .view(id)
        .ok_or_else(|| anyhow!("deck not found: {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
        return Ok(());
    }

    println!("{} ({})", deck.name, progress(deck.stats()));
    println!();
    for card in &deck.cards {
        let mastered = if card.mastered { "M" } else { " " };
        let favorite = if card.favorite { "F" } else { " " };
        println!("[{mastered}{favorite}] {}  {}", card.id, card.question);
        println!("      {}", card.answer);
        if let Some(comment) = &card.comment {
            println!("      ({comment})");
        }
    }
    Ok(())
}

fn require_deck(store: &Store, id: &str) -> anyhow::Result<Deck> {
    store
        .deck(id)
        .cloned()
        .ok_or_else(|| anyhow!("deck not found: {id}"))
}

fn open(store: &mut Store, id: &str) -> anyhow::Result<()> {
    if !store.open_deck(id)? {
        bail!("deck not found: {id}");
    }
    Ok(())
}

fn progress(stats: DeckStats) -> String {
    format!(
        "{}/{} mastered, {} favorite",
        stats.mastered, stats.total, stats.favorite
    )
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
