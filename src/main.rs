mod console;
mod models;
mod scheduler;
mod session;
mod store;
mod tui;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rand::Rng;
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use console::Console;
use models::{Card, DeckStats, JsonOutput};
use session::{
    Interaction, ReviewMode, ReviewSession, SessionConfig, SessionOutcome, DEFAULT_BATCH_SIZE,
};
use store::CsvStore;

const APP_DIR_NAME: &str = "flashdeck";

#[derive(Parser)]
#[command(name = "flashdeck")]
#[command(about = "A spaced-repetition vocabulary flashcard trainer")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Whose deck to use
    #[arg(long, short, global = true, env = "FLASHDECK_USER")]
    user: Option<String>,

    /// Directory holding the deck and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and an empty deck
    Init,

    /// Add a card to the deck
    Add {
        /// Word in the target language
        front: String,

        /// Transliteration
        phonetic: String,

        /// Translation
        meaning: String,
    },

    /// List every card with its next review date
    List,

    /// List the cards due today
    Due,

    /// Review cards due today
    Review {
        /// Number of words per batch
        #[arg(long, short, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,

        /// Shuffle seed (random when omitted)
        #[arg(long, short, allow_hyphen_values = true)]
        seed: Option<i64>,
    },

    /// Review logged trouble words without rescheduling them
    Trouble {
        /// Number of words per batch
        #[arg(long, short, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,

        /// Shuffle seed (random when omitted)
        #[arg(long, short, allow_hyphen_values = true)]
        seed: Option<i64>,
    },

    /// Remove a word from the trouble log
    Resolve {
        /// Word as it appears on the card front
        front: String,
    },

    /// Show deck and progress statistics
    Stats,

    /// Interactive main menu
    Menu,

    /// Launch interactive terminal dashboard
    Tui,
}

fn get_data_dir(override_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir;
    }
    if let Ok(path) = std::env::var("FLASHDECK_DIR") {
        return PathBuf::from(path);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn random_seed() -> i64 {
    rand::thread_rng().gen_range(-10_000_000_000..=10_000_000_000)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let user = cli
        .user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or("No user given. Pass --user or set FLASHDECK_USER")?;
    let data_dir = get_data_dir(cli.data_dir);
    let mut store = CsvStore::new(&data_dir, user);
    let today = today();

    match cli.command {
        Commands::Init => {
            let created = store.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else if created {
                println!("Deck initialized at: {}", store.deck_path().display());
            } else {
                println!("Deck already exists at: {}", store.deck_path().display());
            }
        }

        Commands::Add {
            front,
            phonetic,
            meaning,
        } => {
            std::fs::create_dir_all(&data_dir)?;
            let card = store.add_card(&front, &phonetic, &meaning, today)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&card))?);
            } else {
                println!("Added '{}' ({}) to {}'s deck.", card.front, card.meaning, store.user());
            }
        }

        Commands::List => {
            let cards = store.load_cards(today)?;
            print_cards(&cards, today, cli.json, "No cards in the deck.")?;
        }

        Commands::Due => {
            let cards: Vec<Card> = store
                .load_cards(today)?
                .into_iter()
                .filter(|c| scheduler::is_due(c, today))
                .collect();
            print_cards(&cards, today, cli.json, "No cards to review today!")?;
        }

        Commands::Review { count, seed } => {
            let mut cards = store.load_cards(today)?;
            let mut console = Console::stdio();
            let outcome = review(
                &mut cards,
                ReviewMode::Due,
                seed.unwrap_or_else(random_seed),
                count,
                today,
                &mut console,
                &mut store,
            )?;
            if outcome != SessionOutcome::NothingToReview {
                store.save_cards(&cards)?;
            }
            print_outcome(&outcome, cli.json)?;
        }

        Commands::Trouble { count, seed } => {
            let mut cards = store.load_trouble_cards(today)?;
            let mut console = Console::stdio();
            let outcome = review(
                &mut cards,
                ReviewMode::Trouble,
                seed.unwrap_or_else(random_seed),
                count,
                today,
                &mut console,
                &mut store,
            )?;
            print_outcome(&outcome, cli.json)?;
        }

        Commands::Resolve { front } => {
            let removed = store.resolve_trouble(&front)?;
            if cli.json && removed == 0 {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("Word not in trouble log"))?
                );
            } else if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "front": front,
                        "removed": removed
                    })))?
                );
            } else if removed == 0 {
                println!("'{}' is not in the trouble log.", front);
            } else {
                println!("Removed {} trouble entries for '{}'.", removed, front);
            }
        }

        Commands::Stats => {
            let stats = load_stats(&store, today)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== {}'s Deck ===", store.user());
                println!("Cards: {}", stats.total_cards);
                println!("New: {}", stats.new_cards);
                println!("Due today: {}", stats.due_today);
                println!("Trouble words: {}", stats.trouble_words);
                println!("Sessions: {}", stats.sessions);
                println!("Reviews: {}", stats.total_reviews);
                match stats.lifetime_accuracy {
                    Some(acc) => println!("Accuracy: {:.1}%", acc),
                    None => println!("Accuracy: -"),
                }
            }
        }

        Commands::Menu => {
            let mut console = Console::stdio();
            run_menu(&mut console, &mut store, today)?;
        }

        Commands::Tui => {
            tui::run(store, today)?;
        }
    }

    Ok(())
}

fn review<R: BufRead, W: Write>(
    cards: &mut [Card],
    mode: ReviewMode,
    seed: i64,
    batch_size: usize,
    today: NaiveDate,
    console: &mut Console<R, W>,
    store: &mut CsvStore,
) -> Result<SessionOutcome, session::SessionError> {
    let config = SessionConfig {
        user: store.user().to_string(),
        mode,
        seed,
        batch_size,
        today,
    };
    ReviewSession::new(cards, console, store, config).run()
}

fn run_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &mut CsvStore,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = random_seed();
    let mut cards = store.load_cards(today)?;
    if cards.is_empty() {
        console.show(&format!("No flashcards found in {}", store.deck_path().display()))?;
    }

    console.show("Spaced Repetition Trainer")?;
    loop {
        let choice = console.request_choice(
            "Choose a mode:",
            &["Review due cards (SRS)", "Review trouble words", "Quit"],
        )?;
        if choice == 2 {
            console.show("Goodbye! Keep practicing!")?;
            return Ok(());
        }

        let count = console.request_integer("How many words do you wish to review?", 1)? as usize;
        if choice == 0 {
            let outcome = review(&mut cards, ReviewMode::Due, seed, count, today, console, store)?;
            if outcome != SessionOutcome::NothingToReview {
                store.save_cards(&cards)?;
            }
        } else {
            let mut trouble = store.load_trouble_cards(today)?;
            review(&mut trouble, ReviewMode::Trouble, seed, count, today, console, store)?;
        }
    }
}

fn load_stats(store: &CsvStore, today: NaiveDate) -> Result<DeckStats, store::StoreError> {
    let cards = store.load_cards(today)?;
    let due = scheduler::select_due(&cards, today).len();
    let trouble: HashSet<String> = store
        .load_trouble_cards(today)?
        .into_iter()
        .map(|c| c.front)
        .collect();
    let history = store.load_progress()?;
    Ok(DeckStats::compute(&cards, due, trouble.len(), &history))
}

fn print_cards(
    cards: &[Card],
    today: NaiveDate,
    json: bool,
    empty_message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&JsonOutput::ok(cards))?);
    } else if cards.is_empty() {
        println!("{}", empty_message);
    } else {
        println!(
            "{:<20} {:<20} {:<24} {:<12} STAGE",
            "WORD", "PHONETIC", "MEANING", "NEXT"
        );
        println!("{}", "-".repeat(86));
        for card in cards {
            println!(
                "{:<20} {:<20} {:<24} {:<12} {}",
                truncate(&card.front, 18),
                truncate(&card.phonetic, 18),
                truncate(&card.meaning, 22),
                format_due(card, today),
                card.stage_label()
            );
        }
    }
    Ok(())
}

fn print_outcome(outcome: &SessionOutcome, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !json {
        return Ok(());
    }
    let tally = match outcome {
        SessionOutcome::NothingToReview => None,
        SessionOutcome::Finished(t) | SessionOutcome::Exited(t) => Some(t),
    };
    println!(
        "{}",
        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
            "finished": matches!(outcome, SessionOutcome::Finished(_)),
            "tally": tally
        })))?
    );
    Ok(())
}

fn format_due(card: &Card, today: NaiveDate) -> String {
    match scheduler::days_until_due(card, today) {
        d if d <= 0 => "due".to_string(),
        1 => "tomorrow".to_string(),
        d => format!("in {}d", d),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
