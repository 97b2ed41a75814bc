use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    Card, ProgressEntry, DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL, MIN_EASE_FACTOR,
};
use crate::session::ReviewLog;

const DECK_HEADER: [&str; 7] = [
    "Front",
    "Phonetic",
    "Meaning",
    "Last Reviewed",
    "Interval",
    "Ease Factor",
    "Repetition",
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Flat-file storage for one user's deck, trouble log and progress log.
///
/// ```text
/// <data_dir>/
/// ├── flashcards_<USER>.csv        # deck, with header row
/// ├── <USER>_errors.csv            # trouble log, one row per lapse
/// └── <USER>_progress_report.csv   # one row per finished session
/// ```
pub struct CsvStore {
    data_dir: PathBuf,
    user: String,
}

impl CsvStore {
    pub fn new<P: AsRef<Path>>(data_dir: P, user: &str) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            user: normalize_user(user),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn deck_path(&self) -> PathBuf {
        self.data_dir.join(format!("flashcards_{}.csv", self.user))
    }

    pub fn trouble_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}_errors.csv", self.user))
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}_progress_report.csv", self.user))
    }

    /// Create the data directory and an empty deck. Returns false when the deck already existed.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(&self.data_dir)?;
        if self.deck_path().exists() {
            return Ok(false);
        }
        self.save_cards(&[])?;
        Ok(true)
    }

    // Deck operations
    pub fn load_cards(&self, today: NaiveDate) -> Result<Vec<Card>> {
        let path = self.deck_path();
        if !path.exists() {
            warn!(path = %path.display(), "deck file not found");
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;

        let mut cards = Vec::new();
        for (i, record) in reader.records().enumerate() {
            // header is line 1
            if let Some(card) = card_from_record(&record?, i + 2, today) {
                cards.push(card);
            }
        }

        debug!(count = cards.len(), path = %path.display(), "loaded deck");
        Ok(cards)
    }

    pub fn save_cards(&self, cards: &[Card]) -> Result<()> {
        let path = self.deck_path();
        let mut writer = WriterBuilder::new().from_path(&path)?;
        writer.write_record(DECK_HEADER)?;
        for card in cards {
            writer.write_record(&[
                card.front.clone(),
                card.phonetic.clone(),
                card.meaning.clone(),
                card.last_reviewed.to_string(),
                card.interval.to_string(),
                card.ease_factor.to_string(),
                card.repetitions.to_string(),
            ])?;
        }
        writer.flush()?;

        debug!(count = cards.len(), path = %path.display(), "saved deck");
        Ok(())
    }

    pub fn add_card(
        &self,
        front: &str,
        phonetic: &str,
        meaning: &str,
        today: NaiveDate,
    ) -> Result<Card> {
        let mut cards = self.load_cards(today)?;
        let card = Card::new(front.trim(), phonetic.trim(), meaning.trim(), today);
        cards.push(card.clone());
        self.save_cards(&cards)?;
        Ok(card)
    }

    // Trouble log operations

    /// Cards for every logged lapse. The lapse date becomes the card's review date; the rest of
    /// the schedule takes defaults since trouble reviews never reschedule.
    pub fn load_trouble_cards(&self, today: NaiveDate) -> Result<Vec<Card>> {
        let path = self.trouble_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut cards = Vec::new();
        for (i, record) in reader.records().enumerate() {
            if let Some(card) = card_from_record(&record?, i + 1, today) {
                cards.push(card);
            }
        }
        Ok(cards)
    }

    /// Drop every trouble-log row for `front`. Returns the number of rows removed.
    pub fn resolve_trouble(&self, front: &str) -> Result<usize> {
        let path = self.trouble_path();
        if !path.exists() {
            return Ok(0);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        let (removed, kept): (Vec<StringRecord>, Vec<StringRecord>) = records
            .into_iter()
            .partition(|r| r.get(0).map(str::trim) == Some(front.trim()));

        if removed.is_empty() {
            return Ok(0);
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        for record in &kept {
            writer.write_record(record)?;
        }
        writer.flush()?;

        debug!(front, removed = removed.len(), "resolved trouble word");
        Ok(removed.len())
    }

    // Progress log operations
    pub fn load_progress(&self) -> Result<Vec<ProgressEntry>> {
        let path = self.progress_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut entries = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            match progress_from_record(&record) {
                Some(entry) => entries.push(entry),
                None => warn!(line = i + 1, "skipping malformed progress row"),
            }
        }
        Ok(entries)
    }

    fn append_row(&self, path: &Path, row: &[String]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }
}

impl ReviewLog for CsvStore {
    fn append_trouble_entry(&mut self, card: &Card, date: NaiveDate) -> Result<()> {
        self.append_row(
            &self.trouble_path(),
            &[
                card.front.clone(),
                card.phonetic.clone(),
                card.meaning.clone(),
                date.to_string(),
            ],
        )
    }

    fn append_progress_summary(&mut self, entry: &ProgressEntry) -> Result<()> {
        self.append_row(
            &self.progress_path(),
            &[
                entry.date.to_string(),
                entry.total.to_string(),
                entry.correct.to_string(),
                entry.incorrect.to_string(),
                format!("{:.1}%", entry.accuracy),
            ],
        )
    }
}

pub fn normalize_user(user: &str) -> String {
    user.trim().to_uppercase()
}

fn card_from_record(record: &StringRecord, line: usize, today: NaiveDate) -> Option<Card> {
    if record.len() < 3 {
        warn!(line, "skipping row without front, phonetic and meaning");
        return None;
    }

    let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());

    Some(Card {
        front: record[0].to_string(),
        phonetic: record[1].to_string(),
        meaning: record[2].to_string(),
        last_reviewed: parse_or_default(field(3), "last reviewed", line, today),
        interval: parse_or_default(field(4), "interval", line, DEFAULT_INTERVAL).max(1),
        ease_factor: ease_or_default(parse_or_default(
            field(5),
            "ease factor",
            line,
            DEFAULT_EASE_FACTOR,
        )),
        repetitions: parse_or_default(field(6), "repetition", line, 0),
    })
}

// Stored ease below the floor is raised to it; NaN and infinities are reset.
fn ease_or_default(ease: f64) -> f64 {
    if ease.is_finite() {
        ease.max(MIN_EASE_FACTOR)
    } else {
        DEFAULT_EASE_FACTOR
    }
}

fn parse_or_default<T: std::str::FromStr>(
    value: Option<&str>,
    name: &str,
    line: usize,
    default: T,
) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(line, field = name, value = raw, "unparsable field, using default");
            default
        }),
    }
}

fn progress_from_record(record: &StringRecord) -> Option<ProgressEntry> {
    if record.len() < 5 {
        return None;
    }
    Some(ProgressEntry {
        date: record[0].trim().parse().ok()?,
        total: record[1].trim().parse().ok()?,
        correct: record[2].trim().parse().ok()?,
        incorrect: record[3].trim().parse().ok()?,
        accuracy: record[4].trim().trim_end_matches('%').parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn setup_store() -> (TempDir, CsvStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = CsvStore::new(dir.path(), "joe");
        store.init().expect("Failed to initialize store");
        (dir, store)
    }

    mod path_tests {
        use super::*;

        #[test]
        fn paths_are_user_scoped_and_uppercased() {
            let store = CsvStore::new("/data", " Bella ");
            assert_eq!(store.user(), "BELLA");
            assert_eq!(store.deck_path(), PathBuf::from("/data/flashcards_BELLA.csv"));
            assert_eq!(store.trouble_path(), PathBuf::from("/data/BELLA_errors.csv"));
            assert_eq!(
                store.progress_path(),
                PathBuf::from("/data/BELLA_progress_report.csv")
            );
        }
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_writes_header_only_deck() {
            let (_dir, store) = setup_store();
            let content = fs::read_to_string(store.deck_path()).unwrap();
            assert_eq!(
                content.trim_end(),
                "Front,Phonetic,Meaning,Last Reviewed,Interval,Ease Factor,Repetition"
            );
        }

        #[test]
        fn init_does_not_truncate_existing_deck() {
            let (_dir, store) = setup_store();
            store.add_card("بيت", "bayt", "house", today()).unwrap();
            assert!(!store.init().unwrap());
            assert_eq!(store.load_cards(today()).unwrap().len(), 1);
        }
    }

    mod deck_tests {
        use super::*;

        #[test]
        fn missing_deck_loads_empty() {
            let dir = TempDir::new().unwrap();
            let store = CsvStore::new(dir.path(), "nobody");
            assert!(store.load_cards(today()).unwrap().is_empty());
        }

        #[test]
        fn content_only_rows_take_default_schedule() {
            let (_dir, store) = setup_store();
            fs::write(
                store.deck_path(),
                "Arabic,Transliteration,Translation\nمرحبا,marhaba,hello\n",
            )
            .unwrap();

            let cards = store.load_cards(today()).unwrap();
            assert_eq!(cards, vec![Card::new("مرحبا", "marhaba", "hello", today())]);
        }

        #[test]
        fn full_rows_keep_schedule() {
            let (_dir, store) = setup_store();
            fs::write(
                store.deck_path(),
                "h1,h2,h3,h4,h5,h6,h7\nشكرا,shukran,thank you,2025-09-20,6,2.36,2\n",
            )
            .unwrap();

            let card = &store.load_cards(today()).unwrap()[0];
            assert_eq!(card.last_reviewed, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
            assert_eq!(card.interval, 6);
            assert_eq!(card.ease_factor, 2.36);
            assert_eq!(card.repetitions, 2);
        }

        #[test]
        fn unparsable_fields_fall_back_to_defaults() {
            let (_dir, store) = setup_store();
            fs::write(
                store.deck_path(),
                "header\nla,laa,no,yesterday,six,2.1,x\nshort,row\n",
            )
            .unwrap();

            let cards = store.load_cards(today()).unwrap();
            assert_eq!(cards.len(), 1);
            assert_eq!(cards[0].last_reviewed, today());
            assert_eq!(cards[0].interval, 1);
            assert_eq!(cards[0].ease_factor, 2.1);
            assert_eq!(cards[0].repetitions, 0);
        }

        #[test]
        fn stored_ease_is_kept_within_bounds() {
            let (_dir, store) = setup_store();
            fs::write(
                store.deck_path(),
                "header
a,b,c,2025-09-01,6,0.5,2
d,e,f,2025-09-01,6,inf,2
g,h,i,2025-09-01,6,NaN,2
",
            )
            .unwrap();

            let cards = store.load_cards(today()).unwrap();
            assert_eq!(cards.len(), 3);
            assert_eq!(cards[0].ease_factor, MIN_EASE_FACTOR);
            assert_eq!(cards[1].ease_factor, DEFAULT_EASE_FACTOR);
            assert_eq!(cards[2].ease_factor, DEFAULT_EASE_FACTOR);
        }

        #[test]
        fn huge_stored_interval_loads_without_panicking() {
            let (_dir, store) = setup_store();
            fs::write(store.deck_path(), "header
a,b,c,2025-09-01,4000000000,2.5,3
").unwrap();

            let card = &store.load_cards(today()).unwrap()[0];
            assert_eq!(card.interval, 4_000_000_000);
            assert!(!crate::scheduler::is_due(card, today()));
            assert!(crate::scheduler::days_until_due(card, today()) > 0);
        }

        #[test]
        fn save_then_load_preserves_deck() {
            let (_dir, store) = setup_store();
            let mut card = Card::new("قهوة", "ahwe", "coffee, \"strong\"", today());
            card.interval = 15;
            card.ease_factor = 2.6;
            card.repetitions = 3;
            store.save_cards(&[card.clone()]).unwrap();

            assert_eq!(store.load_cards(today()).unwrap(), vec![card]);
        }

        #[test]
        fn save_uses_canonical_field_order() {
            let (_dir, store) = setup_store();
            store
                .save_cards(&[Card::new("a", "b", "c", today())])
                .unwrap();
            let content = fs::read_to_string(store.deck_path()).unwrap();
            let row = content.lines().nth(1).unwrap();
            assert_eq!(row, "a,b,c,2025-10-01,1,2.5,0");
        }

        #[test]
        fn add_card_appends_default_card() {
            let (_dir, store) = setup_store();
            store.add_card(" ماء ", "mayy", "water", today()).unwrap();
            store.add_card("خبز", "khebez", "bread", today()).unwrap();

            let cards = store.load_cards(today()).unwrap();
            assert_eq!(cards.len(), 2);
            assert_eq!(cards[0].front, "ماء");
            assert_eq!(cards[1].repetitions, 0);
        }
    }

    mod trouble_tests {
        use super::*;

        #[test]
        fn trouble_log_round_trips_every_row() {
            let (_dir, mut store) = setup_store();
            let lapse = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
            let first = Card::new("a", "aa", "one", today());
            let second = Card::new("b", "bb", "two", today());
            store.append_trouble_entry(&first, lapse).unwrap();
            store.append_trouble_entry(&second, lapse).unwrap();

            let cards = store.load_trouble_cards(today()).unwrap();
            assert_eq!(cards.len(), 2);
            assert_eq!(cards[0].front, "a");
            assert_eq!(cards[0].last_reviewed, lapse);
            assert_eq!(cards[1].meaning, "two");
        }

        #[test]
        fn missing_trouble_log_is_empty() {
            let (_dir, store) = setup_store();
            assert!(store.load_trouble_cards(today()).unwrap().is_empty());
        }

        #[test]
        fn resolve_removes_only_matching_rows() {
            let (_dir, mut store) = setup_store();
            let a = Card::new("a", "aa", "one", today());
            let b = Card::new("b", "bb", "two", today());
            store.append_trouble_entry(&a, today()).unwrap();
            store.append_trouble_entry(&b, today()).unwrap();
            store.append_trouble_entry(&a, today()).unwrap();

            assert_eq!(store.resolve_trouble("a").unwrap(), 2);
            let remaining = store.load_trouble_cards(today()).unwrap();
            assert_eq!(remaining.len(), 1);
            assert_eq!(remaining[0].front, "b");
        }

        #[test]
        fn resolve_unknown_word_is_noop() {
            let (_dir, mut store) = setup_store();
            store
                .append_trouble_entry(&Card::new("a", "aa", "one", today()), today())
                .unwrap();
            assert_eq!(store.resolve_trouble("zzz").unwrap(), 0);
            assert_eq!(store.load_trouble_cards(today()).unwrap().len(), 1);
        }
    }

    mod progress_tests {
        use super::*;

        #[test]
        fn progress_rows_append_and_load() {
            let (_dir, mut store) = setup_store();
            let entry = ProgressEntry {
                date: today(),
                total: 3,
                correct: 2,
                incorrect: 1,
                accuracy: 66.7,
            };
            store.append_progress_summary(&entry).unwrap();
            store.append_progress_summary(&entry).unwrap();

            let content = fs::read_to_string(store.progress_path()).unwrap();
            assert_eq!(content.lines().next().unwrap(), "2025-10-01,3,2,1,66.7%");
            assert_eq!(store.load_progress().unwrap(), vec![entry.clone(), entry]);
        }

        #[test]
        fn malformed_progress_rows_are_skipped() {
            let (_dir, store) = setup_store();
            fs::write(
                store.progress_path(),
                "2025-10-01,2,2,0,100.0%\ngarbage\n2025-10-02,1,0,1,0.0%\n",
            )
            .unwrap();
            assert_eq!(store.load_progress().unwrap().len(), 2);
        }
    }
}
