use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL: u32 = 1;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// A single vocabulary entry together with its review schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub front: String,
    pub phonetic: String,
    pub meaning: String,
    pub last_reviewed: NaiveDate,
    pub interval: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
}

impl Card {
    /// A fresh card that has never been graded.
    pub fn new(
        front: impl Into<String>,
        phonetic: impl Into<String>,
        meaning: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            front: front.into(),
            phonetic: phonetic.into(),
            meaning: meaning.into(),
            last_reviewed: today,
            interval: DEFAULT_INTERVAL,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
        }
    }

    pub fn stage_label(&self) -> &'static str {
        match self.repetitions {
            0 => "New",
            1 => "Learning",
            2 => "Familiar",
            3..=4 => "Comfortable",
            _ => "Mastered",
        }
    }
}

// Recall grade, 0 = forgot, 4 = perfect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Grade(u8);

impl Grade {
    pub const MAX: u8 = 4;
    pub const PASS_THRESHOLD: u8 = 3;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<u8>().ok().and_then(Self::new)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_pass(&self) -> bool {
        self.0 >= Self::PASS_THRESHOLD
    }
}

/// Running counts for one review session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionTally {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl SessionTally {
    pub fn record(&mut self, grade: Grade) {
        self.total += 1;
        if grade.is_pass() {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    /// Percentage of passing grades, rounded to one decimal. `None` before anything was graded.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(round_one_decimal(
                self.correct as f64 / self.total as f64 * 100.0,
            ))
        }
    }
}

/// One row of the per-user progress log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEntry {
    pub date: NaiveDate,
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: f64,
}

impl ProgressEntry {
    pub fn from_tally(tally: &SessionTally, date: NaiveDate) -> Self {
        Self {
            date,
            total: tally.total,
            correct: tally.correct,
            incorrect: tally.incorrect,
            accuracy: tally.accuracy().unwrap_or(0.0),
        }
    }
}

/// Aggregate view of a user's deck, trouble log and history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckStats {
    pub total_cards: usize,
    pub due_today: usize,
    pub new_cards: usize,
    pub trouble_words: usize,
    pub sessions: usize,
    pub total_reviews: u32,
    pub lifetime_accuracy: Option<f64>,
}

impl DeckStats {
    pub fn compute(
        cards: &[Card],
        due_today: usize,
        trouble_words: usize,
        history: &[ProgressEntry],
    ) -> Self {
        let total_reviews: u32 = history.iter().map(|e| e.total).sum();
        let total_correct: u32 = history.iter().map(|e| e.correct).sum();
        let lifetime_accuracy = (total_reviews > 0)
            .then(|| round_one_decimal(total_correct as f64 / total_reviews as f64 * 100.0));

        Self {
            total_cards: cards.len(),
            due_today,
            new_cards: cards.iter().filter(|c| c.repetitions == 0).count(),
            trouble_words,
            sessions: history.len(),
            total_reviews,
            lifetime_accuracy,
        }
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
