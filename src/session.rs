//! Review session controller.
//!
//! A session repeatedly picks a shuffled batch of cards, asks for a grade on each and then lets
//! the learner keep going with the same selection, reshuffle, resize the batch, or leave.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io;
use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::models::{Card, Grade, ProgressEntry, SessionTally};
use crate::scheduler;
use crate::store::StoreError;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Prompts and output the controller needs from whoever is at the keyboard.
///
/// Every `request_*` method keeps asking until it gets a valid answer; an `Err` means the
/// conversation itself broke (closed stdin, broken pipe).
pub trait Interaction {
    fn show(&mut self, message: &str) -> io::Result<()>;

    fn display_card(&mut self, front: &str, phonetic: &str, meaning: &str) -> io::Result<()>;

    fn request_grade(&mut self) -> io::Result<Grade>;

    fn request_yes_no(&mut self, prompt: &str) -> io::Result<bool>;

    /// Index into `options` of the selected entry.
    fn request_choice(&mut self, prompt: &str, options: &[&str]) -> io::Result<usize>;

    fn request_integer(&mut self, prompt: &str, minimum: u32) -> io::Result<u32>;
}

/// Where lapses and finished-session summaries go.
pub trait ReviewLog {
    fn append_trouble_entry(
        &mut self,
        card: &Card,
        date: NaiveDate,
    ) -> std::result::Result<(), StoreError>;

    fn append_progress_summary(
        &mut self,
        entry: &ProgressEntry,
    ) -> std::result::Result<(), StoreError>;
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("interaction failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    /// Cards due today; grading reschedules them.
    Due,
    /// Logged trouble words; grading only counts.
    Trouble,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user: String,
    pub mode: ReviewMode,
    pub seed: i64,
    pub batch_size: usize,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Nothing was eligible, or nothing got graded.
    NothingToReview,
    /// The session ran out of cards; its summary was logged.
    Finished(SessionTally),
    /// The learner chose to exit; no summary was logged.
    Exited(SessionTally),
}

enum BatchEnd {
    Completed,
    NewWords,
    Exit,
}

pub struct ReviewSession<'a, I: Interaction, L: ReviewLog> {
    cards: &'a mut [Card],
    interaction: &'a mut I,
    log: &'a mut L,
    config: SessionConfig,
    tally: SessionTally,
}

impl<'a, I: Interaction, L: ReviewLog> ReviewSession<'a, I, L> {
    pub fn new(
        cards: &'a mut [Card],
        interaction: &'a mut I,
        log: &'a mut L,
        config: SessionConfig,
    ) -> Self {
        Self {
            cards,
            interaction,
            log,
            config,
            tally: SessionTally::default(),
        }
    }

    pub fn run(mut self) -> Result<SessionOutcome> {
        let span = info_span!("review", user = %self.config.user, mode = ?self.config.mode);
        let _guard = span.enter();

        if self.config.mode == ReviewMode::Trouble {
            if self.cards.is_empty() {
                self.interaction.show("No trouble words logged yet!")?;
                return Ok(SessionOutcome::NothingToReview);
            }
            self.interaction
                .show("Trouble Words Mode: reviewing only missed cards.")?;
        }

        let mut seed = self.config.seed;
        let mut batch_size = self.config.batch_size.max(1);

        loop {
            let batch = select_batch(
                self.cards,
                self.config.mode,
                self.config.today,
                seed,
                batch_size,
            );
            if batch.is_empty() {
                self.interaction.show(if self.tally.total == 0 {
                    "No cards to review today!"
                } else {
                    "No more cards due today."
                })?;
                break;
            }
            debug!(seed, batch_size, selected = batch.len(), "starting batch");

            if let BatchEnd::Exit = self.review_batch(&batch)? {
                info!(total = self.tally.total, "session exited");
                return Ok(SessionOutcome::Exited(self.tally));
            }

            if !self
                .interaction
                .request_yes_no("Continue with the same batch of words?")?
            {
                let choice = self.interaction.request_choice(
                    "How would you like to proceed?",
                    &[
                        "Shuffle new words",
                        "Change number of words in batch (will also pick new words)",
                    ],
                )?;
                seed = seed.wrapping_add(1);
                if choice == 1 {
                    batch_size = self
                        .interaction
                        .request_integer("Input number of words in batch:", 1)?
                        as usize;
                }
            }
        }

        self.finish()
    }

    fn review_batch(&mut self, batch: &[usize]) -> Result<BatchEnd> {
        let mode = self.config.mode;
        let today = self.config.today;

        for &index in batch {
            let card = &self.cards[index];
            self.interaction
                .display_card(&card.front, &card.phonetic, &card.meaning)?;
            let grade = self.interaction.request_grade()?;

            if mode == ReviewMode::Due {
                let updated = scheduler::update_on_grade(card, grade, today);
                debug!(
                    front = %updated.front,
                    grade = grade.value(),
                    interval = updated.interval,
                    ease_factor = updated.ease_factor,
                    "rescheduled card"
                );
                self.cards[index] = updated;
            }

            self.tally.record(grade);
            let card = &self.cards[index];

            if mode == ReviewMode::Due {
                if !grade.is_pass() {
                    self.log.append_trouble_entry(card, today)?;
                }
                self.interaction
                    .show(&format!("Next review in {} days.", card.interval))?;
            }

            if !self.interaction.request_yes_no("Do you wish to continue?")? {
                let choice = self
                    .interaction
                    .request_choice("What next?", &["New words", "Exit"])?;
                return Ok(if choice == 0 {
                    BatchEnd::NewWords
                } else {
                    BatchEnd::Exit
                });
            }
        }

        Ok(BatchEnd::Completed)
    }

    fn finish(self) -> Result<SessionOutcome> {
        let tally = self.tally;
        let Some(accuracy) = tally.accuracy() else {
            return Ok(SessionOutcome::NothingToReview);
        };

        self.interaction.show("Session Summary")?;
        self.interaction
            .show(&format!("Total Reviewed: {}", tally.total))?;
        self.interaction.show(&format!("Correct: {}", tally.correct))?;
        self.interaction.show(&format!("Missed: {}", tally.incorrect))?;
        self.interaction.show(&format!("Accuracy: {:.1}%", accuracy))?;

        self.log
            .append_progress_summary(&ProgressEntry::from_tally(&tally, self.config.today))?;

        info!(
            total = tally.total,
            correct = tally.correct,
            incorrect = tally.incorrect,
            "session finished"
        );
        Ok(SessionOutcome::Finished(tally))
    }
}

/// Indices of the cards for the next batch: every eligible card, shuffled by `seed`, cut to
/// `batch_size`. The same inputs always give the same batch.
pub fn select_batch(
    cards: &[Card],
    mode: ReviewMode,
    today: NaiveDate,
    seed: i64,
    batch_size: usize,
) -> Vec<usize> {
    let mut eligible = match mode {
        ReviewMode::Trouble => (0..cards.len()).collect(),
        ReviewMode::Due => scheduler::select_due(cards, today),
    };

    let mut rng = StdRng::seed_from_u64(seed as u64);
    eligible.shuffle(&mut rng);
    eligible.truncate(batch_size);
    eligible
}
