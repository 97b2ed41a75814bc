//! Simplified SM-2 scheduling.
//!
//! A passing grade (3 or 4) grows the interval 1 → 6 → `interval * ease`; anything lower sends
//! the card back to a one-day interval. The ease factor moves with every grade and never drops
//! below [`MIN_EASE_FACTOR`].

use chrono::{Days, NaiveDate};

use crate::models::{Card, Grade, MIN_EASE_FACTOR};

/// Whether `card` should be reviewed on `today`. A card is due on the exact day its interval
/// elapses.
pub fn is_due(card: &Card, today: NaiveDate) -> bool {
    (today - card.last_reviewed).num_days() >= card.interval as i64
}

/// `None` when the due date lies past the last representable date.
pub fn next_due_date(card: &Card) -> Option<NaiveDate> {
    card.last_reviewed.checked_add_days(Days::new(card.interval as u64))
}

/// Days until the card becomes due; zero or negative when it already is.
pub fn days_until_due(card: &Card, today: NaiveDate) -> i64 {
    let due = next_due_date(card).unwrap_or(NaiveDate::MAX);
    (due - today).num_days()
}

/// Compute the card's next schedule after it was graded on `today`.
pub fn update_on_grade(card: &Card, grade: Grade, today: NaiveDate) -> Card {
    let (interval, repetitions) = if grade.is_pass() {
        let interval = match card.repetitions {
            0 => 1,
            1 => 6,
            // truncation toward zero; ease >= 1.3 keeps this >= 1 for any interval >= 1
            _ => ((card.interval as f64 * card.ease_factor) as u32).max(1),
        };
        (interval, card.repetitions + 1)
    } else {
        (1, 0)
    };

    Card {
        interval,
        repetitions,
        ease_factor: adjust_ease(card.ease_factor, grade),
        last_reviewed: today,
        ..card.clone()
    }
}

// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
fn adjust_ease(ease_factor: f64, grade: Grade) -> f64 {
    let miss = 5.0 - grade.value() as f64;
    (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR)
}

/// Indices of the cards due on `today`, in deck order.
pub fn select_due(cards: &[Card], today: NaiveDate) -> Vec<usize> {
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| is_due(card, today))
        .map(|(i, _)| i)
        .collect()
}
