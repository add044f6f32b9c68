//! SM-2 review scheduling.
//!
//! Each review event recomputes the card's interval, ease factor, and next
//! due date from the learner's recall quality. Failed recall (quality below
//! 3) resets the repetition streak and sends the card back to a one-day
//! interval; the ease factor adjusts on every review regardless of outcome.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::retention::DEFAULT_EASE_FACTOR;
use crate::types::Quality;

/// Per-(learner, topic) scheduling state. Created on first exposure to a
/// topic, mutated on every review event, conceptually never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub topic_id: String,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub last_review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
}

/// Derived lifecycle state; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardState {
    /// Never reviewed.
    New,
    /// Reviewed, but the last recall failed.
    Learning,
    /// At least one successful recall; interval growing by ease factor.
    Review,
}

impl ReviewCard {
    pub fn new(topic_id: &str) -> Self {
        Self {
            topic_id: topic_id.to_string(),
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 1,
            repetitions: 0,
            last_review_date: None,
            next_review_date: None,
        }
    }

    pub fn state(&self) -> CardState {
        match (self.repetitions, self.last_review_date) {
            (0, None) => CardState::New,
            (0, Some(_)) => CardState::Learning,
            _ => CardState::Review,
        }
    }

    /// Due once the scheduled date arrives. A card that was never scheduled
    /// is due immediately.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        match self.next_review_date {
            Some(next) => today >= next,
            None => true,
        }
    }

    /// Strictly past the scheduled date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.next_review_date.is_some_and(|next| today > next)
    }
}

/// Outcome of one review event, mirrored onto the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub next_review_date: NaiveDate,
    pub state: CardState,
}

/// Apply one recall-quality observation to a card.
///
/// Successful recall walks the interval ladder 1, 3, then
/// `round(previous_interval * ease_factor)` using the ease factor the card
/// carried into the review; failure resets to the first rung. The ease
/// factor then updates by `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)` and is
/// floored at `min_ease_factor`.
pub fn schedule_review(
    card: &mut ReviewCard,
    quality: Quality,
    today: NaiveDate,
    config: &SchedulerConfig,
) -> ReviewOutcome {
    if quality.is_successful_recall() {
        card.repetitions += 1;
        card.interval_days = match card.repetitions {
            1 => config.first_interval_days,
            2 => config.second_interval_days,
            _ => (card.interval_days as f64 * card.ease_factor).round() as u32,
        };
    } else {
        card.repetitions = 0;
        card.interval_days = config.first_interval_days;
    }
    card.interval_days = card.interval_days.clamp(1, config.max_interval_days);

    let q = f64::from(quality.as_u8());
    let penalty = (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    card.ease_factor = (card.ease_factor + 0.1 - penalty).max(config.min_ease_factor);

    let next = today + Duration::days(i64::from(card.interval_days));
    card.last_review_date = Some(today);
    card.next_review_date = Some(next);

    ReviewOutcome {
        interval_days: card.interval_days,
        ease_factor: card.ease_factor,
        repetitions: card.repetitions,
        next_review_date: next,
        state: card.state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::MIN_EASE_FACTOR;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + Duration::days(i64::from(n))
    }

    #[test]
    fn perfect_reviews_walk_the_interval_ladder() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("trigonometry");

        let first = schedule_review(&mut card, Quality::Perfect, day(0), &config);
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);
        assert!((card.ease_factor - 2.6).abs() < 1e-9);

        let second = schedule_review(&mut card, Quality::Perfect, day(1), &config);
        assert_eq!(second.interval_days, 3);
        assert!((card.ease_factor - 2.7).abs() < 1e-9);

        // Third success: round(3 * 2.7) = 8, using the incoming ease factor.
        let third = schedule_review(&mut card, Quality::Perfect, day(4), &config);
        assert_eq!(third.interval_days, 8);
        assert_eq!(third.repetitions, 3);
        assert_eq!(third.next_review_date, day(12));
    }

    #[test]
    fn failed_recall_resets_streak_and_interval() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("optics");
        card.repetitions = 5;
        card.interval_days = 40;
        card.ease_factor = 2.1;

        let outcome = schedule_review(&mut card, Quality::Difficult, day(0), &config);
        assert_eq!(outcome.repetitions, 0);
        assert_eq!(outcome.interval_days, 1);
        assert_eq!(outcome.state, CardState::Learning);
        // Ease still adjusts on failure: 2.1 + 0.1 - 3*(0.08 + 3*0.02) = 1.78.
        assert!((card.ease_factor - 1.78).abs() < 1e-9);
    }

    #[test]
    fn ease_factor_never_drops_below_floor() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("mechanics");

        for n in 0..10 {
            schedule_review(&mut card, Quality::Blackout, day(n), &config);
            assert!(card.ease_factor >= MIN_EASE_FACTOR);
        }
        assert_eq!(card.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn interval_is_capped() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("algebra");
        card.repetitions = 10;
        card.interval_days = 300;
        card.ease_factor = 2.5;

        let outcome = schedule_review(&mut card, Quality::Perfect, day(0), &config);
        assert_eq!(outcome.interval_days, config.max_interval_days);
    }

    #[test]
    fn derived_state_follows_the_lifecycle() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("calculus");
        assert_eq!(card.state(), CardState::New);

        schedule_review(&mut card, Quality::Hesitant, day(0), &config);
        assert_eq!(card.state(), CardState::Review);

        schedule_review(&mut card, Quality::Blackout, day(1), &config);
        assert_eq!(card.state(), CardState::Learning);
    }

    #[test]
    fn due_and_overdue_are_strict_about_the_boundary() {
        let config = SchedulerConfig::default();
        let mut card = ReviewCard::new("statistics");
        assert!(card.is_due(day(0)));
        assert!(!card.is_overdue(day(0)));

        card.repetitions = 1;
        schedule_review(&mut card, Quality::Correct, day(0), &config);
        // repetitions was 1, so this review set a 3-day interval.
        assert_eq!(card.next_review_date, Some(day(3)));

        assert!(!card.is_due(day(0)));
        assert!(!card.is_due(day(1)));
        assert!(card.is_due(day(3)));
        assert!(!card.is_overdue(day(3)));
        assert!(card.is_overdue(day(4)));
    }
}
