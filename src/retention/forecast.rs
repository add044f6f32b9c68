//! Forgetting-curve forecasting and review-queue ordering.
//!
//! The model: retention decays as `exp(-days / stability)` where stability
//! grows with the card's ease factor and repetition streak. The same curve
//! drives the optimal-delay forecast and the urgency ordering of the queue.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::retention::scheduler::ReviewCard;
use crate::retention::{DEFAULT_EASE_FACTOR, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};

/// Base stability in days for a fresh card at the minimum streak.
const STABILITY_BASE_DAYS: f64 = 10.0;
/// Stability multiplier per successful repetition.
const STABILITY_GROWTH: f64 = 1.5;

const URGENCY_OVERDUE_WEIGHT: f64 = 10.0;
const URGENCY_DIFFICULTY_WEIGHT: f64 = 5.0;
const URGENCY_STREAK_WEIGHT: f64 = 5.0;
/// Streak length past which material counts as established.
const ESTABLISHED_REPETITIONS: f64 = 3.0;

/// Memory stability in days: `ease_factor * 1.5^repetitions * 10`.
pub fn stability_days(ease_factor: f64, repetitions: u32) -> f64 {
    let ease_factor = ease_factor.max(MIN_EASE_FACTOR);
    ease_factor * STABILITY_GROWTH.powi(repetitions as i32) * STABILITY_BASE_DAYS
}

/// Probability the material is still retained `days_since_review` days after
/// the last review. 1.0 on the review day itself, strictly decreasing after.
pub fn retention_probability(days_since_review: i64, ease_factor: f64, repetitions: u32) -> f64 {
    if days_since_review <= 0 {
        return 1.0;
    }
    let stability = stability_days(ease_factor, repetitions);
    (-(days_since_review as f64) / stability).exp().clamp(0.0, 1.0)
}

/// Days until retention decays to `target_retention`:
/// `max(1, round(-stability * ln(target)))`, capped at the interval ceiling.
pub fn optimal_review_delay(ease_factor: f64, repetitions: u32, target_retention: f64) -> u32 {
    let target = target_retention.clamp(0.01, 0.99);
    let days = -stability_days(ease_factor, repetitions) * target.ln();
    (days.round() as u32).clamp(1, MAX_INTERVAL_DAYS)
}

/// Urgency score used to order the review queue. Overdue days dominate,
/// harder (low-ease) and less-established (short-streak) cards rank higher.
/// Never negative, and never used to gate correctness.
pub fn urgency(card: &ReviewCard, today: NaiveDate) -> f64 {
    let days_overdue = card
        .next_review_date
        .map(|next| (today - next).num_days().max(0))
        .unwrap_or(0);

    let score = URGENCY_OVERDUE_WEIGHT * days_overdue as f64
        + URGENCY_DIFFICULTY_WEIGHT * (DEFAULT_EASE_FACTOR - card.ease_factor)
        + URGENCY_STREAK_WEIGHT * (ESTABLISHED_REPETITIONS - f64::from(card.repetitions)).max(0.0);

    score.max(0.0)
}

fn by_urgency_desc(today: NaiveDate) -> impl Fn(&&ReviewCard, &&ReviewCard) -> Ordering {
    move |a, b| {
        urgency(b, today)
            .partial_cmp(&urgency(a, today))
            .unwrap_or(Ordering::Equal)
    }
}

/// Cards due on `today`, most urgent first.
pub fn due_cards(cards: &[ReviewCard], today: NaiveDate) -> Vec<&ReviewCard> {
    let mut due: Vec<&ReviewCard> = cards.iter().filter(|card| card.is_due(today)).collect();
    due.sort_by(by_urgency_desc(today));
    due
}

/// Cards strictly past their due date, most urgent first.
pub fn overdue_cards(cards: &[ReviewCard], today: NaiveDate) -> Vec<&ReviewCard> {
    let mut overdue: Vec<&ReviewCard> =
        cards.iter().filter(|card| card.is_overdue(today)).collect();
    overdue.sort_by(by_urgency_desc(today));
    overdue
}

/// Every card ordered by urgency, for full-queue displays.
pub fn review_queue(cards: &[ReviewCard], today: NaiveDate) -> Vec<&ReviewCard> {
    let mut queue: Vec<&ReviewCard> = cards.iter().collect();
    queue.sort_by(by_urgency_desc(today));
    queue
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRetention {
    pub date: NaiveDate,
    pub mean_retention: f64,
}

/// Projected mean retention over the reviewed cards for each of the next
/// `days_ahead` days (inclusive of today).
pub fn retention_forecast(
    cards: &[ReviewCard],
    today: NaiveDate,
    days_ahead: u32,
) -> Vec<DailyRetention> {
    (0..=i64::from(days_ahead))
        .map(|offset| {
            let date = today + chrono::Duration::days(offset);
            let mut total = 0.0;
            let mut reviewed = 0usize;

            for card in cards {
                if let Some(last) = card.last_review_date {
                    let days_since = (date - last).num_days();
                    total += retention_probability(days_since, card.ease_factor, card.repetitions);
                    reviewed += 1;
                }
            }

            DailyRetention {
                date,
                mean_retention: if reviewed > 0 {
                    total / reviewed as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub overdue_cards: usize,
    pub average_ease_factor: f64,
    pub average_retention: f64,
}

/// Aggregate queue health for dashboards and worker reports.
pub fn review_stats(cards: &[ReviewCard], today: NaiveDate) -> ReviewStats {
    if cards.is_empty() {
        return ReviewStats {
            total_cards: 0,
            due_cards: 0,
            overdue_cards: 0,
            average_ease_factor: 0.0,
            average_retention: 0.0,
        };
    }

    let mut total_ease = 0.0;
    let mut total_retention = 0.0;
    let mut reviewed = 0usize;
    let mut due = 0usize;
    let mut overdue = 0usize;

    for card in cards {
        total_ease += card.ease_factor;
        if card.is_due(today) {
            due += 1;
        }
        if card.is_overdue(today) {
            overdue += 1;
        }
        if let Some(last) = card.last_review_date {
            let days_since = (today - last).num_days();
            total_retention += retention_probability(days_since, card.ease_factor, card.repetitions);
            reviewed += 1;
        }
    }

    ReviewStats {
        total_cards: cards.len(),
        due_cards: due,
        overdue_cards: overdue,
        average_ease_factor: total_ease / cards.len() as f64,
        average_retention: if reviewed > 0 {
            total_retention / reviewed as f64
        } else {
            0.0
        },
    }
}
