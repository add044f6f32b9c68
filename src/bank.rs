//! In-memory question bank with ability-aware candidate pools.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::irt::selector::rank_candidates;
use crate::types::{AbilityProfile, Item, ItemParams, Subject};

/// Coarse difficulty bands for authoring and coverage reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifficultyBand {
    Easy,
    Moderate,
    Medium,
    Hard,
    VeryHard,
}

impl DifficultyBand {
    pub fn for_difficulty(difficulty: f64) -> Self {
        if difficulty < -1.0 {
            Self::Easy
        } else if difficulty < 0.0 {
            Self::Moderate
        } else if difficulty < 1.0 {
            Self::Medium
        } else if difficulty < 2.0 {
            Self::Hard
        } else {
            Self::VeryHard
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBank {
    items: HashMap<String, Item>,
}

impl ItemBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-built item, replacing any previous entry with the
    /// same id.
    pub fn add(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    /// Author an item from raw parameters. Out-of-range parameters are
    /// clamped, never rejected; clamping is logged because it usually means
    /// a data-entry error upstream.
    pub fn author(
        &mut self,
        id: &str,
        subject: Subject,
        topic_id: &str,
        difficulty: f64,
        discrimination: f64,
        guessing: f64,
    ) -> &Item {
        let params = ItemParams::new(difficulty, discrimination, guessing);
        if params.difficulty != difficulty
            || params.discrimination != discrimination
            || params.guessing != guessing
        {
            tracing::warn!(
                item_id = id,
                difficulty,
                discrimination,
                guessing,
                "item parameters clamped into valid ranges"
            );
        }

        self.items
            .insert(id.to_string(), Item::new(id, subject, topic_id, params));
        &self.items[id]
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items_for_subject(&self, subject: Subject) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.subject == subject)
            .collect()
    }

    pub fn items_for_topic(&self, topic_id: &str) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.topic_id == topic_id)
            .collect()
    }

    /// Unanswered items for a subject, optionally restricted to a difficulty
    /// window. An empty result is a normal outcome for the caller to handle.
    pub fn candidates(
        &self,
        subject: Subject,
        answered: &HashSet<String>,
        difficulty_range: Option<(f64, f64)>,
    ) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.subject == subject)
            .filter(|item| !answered.contains(&item.id))
            .filter(|item| match difficulty_range {
                Some((min, max)) => {
                    item.params.difficulty >= min && item.params.difficulty <= max
                }
                None => true,
            })
            .collect()
    }

    /// The `limit` most informative unanswered items for the given ability.
    pub fn pool_for_ability(
        &self,
        theta: f64,
        subject: Subject,
        answered: &HashSet<String>,
        limit: usize,
    ) -> Vec<&Item> {
        let ranked = rank_candidates(theta, self.items_for_subject(subject), answered);
        ranked
            .into_iter()
            .take(limit)
            .map(|(item, _)| item)
            .collect()
    }

    pub fn difficulty_distribution(
        &self,
        subject: Option<Subject>,
    ) -> HashMap<DifficultyBand, usize> {
        let mut distribution = HashMap::new();
        for item in self.items.values() {
            if subject.is_some_and(|s| item.subject != s) {
                continue;
            }
            *distribution
                .entry(DifficultyBand::for_difficulty(item.params.difficulty))
                .or_insert(0) += 1;
        }
        distribution
    }

    /// Subjects where the learner's estimate sits below the threshold,
    /// weakest first.
    pub fn weak_subjects(&self, profile: &AbilityProfile, threshold: f64) -> Vec<(Subject, f64)> {
        let mut weak: Vec<(Subject, f64)> = Subject::ALL
            .into_iter()
            .map(|subject| (subject, profile.theta(subject)))
            .filter(|(_, theta)| *theta < threshold)
            .collect();
        weak.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        weak
    }
}
