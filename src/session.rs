//! Adaptive study-session orchestration.
//!
//! A session threads the estimator, selector, and stopping rule together
//! for one (learner, subject) pair. It is a plain value: the caller owns
//! persistence and must serialize updates per learner-subject key.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{IrtConfig, SelectorConfig, StoppingConfig};
use crate::irt::{estimator, selector, stopping};
use crate::irt::stopping::StopDecision;
use crate::types::{EngineError, Item, ItemParams, ResponseOutcome, Subject, ThetaUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveSession {
    pub id: String,
    pub learner_id: String,
    pub subject: Subject,
    pub status: SessionStatus,
    pub max_questions: u32,
    pub theta_start: f64,
    pub theta: f64,
    pub administered: Vec<ItemParams>,
    pub answered_item_ids: HashSet<String>,
    pub responses: Vec<ResponseOutcome>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub attempted: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: f64,
    pub total_time_secs: u32,
    pub average_time_per_question_secs: f64,
    pub theta_start: f64,
    pub theta_end: f64,
    pub theta_change: f64,
}

impl AdaptiveSession {
    pub fn new(
        learner_id: &str,
        subject: Subject,
        initial_theta: f64,
        max_questions: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        let theta = crate::types::clamp_theta(initial_theta);
        let session = Self {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            subject,
            status: SessionStatus::InProgress,
            max_questions,
            theta_start: theta,
            theta,
            administered: Vec::new(),
            answered_item_ids: HashSet::new(),
            responses: Vec::new(),
            started_at,
        };
        tracing::info!(
            session_id = %session.id,
            learner_id,
            subject = %subject,
            initial_theta = theta,
            "adaptive session started"
        );
        session
    }

    /// Score one answer: updates the running theta estimate and records the
    /// response. Re-answering an item or answering after `finish` is an
    /// error; everything numeric clamps instead of failing.
    pub fn record_answer(
        &mut self,
        item: &Item,
        correct: bool,
        time_taken_secs: u32,
        answered_at: DateTime<Utc>,
        config: &IrtConfig,
    ) -> Result<ThetaUpdate, EngineError> {
        if self.status == SessionStatus::Completed {
            return Err(EngineError::SessionFinished(self.id.clone()));
        }
        if self.answered_item_ids.contains(&item.id) {
            return Err(EngineError::DuplicateAnswer(item.id.clone()));
        }

        let update = estimator::update_theta(self.theta, &item.params, correct, config);

        self.theta = update.theta_after;
        self.administered.push(item.params);
        self.answered_item_ids.insert(item.id.clone());
        self.responses.push(ResponseOutcome {
            item_id: item.id.clone(),
            correct,
            time_taken_secs,
            theta_before: update.theta_before,
            theta_after: update.theta_after,
            information: update.information,
            answered_at,
        });

        tracing::debug!(
            session_id = %self.id,
            item_id = %item.id,
            correct,
            theta = self.theta,
            information = update.information,
            "answer recorded"
        );

        Ok(update)
    }

    /// Most informative unanswered item from the pool at the current theta,
    /// or `None` when the pool is exhausted.
    pub fn next_item<'a, R: Rng + ?Sized>(
        &self,
        pool: &'a [Item],
        rng: &mut R,
        config: &SelectorConfig,
    ) -> Option<&'a Item> {
        selector::select_next(self.theta, pool, &self.answered_item_ids, rng, config)
    }

    /// Current stop/continue verdict for the session.
    pub fn decision(&self, config: &StoppingConfig) -> StopDecision {
        stopping::should_stop(
            self.theta,
            &self.administered,
            self.max_questions,
            self.responses.len() as u32,
            config,
        )
    }

    pub fn finish(&mut self) -> SessionStats {
        self.status = SessionStatus::Completed;
        let stats = self.stats();
        tracing::info!(
            session_id = %self.id,
            attempted = stats.attempted,
            accuracy = stats.accuracy,
            theta_change = stats.theta_change,
            "adaptive session finished"
        );
        stats
    }

    pub fn stats(&self) -> SessionStats {
        let attempted = self.responses.len() as u32;
        let correct = self.responses.iter().filter(|r| r.correct).count() as u32;
        let total_time_secs: u32 = self.responses.iter().map(|r| r.time_taken_secs).sum();

        SessionStats {
            attempted,
            correct,
            incorrect: attempted - correct,
            accuracy: if attempted > 0 {
                f64::from(correct) / f64::from(attempted)
            } else {
                0.0
            },
            total_time_secs,
            average_time_per_question_secs: if attempted > 0 {
                f64::from(total_time_secs) / f64::from(attempted)
            } else {
                0.0
            },
            theta_start: self.theta_start,
            theta_end: self.theta,
            theta_change: self.theta - self.theta_start,
        }
    }
}
