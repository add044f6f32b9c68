use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ability scale bounds (standard-normal metric).
pub const THETA_MIN: f64 = -3.0;
pub const THETA_MAX: f64 = 3.0;

pub const DISCRIMINATION_MIN: f64 = 0.5;
pub const DISCRIMINATION_MAX: f64 = 2.5;

pub const GUESSING_MIN: f64 = 0.0;
pub const GUESSING_MAX: f64 = 0.5;
/// Default guessing parameter for four-option multiple choice.
pub const GUESSING_DEFAULT: f64 = 0.25;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown subject code: {0}")]
    UnknownSubject(String),
    #[error("session {0} is already finished")]
    SessionFinished(String),
    #[error("item {0} was already answered in this session")]
    DuplicateAnswer(String),
}

/// Clamp with NaN/infinity falling back to a neutral default. Malformed
/// numeric input is never rejected, only coerced into the valid domain.
pub(crate) fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

pub(crate) fn clamp_theta(theta: f64) -> f64 {
    clamp_or(theta, THETA_MIN, THETA_MAX, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Maths,
    Physics,
    Chemistry,
    English,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Maths,
        Subject::Physics,
        Subject::Chemistry,
        Subject::English,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maths => "maths",
            Self::Physics => "physics",
            Self::Chemistry => "chemistry",
            Self::English => "english",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maths" => Ok(Self::Maths),
            "physics" => Ok(Self::Physics),
            "chemistry" => Ok(Self::Chemistry),
            "english" => Ok(Self::English),
            other => Err(EngineError::UnknownSubject(other.to_string())),
        }
    }
}

/// Recall quality on the 0-5 SM-2 scale.
///
/// 0-2 count as failed recall, 3-5 as successful recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quality {
    Blackout,
    Incorrect,
    Difficult,
    Hesitant,
    Correct,
    Perfect,
}

impl Quality {
    /// Out-of-range ratings clamp into 0-5 rather than erroring.
    pub fn from_raw(raw: i32) -> Self {
        match raw.clamp(0, 5) {
            0 => Self::Blackout,
            1 => Self::Incorrect,
            2 => Self::Difficult,
            3 => Self::Hesitant,
            4 => Self::Correct,
            _ => Self::Perfect,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Blackout => 0,
            Self::Incorrect => 1,
            Self::Difficult => 2,
            Self::Hesitant => 3,
            Self::Correct => 4,
            Self::Perfect => 5,
        }
    }

    pub fn is_successful_recall(self) -> bool {
        self.as_u8() >= 3
    }
}

/// 3PL item parameters. Construction clamps each parameter into its valid
/// range; NaN and infinity fall back to neutral defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemParams {
    pub difficulty: f64,
    pub discrimination: f64,
    pub guessing: f64,
}

impl ItemParams {
    pub fn new(difficulty: f64, discrimination: f64, guessing: f64) -> Self {
        Self {
            difficulty: clamp_or(difficulty, THETA_MIN, THETA_MAX, 0.0),
            discrimination: clamp_or(
                discrimination,
                DISCRIMINATION_MIN,
                DISCRIMINATION_MAX,
                1.0,
            ),
            guessing: clamp_or(guessing, GUESSING_MIN, GUESSING_MAX, GUESSING_DEFAULT),
        }
    }

    /// Re-apply the construction clamps. Used at evaluation entry points so
    /// values that arrived through deserialization still satisfy the
    /// parameter invariants.
    pub fn normalized(&self) -> Self {
        Self::new(self.difficulty, self.discrimination, self.guessing)
    }
}

impl Default for ItemParams {
    fn default() -> Self {
        Self::new(0.0, 1.0, GUESSING_DEFAULT)
    }
}

/// An authored question. Immutable once in the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub subject: Subject,
    pub topic_id: String,
    pub params: ItemParams,
}

impl Item {
    pub fn new(id: &str, subject: Subject, topic_id: &str, params: ItemParams) -> Self {
        Self {
            id: id.to_string(),
            subject,
            topic_id: topic_id.to_string(),
            params,
        }
    }
}

/// How much a single response was worth, by the information it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Diagnostics for one ability update, persisted or surfaced by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaUpdate {
    pub theta_before: f64,
    pub theta_after: f64,
    pub theta_change: f64,
    pub probability: f64,
    pub information: f64,
    pub confidence: Confidence,
}

/// Per-learner ability estimates, keyed by subject. A subject that has never
/// been touched reads as the population mean (0.0); estimates are created at
/// first interaction and never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityProfile {
    thetas: HashMap<Subject, f64>,
}

impl AbilityProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theta(&self, subject: Subject) -> f64 {
        self.thetas.get(&subject).copied().unwrap_or(0.0)
    }

    pub fn set_theta(&mut self, subject: Subject, theta: f64) {
        self.thetas.insert(subject, clamp_theta(theta));
    }

    pub fn apply(&mut self, subject: Subject, update: &ThetaUpdate) {
        self.thetas.insert(subject, clamp_theta(update.theta_after));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, f64)> + '_ {
        self.thetas.iter().map(|(subject, theta)| (*subject, *theta))
    }
}

/// Ephemeral record of one scored answer. The engine does not retain these
/// beyond the session that produced them; durable storage is the caller's
/// concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOutcome {
    pub item_id: String,
    pub correct: bool,
    pub time_taken_secs: u32,
    pub theta_before: f64,
    pub theta_after: f64,
    pub information: f64,
    pub answered_at: DateTime<Utc>,
}
