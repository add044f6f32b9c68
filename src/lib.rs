//! Adaptive assessment and retention engine for exam preparation.
//!
//! Two cooperating subsystems over shared learner state:
//!
//! - [`irt`] — computerized adaptive testing on the three-parameter logistic
//!   model: per-subject ability estimation, maximum-information item
//!   selection, and the precision-based stopping rule.
//! - [`retention`] — SM-2 spaced repetition plus forgetting-curve
//!   forecasting for per-topic review scheduling.
//!
//! Everything is a pure, synchronous function over caller-supplied state:
//! no clock reads, no storage, no global singletons. Randomness (selector
//! jitter) and the current date are always injected, so behaviour is
//! deterministic under test. Numeric inputs out of range are clamped, never
//! rejected; exhausted item pools and uninformative responses are ordinary
//! return values, not errors.

pub mod bank;
pub mod config;
pub mod irt;
pub mod logging;
pub mod retention;
pub mod session;
pub mod types;

pub use bank::ItemBank;
pub use config::EngineConfig;
pub use session::{AdaptiveSession, SessionStats, SessionStatus};
pub use types::{
    AbilityProfile, EngineError, Item, ItemParams, Quality, ResponseOutcome, Subject, ThetaUpdate,
};
