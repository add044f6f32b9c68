//! Stopping rule for adaptive sessions.

use serde::{Deserialize, Serialize};

use crate::config::StoppingConfig;
use crate::irt::estimator::standard_error;
use crate::types::ItemParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDecision {
    pub stop: bool,
    pub reason: String,
}

/// Decide whether an adaptive session has gathered enough evidence to end.
///
/// Checks, in order: the hard question-count bound, the minimum-evidence
/// floor, then precision (standard error under `target_se`). The floor comes
/// before precision so an early lucky streak can never end a session after a
/// handful of questions.
pub fn should_stop(
    theta: f64,
    administered: &[ItemParams],
    max_questions: u32,
    current_count: u32,
    config: &StoppingConfig,
) -> StopDecision {
    if current_count >= max_questions {
        return StopDecision {
            stop: true,
            reason: format!("maximum questions reached ({max_questions})"),
        };
    }

    if current_count < config.min_questions {
        return StopDecision {
            stop: false,
            reason: format!(
                "minimum not reached ({current_count}/{})",
                config.min_questions
            ),
        };
    }

    let se = standard_error(theta, administered);
    if se < config.target_se {
        return StopDecision {
            stop: true,
            reason: format!("precision achieved (SE = {se:.3} < {})", config.target_se),
        };
    }

    StopDecision {
        stop: false,
        reason: format!("SE = {se:.3}, continuing"),
    }
}
