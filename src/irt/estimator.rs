//! 3PL ability estimation.
//!
//! `update_theta` is a deliberately damped single-step estimator: robust
//! after every individual answer rather than accurate only at convergence.
//! `estimate_theta_mle` is the separate batch re-estimate over a full
//! response vector.

use serde::{Deserialize, Serialize};

use crate::config::IrtConfig;
use crate::types::{clamp_theta, Confidence, ItemParams, ThetaUpdate, THETA_MAX, THETA_MIN};

/// Standard error when no information has been collected: the full ability range.
pub const SE_MAX: f64 = THETA_MAX - THETA_MIN;

/// Margin over the guessing floor below which a response carries no signal.
const INFO_EPSILON: f64 = 1e-3;

const MLE_MAX_ITERATIONS: usize = 50;
const MLE_CONVERGENCE: f64 = 1e-3;
const MLE_MAX_STEP: f64 = 1.0;

const CONFIDENCE_MEDIUM_INFORMATION: f64 = 0.1;
const CONFIDENCE_HIGH_INFORMATION: f64 = 0.4;

/// Probability of a correct response under the 3PL model:
/// `p = c + (1 - c) / (1 + exp(-a * (theta - b)))`.
///
/// Inputs are clamped into their valid ranges; the result lies in [c, 1].
pub fn probability_correct(theta: f64, params: &ItemParams) -> f64 {
    let theta = clamp_theta(theta);
    let params = params.normalized();

    let exponent = -params.discrimination * (theta - params.difficulty);
    let p = params.guessing + (1.0 - params.guessing) / (1.0 + exponent.exp());
    p.clamp(params.guessing, 1.0)
}

/// Fisher information of an item at the given ability:
/// `I = a^2 * (Q / P) * ((P - c) / (1 - c))^2`.
///
/// Peaks for theta near the item difficulty. In the guessing-dominated
/// region (P close to c) and at saturation (Q close to 0) the response
/// carries no signal and the information is 0; neither case is an error.
pub fn fisher_information(theta: f64, params: &ItemParams) -> f64 {
    let params = params.normalized();
    let p = probability_correct(theta, &params);
    let q = 1.0 - p;

    if p - params.guessing < INFO_EPSILON || q < INFO_EPSILON {
        return 0.0;
    }

    let a = params.discrimination;
    let ratio = (p - params.guessing) / (1.0 - params.guessing);
    a * a * (q / p) * ratio * ratio
}

fn confidence_for(information: f64) -> Confidence {
    if information < CONFIDENCE_MEDIUM_INFORMATION {
        Confidence::Low
    } else if information < CONFIDENCE_HIGH_INFORMATION {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// Single-step theta update after one scored response.
///
/// When the item carries less than `config.min_information` the estimate is
/// left unchanged; otherwise the raw step `(observed - P) / I` is damped and
/// the result clamped into [-3, 3]. A correct answer never lowers theta and
/// an incorrect one never raises it.
pub fn update_theta(
    theta: f64,
    params: &ItemParams,
    correct: bool,
    config: &IrtConfig,
) -> ThetaUpdate {
    let theta_before = clamp_theta(theta);
    let probability = probability_correct(theta_before, params);
    let information = fisher_information(theta_before, params);

    if information < config.min_information {
        tracing::debug!(information, "information below threshold, theta unchanged");
        return ThetaUpdate {
            theta_before,
            theta_after: theta_before,
            theta_change: 0.0,
            probability,
            information,
            confidence: Confidence::Low,
        };
    }

    let observed = if correct { 1.0 } else { 0.0 };
    let raw_delta = (observed - probability) / information;
    let theta_after = clamp_theta(theta_before + config.damping * raw_delta);

    ThetaUpdate {
        theta_before,
        theta_after,
        theta_change: theta_after - theta_before,
        probability,
        information,
        confidence: confidence_for(information),
    }
}

/// Standard error of the ability estimate given the administered items:
/// `SE = 1 / sqrt(sum I)`. With no usable information the uncertainty is
/// the full ability range.
pub fn standard_error(theta: f64, administered: &[ItemParams]) -> f64 {
    let total: f64 = administered
        .iter()
        .map(|params| fisher_information(theta, params))
        .sum();

    if total <= 0.0 {
        SE_MAX
    } else {
        1.0 / total.sqrt()
    }
}

/// Maximum likelihood estimate of theta over a full response vector
/// (Newton-Raphson). Complements, and never replaces, the per-answer
/// damped update.
pub fn estimate_theta_mle(responses: &[bool], items: &[ItemParams], initial_theta: f64) -> f64 {
    if responses.is_empty() || items.is_empty() {
        return clamp_theta(initial_theta);
    }
    if responses.iter().all(|r| *r) {
        return THETA_MAX;
    }
    if responses.iter().all(|r| !*r) {
        return THETA_MIN;
    }

    let n = responses.len().min(items.len());
    let mut theta = clamp_theta(initial_theta);

    for _ in 0..MLE_MAX_ITERATIONS {
        let mut first_deriv = 0.0;
        let mut second_deriv = 0.0;

        for i in 0..n {
            let params = items[i].normalized();
            let p = probability_correct(theta, &params);
            let q = 1.0 - p;

            if p - params.guessing < INFO_EPSILON || q < INFO_EPSILON {
                continue;
            }

            let dp = params.discrimination * (p - params.guessing) * q / (1.0 - params.guessing);
            let observed = if responses[i] { 1.0 } else { 0.0 };
            first_deriv += (observed - p) * dp / (p * q);
            second_deriv -= dp * dp / (p * q);
        }

        if second_deriv.abs() < 1e-10 {
            break;
        }

        let step = (first_deriv / second_deriv).clamp(-MLE_MAX_STEP, MLE_MAX_STEP);
        let theta_new = clamp_theta(theta - step);

        if (theta_new - theta).abs() < MLE_CONVERGENCE {
            return theta_new;
        }
        theta = theta_new;
    }

    theta
}

/// Expected score over a set of items at the given ability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedScore {
    pub expected_correct: f64,
    pub total_items: usize,
    pub expected_percentage: f64,
}

pub fn expected_score(theta: f64, items: &[ItemParams]) -> ExpectedScore {
    if items.is_empty() {
        return ExpectedScore {
            expected_correct: 0.0,
            total_items: 0,
            expected_percentage: 0.0,
        };
    }

    let expected_correct: f64 = items
        .iter()
        .map(|params| probability_correct(theta, params))
        .sum();

    ExpectedScore {
        expected_correct,
        total_items: items.len(),
        expected_percentage: expected_correct / items.len() as f64 * 100.0,
    }
}

// Abramowitz-Stegun approximation, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Percentile rank for a theta on the standard-normal metric, to one decimal.
pub fn theta_to_percentile(theta: f64) -> f64 {
    let theta = clamp_theta(theta);
    let percentile = 0.5 * (1.0 + erf(theta / std::f64::consts::SQRT_2)) * 100.0;
    (percentile * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid_item() -> ItemParams {
        ItemParams::new(0.0, 1.0, 0.25)
    }

    #[test]
    fn probability_matches_3pl_at_matched_difficulty() {
        // p = 0.25 + 0.75 / (1 + e^0) = 0.625
        let p = probability_correct(0.0, &mid_item());
        assert!((p - 0.625).abs() < 1e-12);
    }

    #[test]
    fn probability_is_increasing_in_theta() {
        let params = ItemParams::new(0.5, 1.4, 0.2);
        let mut last = 0.0;
        for step in 0..=60 {
            let theta = THETA_MIN + step as f64 * 0.1;
            let p = probability_correct(theta, &params);
            assert!(p > last, "p should strictly increase, got {p} after {last}");
            last = p;
        }
    }

    #[test]
    fn probability_stays_above_guessing_floor() {
        let params = ItemParams::new(3.0, 2.5, 0.3);
        let p = probability_correct(-3.0, &params);
        assert!(p >= params.guessing);
        assert!(p < 1.0);
    }

    #[test]
    fn information_peaks_near_item_difficulty() {
        let params = ItemParams::new(0.5, 1.0, 0.25);
        let mut best_theta = THETA_MIN;
        let mut best_info = -1.0;
        for step in 0..=120 {
            let theta = THETA_MIN + step as f64 * 0.05;
            let info = fisher_information(theta, &params);
            if info > best_info {
                best_info = info;
                best_theta = theta;
            }
        }
        assert!(
            (best_theta - params.difficulty).abs() < 0.75,
            "information peak at {best_theta}, difficulty {}",
            params.difficulty
        );
    }

    #[test]
    fn information_vanishes_far_from_difficulty() {
        let params = ItemParams::new(3.0, 2.5, 0.25);
        assert_eq!(fisher_information(-3.0, &params), 0.0);
    }

    #[test]
    fn correct_answer_never_lowers_theta() {
        let config = IrtConfig::default();
        let params = mid_item();
        let up = update_theta(0.0, &params, true, &config);
        assert!(up.theta_after >= up.theta_before);

        let down = update_theta(0.0, &params, false, &config);
        assert!(down.theta_after <= down.theta_before);
    }

    #[test]
    fn update_is_noop_below_information_threshold() {
        let config = IrtConfig::default();
        // Far below a very hard item: guessing-dominated, zero information.
        let params = ItemParams::new(3.0, 2.5, 0.25);
        let update = update_theta(-3.0, &params, true, &config);
        assert_eq!(update.theta_after, update.theta_before);
        assert_eq!(update.theta_change, 0.0);
        assert_eq!(update.confidence, Confidence::Low);
    }

    #[test]
    fn repeated_correct_answers_have_diminishing_increments() {
        let config = IrtConfig::default();
        let params = mid_item();
        let mut theta = 0.0;
        let mut last_change = f64::INFINITY;
        for _ in 0..4 {
            let update = update_theta(theta, &params, true, &config);
            if update.information < config.min_information {
                break;
            }
            assert!(
                update.theta_change < last_change,
                "increments should shrink as theta rises past the difficulty"
            );
            last_change = update.theta_change;
            theta = update.theta_after;
        }
        assert!(theta <= THETA_MAX);
    }

    #[test]
    fn standard_error_is_full_range_without_information() {
        assert_eq!(standard_error(0.0, &[]), SE_MAX);

        let uninformative = vec![ItemParams::new(3.0, 2.5, 0.25)];
        assert_eq!(standard_error(-3.0, &uninformative), SE_MAX);
    }

    #[test]
    fn standard_error_shrinks_with_more_items() {
        let params = mid_item();
        let few: Vec<ItemParams> = vec![params; 3];
        let many: Vec<ItemParams> = vec![params; 12];
        assert!(standard_error(0.0, &many) < standard_error(0.0, &few));
    }

    #[test]
    fn mle_handles_degenerate_response_patterns() {
        let items = vec![mid_item(); 5];
        assert_eq!(estimate_theta_mle(&[true; 5], &items, 0.0), THETA_MAX);
        assert_eq!(estimate_theta_mle(&[false; 5], &items, 0.0), THETA_MIN);
        assert_eq!(estimate_theta_mle(&[], &items, 0.4), 0.4);
    }

    #[test]
    fn mle_moves_towards_observed_performance() {
        let items: Vec<ItemParams> = (-2..=2)
            .map(|b| ItemParams::new(b as f64, 1.5, 0.0))
            .collect();
        let responses = vec![true, true, true, true, false];
        let estimate = estimate_theta_mle(&responses, &items, 0.0);
        assert!(estimate > 0.0, "mostly-correct pattern should lift theta");
        assert!(estimate <= THETA_MAX);
    }

    #[test]
    fn expected_score_averages_probabilities() {
        let items = vec![mid_item(); 4];
        let score = expected_score(0.0, &items);
        assert_eq!(score.total_items, 4);
        assert!((score.expected_correct - 2.5).abs() < 1e-9);
        assert!((score.expected_percentage - 62.5).abs() < 1e-9);
    }

    #[test]
    fn percentile_is_centered_and_monotonic() {
        assert!((theta_to_percentile(0.0) - 50.0).abs() < 0.1);
        assert!(theta_to_percentile(1.0) > theta_to_percentile(0.0));
        assert!(theta_to_percentile(-2.0) < 5.0);
    }
}
