use serde::{Deserialize, Serialize};

use crate::retention::{
    DEFAULT_TARGET_RETENTION, FIRST_INTERVAL_DAYS, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR,
    SECOND_INTERVAL_DAYS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrtConfig {
    /// Damping applied to each single-step theta update.
    pub damping: f64,
    /// Below this Fisher information an answer triggers no theta update.
    pub min_information: f64,
}

impl Default for IrtConfig {
    fn default() -> Self {
        Self {
            damping: 0.7,
            min_information: 0.001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    /// Multiplicative jitter bounds breaking near-ties between candidates.
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            jitter_min: 0.95,
            jitter_max: 1.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppingConfig {
    /// Standard error below which the ability estimate counts as precise.
    pub target_se: f64,
    /// Evidence floor: precision-based stopping is not considered earlier.
    pub min_questions: u32,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            target_se: 0.3,
            min_questions: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub min_ease_factor: f64,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    pub max_interval_days: u32,
    /// Retention level the optimal-delay forecast aims for.
    pub target_retention: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_ease_factor: MIN_EASE_FACTOR,
            first_interval_days: FIRST_INTERVAL_DAYS,
            second_interval_days: SECOND_INTERVAL_DAYS,
            max_interval_days: MAX_INTERVAL_DAYS,
            target_retention: DEFAULT_TARGET_RETENTION,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub irt: IrtConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub stopping: StoppingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.irt.damping) || self.irt.damping == 0.0 {
            return Err("irt.damping must be in (0,1]".to_string());
        }
        if self.irt.min_information <= 0.0 {
            return Err("irt.min_information must be > 0".to_string());
        }

        if self.selector.jitter_min <= 0.0 {
            return Err("selector.jitter_min must be > 0".to_string());
        }
        if self.selector.jitter_min > 1.0 || self.selector.jitter_max < 1.0 {
            return Err("selector jitter bounds must straddle 1.0".to_string());
        }

        if self.stopping.target_se <= 0.0 {
            return Err("stopping.target_se must be > 0".to_string());
        }
        if self.stopping.min_questions == 0 {
            return Err("stopping.min_questions must be >= 1".to_string());
        }

        if self.scheduler.min_ease_factor < 1.0 {
            return Err("scheduler.min_ease_factor must be >= 1.0".to_string());
        }
        if self.scheduler.first_interval_days == 0 {
            return Err("scheduler.first_interval_days must be >= 1".to_string());
        }
        if self.scheduler.second_interval_days < self.scheduler.first_interval_days {
            return Err(
                "scheduler.second_interval_days must be >= first_interval_days".to_string(),
            );
        }
        if self.scheduler.max_interval_days < self.scheduler.second_interval_days {
            return Err("scheduler.max_interval_days must be >= second_interval_days".to_string());
        }
        if self.scheduler.target_retention <= 0.0 || self.scheduler.target_retention >= 1.0 {
            return Err("scheduler.target_retention must be in (0,1)".to_string());
        }

        Ok(())
    }
}
