//! Sample-size planning for conversion-rate experiments.

use conversion_core::config::SignificanceConfig;
use conversion_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stats;

/// Smallest per-variant sample ever recommended.
pub const MIN_SAMPLE_SIZE: u64 = 30;

/// Visitors per variant needed to detect a move from `baseline_rate` to
/// `baseline_rate + minimum_detectable_effect`, never less than
/// [`MIN_SAMPLE_SIZE`].
pub fn required_sample_size(
    baseline_rate: f64,
    minimum_detectable_effect: f64,
    confidence: f64,
    power: f64,
) -> EngineResult<u64> {
    sample_size_with_floor(
        baseline_rate,
        minimum_detectable_effect,
        confidence,
        power,
        MIN_SAMPLE_SIZE,
    )
}

fn sample_size_with_floor(
    baseline_rate: f64,
    minimum_detectable_effect: f64,
    confidence: f64,
    power: f64,
    floor: u64,
) -> EngineResult<u64> {
    let p1 = baseline_rate;
    let p2 = baseline_rate + minimum_detectable_effect;
    if !(0.0..1.0).contains(&p1) {
        return Err(EngineError::InvalidParameter(format!(
            "baseline rate must be in [0, 1), got {p1}"
        )));
    }
    if !(p2 > 0.0 && p2 <= 1.0) {
        return Err(EngineError::InvalidParameter(format!(
            "baseline plus minimum detectable effect must be in (0, 1], got {p2}"
        )));
    }
    if minimum_detectable_effect == 0.0 {
        return Err(EngineError::InvalidParameter(
            "minimum detectable effect must be non-zero".to_string(),
        ));
    }
    let z_alpha = stats::z_critical(confidence)?;
    let z_beta = stats::z_power(power)?;

    let pooled = (p1 + p2) / 2.0;
    let numerator = z_alpha * (2.0 * pooled * (1.0 - pooled)).sqrt()
        + z_beta * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
    let n = (numerator.powi(2) / (p2 - p1).powi(2)).ceil();
    if !n.is_finite() {
        return Err(EngineError::Statistics(format!(
            "sample size diverged for baseline {p1} and target {p2}"
        )));
    }

    Ok((n as u64).max(floor))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePlan {
    pub baseline_rate: f64,
    pub target_rate: f64,
    pub confidence: f64,
    pub power: f64,
    pub per_variant: u64,
    pub variants: usize,
    pub total: u64,
    /// Days to collect `total` visitors, when daily traffic is known.
    pub estimated_days: Option<u64>,
}

/// Sample-size calculator bound to configured confidence, power, and floor.
#[derive(Debug, Clone)]
pub struct SampleSizePlanner {
    confidence: f64,
    power: f64,
    min_sample_size: u64,
}

impl SampleSizePlanner {
    pub fn new(config: &SignificanceConfig) -> Self {
        Self {
            confidence: config.confidence,
            power: config.power,
            min_sample_size: config.min_sample_size,
        }
    }

    pub fn required_sample_size(
        &self,
        baseline_rate: f64,
        minimum_detectable_effect: f64,
    ) -> EngineResult<u64> {
        sample_size_with_floor(
            baseline_rate,
            minimum_detectable_effect,
            self.confidence,
            self.power,
            self.min_sample_size,
        )
    }

    pub fn plan(
        &self,
        baseline_rate: f64,
        minimum_detectable_effect: f64,
        variants: usize,
        daily_visitors: Option<u64>,
    ) -> EngineResult<SamplePlan> {
        if variants < 2 {
            return Err(EngineError::InsufficientVariants { found: variants });
        }
        let per_variant = self.required_sample_size(baseline_rate, minimum_detectable_effect)?;
        let total = per_variant * variants as u64;
        let estimated_days = daily_visitors
            .filter(|daily| *daily > 0)
            .map(|daily| total.div_ceil(daily));

        debug!(
            baseline_rate,
            minimum_detectable_effect,
            per_variant,
            total,
            ?estimated_days,
            "Experiment sample plan computed"
        );

        Ok(SamplePlan {
            baseline_rate,
            target_rate: baseline_rate + minimum_detectable_effect,
            confidence: self.confidence,
            power: self.power,
            per_variant,
            variants,
            total,
            estimated_days,
        })
    }
}

impl Default for SampleSizePlanner {
    fn default() -> Self {
        Self::new(&SignificanceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sample_size() {
        // (1.96*sqrt(2*.055*.945) + 0.8416*sqrt(.05*.95 + .06*.94))^2 / .01^2
        let n = required_sample_size(0.05, 0.01, 0.95, 0.8).unwrap();
        assert!((8150..=8165).contains(&n), "got {n}");
    }

    #[test]
    fn test_higher_power_needs_more_samples() {
        let base = required_sample_size(0.10, 0.02, 0.95, 0.8).unwrap();
        let powered = required_sample_size(0.10, 0.02, 0.95, 0.9).unwrap();
        let strict = required_sample_size(0.10, 0.02, 0.99, 0.8).unwrap();
        assert!(powered > base);
        assert!(strict > base);
    }

    #[test]
    fn test_floor_applies_to_large_effects() {
        assert_eq!(required_sample_size(0.5, 0.4, 0.95, 0.8).unwrap(), MIN_SAMPLE_SIZE);
        assert_eq!(required_sample_size(0.0, 1.0, 0.95, 0.8).unwrap(), MIN_SAMPLE_SIZE);
    }

    #[test]
    fn test_zero_baseline_is_defined() {
        let n = required_sample_size(0.0, 0.01, 0.95, 0.8).unwrap();
        assert!(n > MIN_SAMPLE_SIZE);
    }

    #[test]
    fn test_negative_effect_matches_mirror() {
        let up = required_sample_size(0.05, 0.01, 0.95, 0.8).unwrap();
        let down = required_sample_size(0.06, -0.01, 0.95, 0.8).unwrap();
        assert_eq!(up, down);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(required_sample_size(0.05, 0.0, 0.95, 0.8).unwrap_err().is_invalid_argument());
        assert!(required_sample_size(-0.1, 0.05, 0.95, 0.8).is_err());
        assert!(required_sample_size(0.9, 0.2, 0.95, 0.8).is_err());
        assert!(required_sample_size(0.05, 0.01, 1.0, 0.8).is_err());
        assert!(required_sample_size(0.05, 0.01, 0.95, 1.2).is_err());
        assert!(required_sample_size(f64::NAN, 0.01, 0.95, 0.8).is_err());
    }

    #[test]
    fn test_saturated_baseline_and_zero_target_rejected() {
        assert!(required_sample_size(1.0, -0.1, 0.95, 0.8).unwrap_err().is_invalid_argument());
        assert!(required_sample_size(0.05, -0.05, 0.95, 0.8).unwrap_err().is_invalid_argument());
        assert!(required_sample_size(0.05, f64::NAN, 0.95, 0.8).is_err());
        // A target of exactly 1 is still reachable.
        assert!(required_sample_size(0.5, 0.5, 0.95, 0.8).is_ok());
        assert!(required_sample_size(0.98, 0.01, 0.95, 0.8).is_ok());
        assert!(required_sample_size(0.05, -0.04, 0.95, 0.8).is_ok());
    }

    #[test]
    fn test_planner_uses_configured_floor() {
        let planner = SampleSizePlanner::new(&SignificanceConfig {
            min_sample_size: 500,
            ..Default::default()
        });
        assert_eq!(planner.required_sample_size(0.5, 0.4).unwrap(), 500);
    }

    #[test]
    fn test_plan_totals_and_duration() {
        let planner = SampleSizePlanner::default();
        let plan = planner.plan(0.05, 0.01, 3, Some(1000)).unwrap();
        assert_eq!(plan.total, plan.per_variant * 3);
        assert_eq!(plan.estimated_days, Some(plan.total.div_ceil(1000)));
        assert!((plan.target_rate - 0.06).abs() < 1e-12);

        let no_traffic = planner.plan(0.05, 0.01, 2, Some(0)).unwrap();
        assert_eq!(no_traffic.estimated_days, None);

        assert!(matches!(
            planner.plan(0.05, 0.01, 1, None),
            Err(EngineError::InsufficientVariants { found: 1 })
        ));
    }
}
