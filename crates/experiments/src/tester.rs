//! Configured entry point for significance testing and sample planning.

use conversion_core::config::SignificanceConfig;
use conversion_core::{EngineResult, VariantObservation};

use crate::multivariant;
use crate::result::SignificanceResult;
use crate::sample_size::{SamplePlan, SampleSizePlanner};
use crate::two_variant;

/// Significance tester bound to a confidence level, power, and sample floor.
#[derive(Debug, Clone)]
pub struct SignificanceTester {
    config: SignificanceConfig,
    planner: SampleSizePlanner,
}

impl SignificanceTester {
    pub fn new(config: &SignificanceConfig) -> Self {
        Self {
            config: config.clone(),
            planner: SampleSizePlanner::new(config),
        }
    }

    /// A/B test at the configured confidence.
    pub fn test_two_variant(
        &self,
        control: &VariantObservation,
        treatment: &VariantObservation,
    ) -> EngineResult<SignificanceResult> {
        two_variant::test_two_variant(control, treatment, self.config.confidence)
    }

    pub fn test_two_variant_at(
        &self,
        control: &VariantObservation,
        treatment: &VariantObservation,
        confidence: f64,
    ) -> EngineResult<SignificanceResult> {
        two_variant::test_two_variant(control, treatment, confidence)
    }

    pub fn test_multivariant(
        &self,
        variants: &[VariantObservation],
    ) -> EngineResult<SignificanceResult> {
        multivariant::test_multivariant(variants, self.config.confidence)
    }

    pub fn compare_to_control(
        &self,
        variants: &[VariantObservation],
    ) -> EngineResult<Vec<SignificanceResult>> {
        multivariant::compare_to_control(variants, self.config.confidence)
    }

    /// Two variants get the z-test, three or more the chi-square test.
    pub fn test(&self, variants: &[VariantObservation]) -> EngineResult<SignificanceResult> {
        match variants {
            [control, treatment] => self.test_two_variant(control, treatment),
            _ => self.test_multivariant(variants),
        }
    }

    pub fn required_sample_size(
        &self,
        baseline_rate: f64,
        minimum_detectable_effect: f64,
    ) -> EngineResult<u64> {
        self.planner
            .required_sample_size(baseline_rate, minimum_detectable_effect)
    }

    pub fn plan_experiment(
        &self,
        baseline_rate: f64,
        minimum_detectable_effect: f64,
        variants: usize,
        daily_visitors: Option<u64>,
    ) -> EngineResult<SamplePlan> {
        self.planner.plan(
            baseline_rate,
            minimum_detectable_effect,
            variants,
            daily_visitors,
        )
    }
}

impl Default for SignificanceTester {
    fn default() -> Self {
        Self::new(&SignificanceConfig::default())
    }
}
