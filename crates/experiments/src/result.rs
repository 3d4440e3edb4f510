//! Outcome of a significance test.

use chrono::{DateTime, Utc};
use conversion_core::VariantObservation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// Unpooled two-proportion z-test.
    TwoProportionZ,
    /// Pearson chi-square test of independence on a 2×K table.
    ChiSquareIndependence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSummary {
    pub name: String,
    pub visitors: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

impl From<&VariantObservation> for VariantSummary {
    fn from(v: &VariantObservation) -> Self {
        Self {
            name: v.name.clone(),
            visitors: v.visitors,
            conversions: v.conversions,
            conversion_rate: v.conversion_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub result_id: Uuid,
    pub method: TestMethod,
    /// z-score or chi-square value, depending on `method`.
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub confidence: f64,
    pub variants: Vec<VariantSummary>,
    /// Relative lift of the second variant over the first, in percent.
    pub lift_percent: Option<f64>,
    /// Interval for the absolute rate difference (second minus first).
    pub confidence_interval: Option<(f64, f64)>,
    pub best_variant: Option<String>,
    pub degrees_of_freedom: Option<u32>,
    pub computed_at: DateTime<Utc>,
}

impl SignificanceResult {
    pub(crate) fn new(
        method: TestMethod,
        statistic: f64,
        p_value: f64,
        confidence: f64,
        variants: &[&VariantObservation],
    ) -> Self {
        Self {
            result_id: Uuid::new_v4(),
            method,
            statistic,
            p_value,
            significant: p_value < 1.0 - confidence,
            confidence,
            variants: variants.iter().map(|v| VariantSummary::from(*v)).collect(),
            lift_percent: None,
            confidence_interval: None,
            best_variant: None,
            degrees_of_freedom: None,
            computed_at: Utc::now(),
        }
    }
}
