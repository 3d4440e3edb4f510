//! A/B/n testing — chi-square test of independence between variant
//! assignment and conversion, plus pairwise comparisons against control.

use conversion_core::{EngineError, EngineResult, VariantObservation};
use tracing::debug;

use crate::result::{SignificanceResult, TestMethod};
use crate::stats;
use crate::two_variant::test_two_variant;

pub(crate) fn validate_variants(variants: &[VariantObservation]) -> EngineResult<()> {
    if variants.len() < 2 {
        return Err(EngineError::InsufficientVariants {
            found: variants.len(),
        });
    }
    variants.iter().try_for_each(VariantObservation::validate)
}

/// Pearson contribution of one cell; empty expected cells contribute nothing.
fn cell(observed: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        (observed - expected).powi(2) / expected
    } else {
        0.0
    }
}

/// Index of the highest conversion rate; ties go to the earliest variant.
fn best_index(variants: &[VariantObservation]) -> usize {
    variants
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_rate), (i, v)| {
            let rate = v.conversion_rate();
            if rate > best_rate {
                (i, rate)
            } else {
                (best, best_rate)
            }
        })
        .0
}

/// Chi-square test over a 2×K table of conversions and non-conversions.
pub fn test_multivariant(
    variants: &[VariantObservation],
    confidence: f64,
) -> EngineResult<SignificanceResult> {
    validate_variants(variants)?;
    stats::check_open_unit("confidence", confidence)?;

    let total_visitors: u64 = variants.iter().map(|v| v.visitors).sum();
    let total_conversions: u64 = variants.iter().map(|v| v.conversions).sum();
    let pooled_rate = total_conversions as f64 / total_visitors as f64;

    let chi_square: f64 = variants
        .iter()
        .map(|v| {
            let visitors = v.visitors as f64;
            let converted = v.conversions as f64;
            let expected_converted = visitors * pooled_rate;
            cell(converted, expected_converted)
                + cell(visitors - converted, visitors - expected_converted)
        })
        .sum();
    let degrees_of_freedom = (variants.len() - 1) as u32;
    let p_value = stats::chi_square_p_value(chi_square, degrees_of_freedom)?;

    let refs: Vec<&VariantObservation> = variants.iter().collect();
    let mut result = SignificanceResult::new(
        TestMethod::ChiSquareIndependence,
        chi_square,
        p_value,
        confidence,
        &refs,
    );
    result.degrees_of_freedom = Some(degrees_of_freedom);
    result.best_variant = Some(variants[best_index(variants)].name.clone());

    debug!(
        variants = variants.len(),
        chi_square,
        p_value,
        best_variant = ?result.best_variant,
        significant = result.significant,
        "Multivariant test computed"
    );
    Ok(result)
}

/// Two-variant test of every other variant against the first (control).
pub fn compare_to_control(
    variants: &[VariantObservation],
    confidence: f64,
) -> EngineResult<Vec<SignificanceResult>> {
    validate_variants(variants)?;
    let control = &variants[0];
    variants[1..]
        .iter()
        .map(|treatment| test_two_variant(control, treatment, confidence))
        .collect()
}
