//! A/B testing — unpooled two-proportion z-test of a treatment against a
//! control.

use conversion_core::{EngineResult, VariantObservation};
use tracing::debug;

use crate::result::{SignificanceResult, TestMethod};
use crate::stats;

/// Compare `b` (treatment) against `a` (control).
///
/// Degenerate inputs resolve to "no effect" rather than NaN: a zero control
/// rate gives zero lift and a zero standard error gives `z = 0`, `p = 1`.
pub fn test_two_variant(
    a: &VariantObservation,
    b: &VariantObservation,
    confidence: f64,
) -> EngineResult<SignificanceResult> {
    a.validate()?;
    b.validate()?;
    let z_crit = stats::z_critical(confidence)?;

    let rate_a = a.conversion_rate();
    let rate_b = b.conversion_rate();
    let diff = rate_b - rate_a;
    let lift = if rate_a > 0.0 { diff / rate_a * 100.0 } else { 0.0 };

    let se_a = stats::proportion_standard_error(rate_a, a.visitors);
    let se_b = stats::proportion_standard_error(rate_b, b.visitors);
    let se = (se_a * se_a + se_b * se_b).sqrt();
    let z = if se > 0.0 { diff / se } else { 0.0 };
    let p_value = stats::two_tailed_p_value(z)?;

    let margin = z_crit * se;
    let mut result = SignificanceResult::new(
        TestMethod::TwoProportionZ,
        z,
        p_value,
        confidence,
        &[a, b],
    );
    result.lift_percent = Some(lift);
    result.confidence_interval = Some((diff - margin, diff + margin));

    debug!(
        control = %a.name,
        treatment = %b.name,
        z,
        p_value,
        lift,
        significant = result.significant,
        "Two-variant test computed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conversion_core::EngineError;

    #[test]
    fn test_reference_ab_example() {
        let a = VariantObservation::new("A", 1000, 50);
        let b = VariantObservation::new("B", 1000, 65);
        let result = test_two_variant(&a, &b, 0.95).unwrap();

        assert_eq!(result.method, TestMethod::TwoProportionZ);
        assert!((result.lift_percent.unwrap() - 30.0).abs() < 1e-9);
        // SE = sqrt(.05*.95/1000 + .065*.935/1000) = 0.010406
        assert!((result.statistic - 1.4415).abs() < 1e-3);
        assert!((result.p_value - 0.1494).abs() < 1e-3);
        assert!(!result.significant);
        assert_eq!(result.degrees_of_freedom, None);
    }

    #[test]
    fn test_clear_winner_is_significant() {
        let a = VariantObservation::new("control", 10_000, 500);
        let b = VariantObservation::new("treatment", 10_000, 650);
        let result = test_two_variant(&a, &b, 0.95).unwrap();
        assert!(result.statistic > 3.0);
        assert!(result.p_value < 0.001);
        assert!(result.significant);

        let (lo, hi) = result.confidence_interval.unwrap();
        assert!(lo > 0.0 && hi > lo);
        assert!(((lo + hi) / 2.0 - 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_negative_lift() {
        let a = VariantObservation::new("A", 1000, 80);
        let b = VariantObservation::new("B", 1000, 60);
        let result = test_two_variant(&a, &b, 0.95).unwrap();
        assert!((result.lift_percent.unwrap() + 25.0).abs() < 1e-9);
        assert!(result.statistic < 0.0);
    }

    #[test]
    fn test_identical_inputs_show_no_effect() {
        let a = VariantObservation::new("A", 1000, 50);
        let result = test_two_variant(&a, &a.clone(), 0.95).unwrap();
        assert_eq!(result.lift_percent, Some(0.0));
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!(!result.significant);
    }

    #[test]
    fn test_zero_conversions_both_sides() {
        let a = VariantObservation::new("A", 500, 0);
        let b = VariantObservation::new("B", 500, 0);
        let result = test_two_variant(&a, &b, 0.95).unwrap();
        assert_eq!(result.lift_percent, Some(0.0));
        assert!(result.p_value.is_finite());
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!(!result.significant);
    }

    #[test]
    fn test_zero_control_rate_gives_zero_lift() {
        let a = VariantObservation::new("A", 500, 0);
        let b = VariantObservation::new("B", 500, 10);
        let result = test_two_variant(&a, &b, 0.95).unwrap();
        assert_eq!(result.lift_percent, Some(0.0));
        assert!(result.statistic > 0.0);
    }

    #[test]
    fn test_zero_standard_error_with_different_rates() {
        let a = VariantObservation::new("A", 100, 0);
        let b = VariantObservation::new("B", 100, 100);
        let result = test_two_variant(&a, &b, 0.95).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!(!result.significant);
    }

    #[test]
    fn test_stricter_confidence_can_flip_verdict() {
        let a = VariantObservation::new("A", 2000, 100);
        let b = VariantObservation::new("B", 2000, 135);
        let loose = test_two_variant(&a, &b, 0.90).unwrap();
        let strict = test_two_variant(&a, &b, 0.99).unwrap();
        assert!((loose.p_value - strict.p_value).abs() < 1e-12);
        assert!(loose.significant);
        assert!(!strict.significant);
    }

    #[test]
    fn test_invalid_inputs() {
        let ok = VariantObservation::new("A", 100, 5);
        let empty = VariantObservation::new("B", 0, 0);
        assert!(matches!(
            test_two_variant(&ok, &empty, 0.95),
            Err(EngineError::NonPositiveVisitors(ref name)) if name == "B"
        ));

        let over = VariantObservation::new("C", 10, 20);
        assert!(test_two_variant(&over, &ok, 0.95).unwrap_err().is_invalid_argument());

        assert!(test_two_variant(&ok, &ok, 1.5).is_err());
    }
}
