//! Distribution helpers shared by the significance tests.

use conversion_core::{EngineError, EngineResult};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

fn standard_normal() -> EngineResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| EngineError::Statistics(e.to_string()))
}

/// Reject anything outside the open interval (0, 1), NaN included.
pub fn check_open_unit(name: &str, value: f64) -> EngineResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter(format!(
            "{name} must be in (0, 1), got {value}"
        )))
    }
}

/// Two-tailed p-value of a standard normal score.
pub fn two_tailed_p_value(z: f64) -> EngineResult<f64> {
    let normal = standard_normal()?;
    Ok((2.0 * normal.sf(z.abs())).clamp(0.0, 1.0))
}

/// Critical z for a two-tailed test at `confidence`, e.g. 1.96 for 0.95.
pub fn z_critical(confidence: f64) -> EngineResult<f64> {
    check_open_unit("confidence", confidence)?;
    let alpha = 1.0 - confidence;
    Ok(standard_normal()?.inverse_cdf(1.0 - alpha / 2.0))
}

/// One-tailed z for the requested power, e.g. 0.8416 for 0.8.
pub fn z_power(power: f64) -> EngineResult<f64> {
    check_open_unit("power", power)?;
    Ok(standard_normal()?.inverse_cdf(power))
}

/// Upper-tail probability of a chi-square statistic.
pub fn chi_square_p_value(statistic: f64, degrees_of_freedom: u32) -> EngineResult<f64> {
    if statistic <= 0.0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| EngineError::Statistics(e.to_string()))?;
    Ok(dist.sf(statistic).clamp(0.0, 1.0))
}

/// Standard error of a sample proportion.
pub fn proportion_standard_error(rate: f64, trials: u64) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    (rate * (1.0 - rate) / trials as f64).sqrt()
}
