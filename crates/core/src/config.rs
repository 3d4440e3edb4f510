use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::types::AttributionModel;

/// Root engine configuration. Loaded from an optional `conversion-lab.toml`
/// and environment variables with the prefix `CONVERSION_LAB__`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub significance: SignificanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_model")]
    pub default_model: AttributionModel,
    /// Seed for the sample journey generator.
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,
    #[serde(default = "default_max_touchpoints")]
    pub max_touchpoints: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignificanceConfig {
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_power")]
    pub power: f64,
    /// Floor applied to every required-sample-size estimate.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
}

// Default functions
fn default_model() -> AttributionModel {
    AttributionModel::Linear
}
fn default_sample_seed() -> u64 {
    42
}
fn default_max_touchpoints() -> usize {
    6
}
fn default_confidence() -> f64 {
    0.95
}
fn default_power() -> f64 {
    0.8
}
fn default_min_sample_size() -> u64 {
    30
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            sample_seed: default_sample_seed(),
            max_touchpoints: default_max_touchpoints(),
        }
    }
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            power: default_power(),
            min_sample_size: default_min_sample_size(),
        }
    }
}

impl SignificanceConfig {
    /// Two-sided significance level implied by `confidence`.
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attribution: AttributionConfig::default(),
            significance: SignificanceConfig::default(),
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_FILE: &'static str = "conversion-lab";

    /// Load configuration from `conversion-lab.toml` (if present) and
    /// environment variables, environment taking precedence.
    pub fn load() -> EngineResult<Self> {
        Self::load_from(Self::DEFAULT_FILE)
    }

    pub fn load_from(path: &str) -> EngineResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CONVERSION_LAB")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            model = %config.attribution.default_model,
            confidence = config.significance.confidence,
            power = config.significance.power,
            "Engine configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let sig = &self.significance;
        if !(sig.confidence > 0.0 && sig.confidence < 1.0) {
            return Err(EngineError::InvalidParameter(format!(
                "confidence must be in (0, 1), got {}",
                sig.confidence
            )));
        }
        if !(sig.power > 0.0 && sig.power < 1.0) {
            return Err(EngineError::InvalidParameter(format!(
                "power must be in (0, 1), got {}",
                sig.power
            )));
        }
        if self.attribution.max_touchpoints == 0 {
            return Err(EngineError::InvalidParameter(
                "max_touchpoints must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
