//! Conversion credit assignment — splits one conversion across the channels
//! of a single customer journey.

use std::collections::BTreeMap;

use conversion_core::config::AttributionConfig;
use conversion_core::{AttributionModel, CustomerJourney, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rollup::{self, ChannelAttributionReport};

/// Share of the first and of the last touch under position-based attribution.
const EDGE_SHARE: f64 = 0.4;
/// Share split evenly across the middle touches under position-based attribution.
const MIDDLE_SHARE: f64 = 0.2;
/// Each touch weighs this many times the touch before it under time-decay.
const DECAY_BASE: f64 = 2.0;

/// Credit earned by each channel of one journey. Credits sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub customer_id: String,
    pub model: AttributionModel,
    /// Every channel of the journey, including those earning no credit.
    pub credits: BTreeMap<String, f64>,
}

impl AttributionResult {
    pub fn credit(&self, channel: &str) -> f64 {
        self.credits.get(channel).copied().unwrap_or(0.0)
    }

    pub fn total_credit(&self) -> f64 {
        self.credits.values().sum()
    }

    /// Channel with the most credit; ties resolve to the alphabetically first.
    pub fn top_channel(&self) -> Option<(&str, f64)> {
        self.credits
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (channel, &credit)| match best {
                Some((_, best_credit)) if best_credit >= credit => best,
                _ => Some((channel.as_str(), credit)),
            })
    }
}

/// Per-position weights for a journey of `len` touches under `model`.
///
/// Weights are non-negative and sum to 1 for every `len >= 1`. An empty
/// journey has no weights.
pub fn position_weights(model: AttributionModel, len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    match model {
        AttributionModel::FirstTouch => single_touch(len, 0),
        AttributionModel::LastTouch => single_touch(len, len - 1),
        AttributionModel::Linear => vec![1.0 / len as f64; len],
        AttributionModel::TimeDecay => time_decay(len),
        AttributionModel::PositionBased => position_based(len),
    }
}

fn single_touch(len: usize, credited: usize) -> Vec<f64> {
    (0..len)
        .map(|i| if i == credited { 1.0 } else { 0.0 })
        .collect()
}

fn time_decay(len: usize) -> Vec<f64> {
    // 2^(i-1) rescaled by 2^-(len-1), so the last touch weighs 1 and long
    // journeys underflow at the front instead of overflowing at the back.
    let raw: Vec<f64> = (0..len)
        .map(|i| DECAY_BASE.powi(i as i32 - (len as i32 - 1)))
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

fn position_based(len: usize) -> Vec<f64> {
    match len {
        1 => vec![1.0],
        2 => vec![0.5, 0.5],
        _ => {
            let middle = MIDDLE_SHARE / (len - 2) as f64;
            (0..len)
                .map(|i| if i == 0 || i == len - 1 { EDGE_SHARE } else { middle })
                .collect()
        }
    }
}

/// Assign one conversion's credit to the channels of `journey`.
///
/// A channel at several positions earns the sum of those positions' shares.
pub fn calculate_attribution(
    journey: &CustomerJourney,
    model: AttributionModel,
) -> EngineResult<AttributionResult> {
    journey.validate()?;

    let weights = position_weights(model, journey.len());
    let credits = journey
        .channels()
        .zip(weights)
        .fold(BTreeMap::new(), |mut credits, (channel, weight)| {
            *credits.entry(channel.to_string()).or_insert(0.0) += weight;
            credits
        });

    debug!(
        customer_id = %journey.customer_id,
        model = %model,
        touchpoints = journey.len(),
        channels = credits.len(),
        "Attribution computed"
    );

    Ok(AttributionResult {
        customer_id: journey.customer_id.clone(),
        model,
        credits,
    })
}

/// Attribution entry point carrying the configured default model.
#[derive(Debug, Clone)]
pub struct AttributionCalculator {
    default_model: AttributionModel,
}

impl AttributionCalculator {
    pub fn new(config: &AttributionConfig) -> Self {
        Self {
            default_model: config.default_model,
        }
    }

    pub fn default_model(&self) -> AttributionModel {
        self.default_model
    }

    pub fn calculate(
        &self,
        journey: &CustomerJourney,
        model: AttributionModel,
    ) -> EngineResult<AttributionResult> {
        calculate_attribution(journey, model)
    }

    /// Like [`calculate`](Self::calculate), with the model given by name.
    pub fn calculate_named(
        &self,
        journey: &CustomerJourney,
        model_name: &str,
    ) -> EngineResult<AttributionResult> {
        calculate_attribution(journey, model_name.parse()?)
    }

    pub fn calculate_default(&self, journey: &CustomerJourney) -> EngineResult<AttributionResult> {
        calculate_attribution(journey, self.default_model)
    }

    pub fn attribute_journeys(
        &self,
        journeys: &[CustomerJourney],
        model: AttributionModel,
    ) -> EngineResult<ChannelAttributionReport> {
        rollup::attribute_journeys(journeys, model)
    }

    pub fn compare_models(
        &self,
        journeys: &[CustomerJourney],
    ) -> EngineResult<Vec<ChannelAttributionReport>> {
        rollup::compare_models(journeys)
    }
}

impl Default for AttributionCalculator {
    fn default() -> Self {
        Self::new(&AttributionConfig::default())
    }
}
