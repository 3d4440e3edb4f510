//! Channel roll-ups — attributes a whole set of converted journeys under one
//! model and reports how many conversions and how much revenue each channel
//! earned.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use conversion_core::{AttributionModel, CustomerJourney, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculator::calculate_attribution;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCredit {
    pub channel: String,
    /// Sum of per-journey credits, i.e. fractional conversions.
    pub attributed_conversions: f64,
    /// Sum of credit × journey conversion value.
    pub attributed_value: f64,
    /// Fraction of all conversions credited to this channel.
    pub share: f64,
    pub touchpoints: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAttributionReport {
    pub report_id: Uuid,
    pub model: AttributionModel,
    pub journeys: u64,
    pub total_touchpoints: u64,
    pub total_value: f64,
    /// Sorted by attributed conversions, highest first.
    pub channels: Vec<ChannelCredit>,
    pub computed_at: DateTime<Utc>,
}

impl ChannelAttributionReport {
    pub fn channel(&self, name: &str) -> Option<&ChannelCredit> {
        self.channels.iter().find(|c| c.channel == name)
    }

    pub fn total_credit(&self) -> f64 {
        self.channels.iter().map(|c| c.attributed_conversions).sum()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    credit: f64,
    value: f64,
    touchpoints: u64,
}

/// Attribute every journey under `model` and roll credits up by channel.
pub fn attribute_journeys(
    journeys: &[CustomerJourney],
    model: AttributionModel,
) -> EngineResult<ChannelAttributionReport> {
    if journeys.is_empty() {
        return Err(EngineError::InvalidParameter(
            "at least one journey is required".to_string(),
        ));
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for journey in journeys {
        let result = calculate_attribution(journey, model)?;
        for (channel, credit) in result.credits {
            let tally = tallies.entry(channel).or_default();
            tally.credit += credit;
            tally.value += credit * journey.conversion_value;
        }
        for channel in journey.channels() {
            if let Some(tally) = tallies.get_mut(channel) {
                tally.touchpoints += 1;
            }
        }
    }

    let journey_count = journeys.len() as f64;
    let mut channels: Vec<ChannelCredit> = tallies
        .into_iter()
        .map(|(channel, tally)| ChannelCredit {
            channel,
            attributed_conversions: tally.credit,
            attributed_value: tally.value,
            share: tally.credit / journey_count,
            touchpoints: tally.touchpoints,
        })
        .collect();
    channels.sort_by(|a, b| {
        b.attributed_conversions
            .total_cmp(&a.attributed_conversions)
            .then_with(|| a.channel.cmp(&b.channel))
    });

    let total_touchpoints = journeys.iter().map(|j| j.len() as u64).sum();
    debug!(
        model = %model,
        journeys = journeys.len(),
        channels = channels.len(),
        "Channel attribution rolled up"
    );

    Ok(ChannelAttributionReport {
        report_id: Uuid::new_v4(),
        model,
        journeys: journeys.len() as u64,
        total_touchpoints,
        total_value: journeys.iter().map(|j| j.conversion_value).sum(),
        channels,
        computed_at: Utc::now(),
    })
}

/// One roll-up per supported model, in [`AttributionModel::ALL`] order.
pub fn compare_models(journeys: &[CustomerJourney]) -> EngineResult<Vec<ChannelAttributionReport>> {
    AttributionModel::ALL
        .iter()
        .map(|model| attribute_journeys(journeys, *model))
        .collect()
}
