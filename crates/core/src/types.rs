use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

// ─── Attribution ────────────────────────────────────────────────────────

/// One customer interaction with a marketing channel before conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub channel: String,
    /// 1-based position within the journey.
    pub sequence_index: u32,
    /// Hours since the journey's first touch. Informational only.
    #[serde(default)]
    pub elapsed_hours: f64,
}

impl Touchpoint {
    pub fn new(channel: impl Into<String>, sequence_index: u32) -> Self {
        Self {
            channel: channel.into(),
            sequence_index,
            elapsed_hours: 0.0,
        }
    }

    pub fn with_elapsed_hours(mut self, hours: f64) -> Self {
        self.elapsed_hours = hours;
        self
    }
}

/// Ordered touchpoints of one customer, ending in a conversion.
///
/// The order of `touchpoints` is authoritative: the first element is the
/// first touch and the last element is the touch right before conversion.
/// `sequence_index` is carried for display and is never used to re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerJourney {
    pub customer_id: String,
    pub touchpoints: Vec<Touchpoint>,
    #[serde(default)]
    pub conversion_value: f64,
}

impl CustomerJourney {
    pub fn new(customer_id: impl Into<String>, touchpoints: Vec<Touchpoint>) -> EngineResult<Self> {
        let journey = Self {
            customer_id: customer_id.into(),
            touchpoints,
            conversion_value: 0.0,
        };
        journey.validate()?;
        Ok(journey)
    }

    /// Build a journey from a channel sequence, numbering positions from 1.
    pub fn from_channels<I, S>(customer_id: impl Into<String>, channels: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let touchpoints = channels
            .into_iter()
            .enumerate()
            .map(|(i, channel)| Touchpoint::new(channel, i as u32 + 1))
            .collect();
        Self::new(customer_id, touchpoints)
    }

    pub fn with_conversion_value(mut self, value: f64) -> Self {
        self.conversion_value = value;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.touchpoints.is_empty() {
            return Err(EngineError::EmptyJourney);
        }
        if let Some(tp) = self.touchpoints.iter().find(|t| t.channel.trim().is_empty()) {
            return Err(EngineError::InvalidParameter(format!(
                "touchpoint {} of customer `{}` has a blank channel",
                tp.sequence_index, self.customer_id
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.touchpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touchpoints.is_empty()
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.touchpoints.iter().map(|t| t.channel.as_str())
    }
}

/// Credit-assignment rule for splitting one conversion across touchpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    #[serde(alias = "First-Touch")]
    FirstTouch,
    #[serde(alias = "Last-Touch")]
    LastTouch,
    #[serde(alias = "Linear")]
    Linear,
    #[serde(alias = "Time-Decay")]
    TimeDecay,
    #[serde(alias = "Position-Based")]
    PositionBased,
}

impl AttributionModel {
    /// Every supported model, in presentation order.
    pub const ALL: &'static [AttributionModel] = &[
        Self::FirstTouch,
        Self::LastTouch,
        Self::Linear,
        Self::TimeDecay,
        Self::PositionBased,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FirstTouch => "First-Touch",
            Self::LastTouch => "Last-Touch",
            Self::Linear => "Linear",
            Self::TimeDecay => "Time-Decay",
            Self::PositionBased => "Position-Based",
        }
    }
}

impl fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AttributionModel {
    type Err = EngineError;

    /// Accepts "First-Touch", "first_touch", "first touch" and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "firsttouch" => Ok(Self::FirstTouch),
            "lasttouch" => Ok(Self::LastTouch),
            "linear" => Ok(Self::Linear),
            "timedecay" => Ok(Self::TimeDecay),
            "positionbased" | "ushaped" => Ok(Self::PositionBased),
            _ => Err(EngineError::UnknownModel(s.to_string())),
        }
    }
}

// ─── Experimentation ────────────────────────────────────────────────────

/// Aggregate visitor and conversion counts for one tested variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantObservation {
    pub name: String,
    pub visitors: u64,
    pub conversions: u64,
}

impl VariantObservation {
    pub fn new(name: impl Into<String>, visitors: u64, conversions: u64) -> Self {
        Self {
            name: name.into(),
            visitors,
            conversions,
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.visitors == 0 {
            0.0
        } else {
            self.conversions as f64 / self.visitors as f64
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.visitors == 0 {
            return Err(EngineError::NonPositiveVisitors(self.name.clone()));
        }
        if self.conversions > self.visitors {
            return Err(EngineError::ConversionsExceedVisitors {
                variant: self.name.clone(),
                conversions: self.conversions,
                visitors: self.visitors,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parsing_accepts_common_spellings() {
        assert_eq!(
            "Position-Based".parse::<AttributionModel>().unwrap(),
            AttributionModel::PositionBased
        );
        assert_eq!(
            "position_based".parse::<AttributionModel>().unwrap(),
            AttributionModel::PositionBased
        );
        assert_eq!(
            "U-Shaped".parse::<AttributionModel>().unwrap(),
            AttributionModel::PositionBased
        );
        assert_eq!(
            "first touch".parse::<AttributionModel>().unwrap(),
            AttributionModel::FirstTouch
        );
        assert_eq!(
            "TIME-DECAY".parse::<AttributionModel>().unwrap(),
            AttributionModel::TimeDecay
        );
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = "Markov".parse::<AttributionModel>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownModel(ref name) if name == "Markov"));
    }

    #[test]
    fn test_model_display_round_trips_through_parse() {
        for model in AttributionModel::ALL {
            assert_eq!(model.to_string().parse::<AttributionModel>().unwrap(), *model);
        }
    }

    #[test]
    fn test_model_serde_accepts_display_alias() {
        let model: AttributionModel = serde_json::from_str("\"Last-Touch\"").unwrap();
        assert_eq!(model, AttributionModel::LastTouch);
        assert_eq!(
            serde_json::to_string(&AttributionModel::TimeDecay).unwrap(),
            "\"time_decay\""
        );
    }

    #[test]
    fn test_journey_from_channels_numbers_positions() {
        let journey = CustomerJourney::from_channels("c1", ["Social", "Email", "Direct"]).unwrap();
        let indices: Vec<u32> = journey.touchpoints.iter().map(|t| t.sequence_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(journey.channels().collect::<Vec<_>>(), vec!["Social", "Email", "Direct"]);
    }

    #[test]
    fn test_empty_journey_rejected() {
        let err = CustomerJourney::new("c1", vec![]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyJourney));
    }

    #[test]
    fn test_blank_channel_rejected() {
        let err = CustomerJourney::from_channels("c1", ["Email", "  "]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_variant_validation() {
        assert!(VariantObservation::new("A", 100, 10).validate().is_ok());
        assert!(matches!(
            VariantObservation::new("A", 0, 0).validate(),
            Err(EngineError::NonPositiveVisitors(_))
        ));
        assert!(matches!(
            VariantObservation::new("A", 10, 11).validate(),
            Err(EngineError::ConversionsExceedVisitors { .. })
        ));
    }

    #[test]
    fn test_conversion_rate_zero_visitors() {
        assert_eq!(VariantObservation::new("A", 0, 0).conversion_rate(), 0.0);
        assert!((VariantObservation::new("A", 1000, 50).conversion_rate() - 0.05).abs() < 1e-12);
    }
}
