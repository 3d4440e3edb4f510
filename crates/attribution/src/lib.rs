//! Multi-touch marketing attribution — per-journey credit assignment,
//! journey-table grouping, channel roll-ups across customers, and a seeded
//! sample journey generator.

pub mod calculator;
pub mod journey_table;
pub mod rollup;
pub mod sample;

pub use calculator::{
    calculate_attribution, position_weights, AttributionCalculator, AttributionResult,
};
pub use journey_table::{journeys_from_rows, journeys_to_rows, TouchpointRow};
pub use rollup::{attribute_journeys, compare_models, ChannelAttributionReport, ChannelCredit};
pub use sample::SampleJourneyGenerator;
