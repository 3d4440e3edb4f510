//! Seeded synthetic journeys for demos and for exercising the attribution
//! models on realistic-looking paths.

use conversion_core::config::AttributionConfig;
use conversion_core::{CustomerJourney, EngineError, EngineResult, Touchpoint};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default channel catalogue with relative touch frequencies.
const DEFAULT_CHANNELS: &[(&str, f64)] = &[
    ("Social Media", 0.25),
    ("Email", 0.20),
    ("Paid Search", 0.20),
    ("Organic Search", 0.15),
    ("Display", 0.10),
    ("Direct", 0.10),
];

pub struct SampleJourneyGenerator {
    rng: StdRng,
    channels: Vec<String>,
    picker: WeightedIndex<f64>,
    max_touchpoints: usize,
}

impl SampleJourneyGenerator {
    pub fn new(seed: u64, max_touchpoints: usize) -> EngineResult<Self> {
        let channels = DEFAULT_CHANNELS
            .iter()
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect();
        Self::with_channels(seed, max_touchpoints, channels)
    }

    pub fn from_config(config: &AttributionConfig) -> EngineResult<Self> {
        Self::new(config.sample_seed, config.max_touchpoints)
    }

    pub fn with_channels(
        seed: u64,
        max_touchpoints: usize,
        channels: Vec<(String, f64)>,
    ) -> EngineResult<Self> {
        if max_touchpoints == 0 {
            return Err(EngineError::InvalidParameter(
                "max_touchpoints must be at least 1".to_string(),
            ));
        }
        let picker = WeightedIndex::new(channels.iter().map(|(_, w)| *w))
            .map_err(|e| EngineError::InvalidParameter(format!("channel weights: {e}")))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            channels: channels.into_iter().map(|(name, _)| name).collect(),
            picker,
            max_touchpoints,
        })
    }

    /// Generate `customers` converted journeys with ids `cust-0001`, ...
    pub fn generate(&mut self, customers: usize) -> Vec<CustomerJourney> {
        (1..=customers).map(|i| self.journey(i)).collect()
    }

    fn journey(&mut self, n: usize) -> CustomerJourney {
        let len = self.rng.gen_range(1..=self.max_touchpoints);
        let mut elapsed: f64 = 0.0;
        let touchpoints = (0..len)
            .map(|i| {
                if i > 0 {
                    elapsed += self.rng.gen_range(1.0..72.0);
                }
                let channel = &self.channels[self.picker.sample(&mut self.rng)];
                Touchpoint::new(channel.clone(), i as u32 + 1)
                    .with_elapsed_hours((elapsed * 10.0).round() / 10.0)
            })
            .collect();
        let value: f64 = self.rng.gen_range(20.0..500.0);

        CustomerJourney {
            customer_id: format!("cust-{n:04}"),
            touchpoints,
            conversion_value: (value * 100.0).round() / 100.0,
        }
    }
}
