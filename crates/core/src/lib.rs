//! Shared data model, error taxonomy, and configuration for the Conversion Lab
//! attribution and experimentation engines.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use types::{AttributionModel, CustomerJourney, Touchpoint, VariantObservation};
