//! Experiment significance testing — two-proportion z-tests for A/B tests,
//! chi-square tests of independence for A/B/n tests, and sample-size planning.

pub mod multivariant;
pub mod result;
pub mod sample_size;
pub mod stats;
pub mod tester;
pub mod two_variant;

pub use multivariant::{compare_to_control, test_multivariant};
pub use result::{SignificanceResult, TestMethod, VariantSummary};
pub use sample_size::{required_sample_size, SamplePlan, SampleSizePlanner};
pub use tester::SignificanceTester;
pub use two_variant::test_two_variant;
