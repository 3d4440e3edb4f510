//! Conversion Lab — command-line front end for multi-touch attribution and
//! experiment significance testing.
//!
//! Reads journeys or variant counts, runs the engines, and prints JSON to
//! stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use conversion_attribution::{
    journeys_from_rows, journeys_to_rows, AttributionCalculator, SampleJourneyGenerator,
    TouchpointRow,
};
use conversion_core::{AttributionModel, CustomerJourney, EngineConfig, VariantObservation};
use conversion_experiments::SignificanceTester;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "conversion-lab")]
#[command(about = "Marketing attribution and experiment significance toolkit")]
#[command(version)]
struct Cli {
    /// Config file name, without extension (default: conversion-lab)
    #[arg(long, global = true, default_value = EngineConfig::DEFAULT_FILE)]
    config: String,

    /// Confidence level for significance tests (overrides config)
    #[arg(long, global = true, env = "CONVERSION_LAB__SIGNIFICANCE__CONFIDENCE")]
    confidence: Option<f64>,

    /// Statistical power for sample sizing (overrides config)
    #[arg(long, global = true, env = "CONVERSION_LAB__SIGNIFICANCE__POWER")]
    power: Option<f64>,

    /// Minimum recommended sample per variant (overrides config)
    #[arg(long, global = true)]
    min_sample_size: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attribute a file of converted journeys and roll credit up by channel
    Attribute {
        /// JSON file holding journeys, or touchpoint rows with --rows
        #[arg(short, long)]
        input: PathBuf,

        /// Input is a flat array of touchpoint rows
        #[arg(long, default_value_t = false)]
        rows: bool,

        /// Attribution model (default: configured model)
        #[arg(short, long, conflicts_with = "all_models")]
        model: Option<String>,

        /// Report every model side by side
        #[arg(long, default_value_t = false)]
        all_models: bool,
    },

    /// Attribute a single journey given as a comma-separated channel path
    Journey {
        /// e.g. "Social Media,Email,Direct"
        #[arg(short, long)]
        channels: String,

        /// Attribution model; every model when omitted
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Two-variant (A/B) significance test
    AbTest {
        #[arg(long)]
        control_visitors: u64,
        #[arg(long)]
        control_conversions: u64,
        #[arg(long)]
        treatment_visitors: u64,
        #[arg(long)]
        treatment_conversions: u64,
    },

    /// Chi-square test across two or more variants
    Multivariant {
        /// Variant as name:visitors:conversions (repeat for each variant)
        #[arg(short, long = "variant", value_parser = parse_variant, required = true)]
        variants: Vec<VariantObservation>,

        /// Also test each variant against the first one
        #[arg(long, default_value_t = false)]
        pairwise: bool,
    },

    /// Required visitors per variant for a target effect
    SampleSize {
        /// Current conversion rate, e.g. 0.05
        #[arg(long)]
        baseline: f64,

        /// Absolute rate change to detect, e.g. 0.01
        #[arg(long)]
        mde: f64,

        #[arg(long, default_value_t = 2)]
        variants: usize,

        /// Daily visitors entering the experiment, for a duration estimate
        #[arg(long)]
        daily_visitors: Option<u64>,
    },

    /// Generate sample converted journeys
    Generate {
        #[arg(short = 'n', long, default_value_t = 100)]
        customers: usize,

        /// Random seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Longest generated path (overrides config)
        #[arg(long)]
        max_touchpoints: Option<usize>,

        /// Emit flat touchpoint rows instead of grouped journeys
        #[arg(long, default_value_t = false)]
        rows: bool,
    },
}

fn parse_variant(s: &str) -> Result<VariantObservation, String> {
    let mut parts = s.rsplitn(3, ':');
    let (Some(conversions), Some(visitors), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected name:visitors:conversions, got '{s}'"));
    };
    let visitors = visitors
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("visitors in '{s}': {e}"))?;
    let conversions = conversions
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("conversions in '{s}': {e}"))?;
    Ok(VariantObservation::new(name.trim(), visitors, conversions))
}

fn parse_model(name: Option<&str>, fallback: AttributionModel) -> anyhow::Result<AttributionModel> {
    match name {
        Some(name) => Ok(name.parse()?),
        None => Ok(fallback),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_journeys(path: &Path, rows: bool) -> anyhow::Result<Vec<CustomerJourney>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let journeys = if rows {
        let rows: Vec<TouchpointRow> = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a touchpoint row array", path.display()))?;
        journeys_from_rows(&rows)?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a journey array", path.display()))?
    };
    Ok(journeys)
}

/// A missing config file means defaults; a file that is present but
/// malformed or out of range is an error.
fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::load_from(&cli.config)
        .with_context(|| format!("invalid configuration '{}'", cli.config))?;
    if let Some(confidence) = cli.confidence {
        config.significance.confidence = confidence;
    }
    if let Some(power) = cli.power {
        config.significance.power = power;
    }
    if let Some(floor) = cli.min_sample_size {
        config.significance.min_sample_size = floor;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conversion_lab=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli)?;
    info!(
        model = %config.attribution.default_model,
        confidence = config.significance.confidence,
        alpha = config.significance.alpha(),
        power = config.significance.power,
        "Configuration loaded"
    );

    let calculator = AttributionCalculator::new(&config.attribution);
    let tester = SignificanceTester::new(&config.significance);

    match cli.command {
        Commands::Attribute {
            input,
            rows,
            model,
            all_models,
        } => {
            let journeys = load_journeys(&input, rows)?;
            info!(journeys = journeys.len(), path = %input.display(), "Journeys loaded");
            if all_models {
                print_json(&calculator.compare_models(&journeys)?)
            } else {
                let model = parse_model(model.as_deref(), calculator.default_model())?;
                print_json(&calculator.attribute_journeys(&journeys, model)?)
            }
        }
        Commands::Journey { channels, model } => {
            let journey =
                CustomerJourney::from_channels("cli", channels.split(',').map(str::trim))?;
            match model {
                Some(name) => {
                    let result = calculator.calculate_named(&journey, &name)?;
                    if let Some((channel, credit)) = result.top_channel() {
                        info!(model = %result.model, channel, credit, "Top channel");
                    }
                    print_json(&result)
                }
                None => {
                    let results = AttributionModel::ALL
                        .iter()
                        .map(|model| calculator.calculate(&journey, *model))
                        .collect::<Result<Vec<_>, _>>()?;
                    print_json(&results)
                }
            }
        }
        Commands::AbTest {
            control_visitors,
            control_conversions,
            treatment_visitors,
            treatment_conversions,
        } => {
            let control = VariantObservation::new("control", control_visitors, control_conversions);
            let treatment =
                VariantObservation::new("treatment", treatment_visitors, treatment_conversions);
            let result = tester.test_two_variant(&control, &treatment)?;
            info!(
                p_value = result.p_value,
                significant = result.significant,
                "A/B test complete"
            );
            print_json(&result)
        }
        Commands::Multivariant { variants, pairwise } => {
            let overall = tester.test_multivariant(&variants)?;
            info!(
                p_value = overall.p_value,
                significant = overall.significant,
                best_variant = ?overall.best_variant,
                "Multivariant test complete"
            );
            if pairwise {
                let comparisons = tester.compare_to_control(&variants)?;
                print_json(&serde_json::json!({
                    "overall": overall,
                    "pairwise": comparisons,
                }))
            } else {
                print_json(&overall)
            }
        }
        Commands::SampleSize {
            baseline,
            mde,
            variants,
            daily_visitors,
        } => print_json(&tester.plan_experiment(baseline, mde, variants, daily_visitors)?),
        Commands::Generate {
            customers,
            seed,
            max_touchpoints,
            rows,
        } => {
            if customers == 0 {
                bail!("--customers must be at least 1");
            }
            let mut generator = SampleJourneyGenerator::new(
                seed.unwrap_or(config.attribution.sample_seed),
                max_touchpoints.unwrap_or(config.attribution.max_touchpoints),
            )?;
            let journeys = generator.generate(customers);
            if rows {
                print_json(&journeys_to_rows(&journeys))
            } else {
                print_json(&journeys)
            }
        }
    }
}
