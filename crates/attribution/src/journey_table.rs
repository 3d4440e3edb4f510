//! Journey tables — converts between the flat one-row-per-touchpoint layout
//! that uploaded and generated datasets use and grouped customer journeys.

use std::collections::HashMap;

use conversion_core::{CustomerJourney, EngineError, EngineResult, Touchpoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchpointRow {
    pub customer_id: String,
    pub channel: String,
    pub sequence_index: u32,
    #[serde(default)]
    pub elapsed_hours: f64,
    #[serde(default)]
    pub conversion_value: f64,
}

/// Group rows into journeys.
///
/// Customers come out in order of first appearance and each customer's
/// touchpoints keep their row order; `sequence_index` is not used to sort.
/// A customer's conversion value is the largest value on any of its rows.
pub fn journeys_from_rows(rows: &[TouchpointRow]) -> EngineResult<Vec<CustomerJourney>> {
    let mut journeys: Vec<CustomerJourney> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        if row.customer_id.trim().is_empty() {
            return Err(EngineError::InvalidParameter(format!(
                "row for channel `{}` has a blank customer_id",
                row.channel
            )));
        }
        let slot = *index.entry(row.customer_id.as_str()).or_insert_with(|| {
            journeys.push(CustomerJourney {
                customer_id: row.customer_id.clone(),
                touchpoints: Vec::new(),
                conversion_value: row.conversion_value,
            });
            journeys.len() - 1
        });
        let journey = &mut journeys[slot];
        journey.conversion_value = journey.conversion_value.max(row.conversion_value);
        journey.touchpoints.push(
            Touchpoint::new(row.channel.clone(), row.sequence_index)
                .with_elapsed_hours(row.elapsed_hours),
        );
    }

    for journey in &journeys {
        journey.validate()?;
    }
    Ok(journeys)
}

/// Flatten journeys back into one row per touchpoint.
pub fn journeys_to_rows(journeys: &[CustomerJourney]) -> Vec<TouchpointRow> {
    journeys
        .iter()
        .flat_map(|journey| {
            journey.touchpoints.iter().map(move |tp| TouchpointRow {
                customer_id: journey.customer_id.clone(),
                channel: tp.channel.clone(),
                sequence_index: tp.sequence_index,
                elapsed_hours: tp.elapsed_hours,
                conversion_value: journey.conversion_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(customer: &str, channel: &str, seq: u32, value: f64) -> TouchpointRow {
        TouchpointRow {
            customer_id: customer.to_string(),
            channel: channel.to_string(),
            sequence_index: seq,
            elapsed_hours: 0.0,
            conversion_value: value,
        }
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let rows = vec![
            row("b", "Social", 1, 0.0),
            row("a", "Email", 1, 0.0),
            row("b", "Direct", 2, 80.0),
            row("a", "Direct", 2, 20.0),
        ];
        let journeys = journeys_from_rows(&rows).unwrap();
        assert_eq!(journeys.len(), 2);
        assert_eq!(journeys[0].customer_id, "b");
        assert_eq!(journeys[0].channels().collect::<Vec<_>>(), vec!["Social", "Direct"]);
        assert!((journeys[0].conversion_value - 80.0).abs() < 1e-9);
        assert_eq!(journeys[1].customer_id, "a");
    }

    #[test]
    fn test_row_order_is_authoritative() {
        // Out-of-order indices are kept as given.
        let rows = vec![row("a", "Direct", 2, 0.0), row("a", "Social", 1, 0.0)];
        let journeys = journeys_from_rows(&rows).unwrap();
        assert_eq!(journeys[0].channels().collect::<Vec<_>>(), vec!["Direct", "Social"]);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let err = journeys_from_rows(&[row(" ", "Email", 1, 0.0)]).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = journeys_from_rows(&[row("a", "", 1, 0.0)]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_rows_round_trip() {
        let rows = vec![
            row("a", "Social", 1, 30.0),
            row("a", "Email", 2, 30.0),
            row("b", "Direct", 1, 5.0),
        ];
        let journeys = journeys_from_rows(&rows).unwrap();
        assert_eq!(journeys_to_rows(&journeys), rows);
    }

    #[test]
    fn test_rows_deserialize_with_defaults() {
        let rows: Vec<TouchpointRow> = serde_json::from_str(
            r#"[{"customer_id": "a", "channel": "Email", "sequence_index": 1}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].elapsed_hours, 0.0);
        assert_eq!(rows[0].conversion_value, 0.0);
    }
}
