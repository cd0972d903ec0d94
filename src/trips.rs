//! Resolves where each passenger's trip starts and ends from its segments.
//!
//! Segments are grouped by order number and passenger. Within a group every
//! segment is an edge from its boarding-pass origin to its destination; the
//! trip origin is the airport nothing flies into and the trip destination is
//! the airport nothing flies out of.

use std::collections::HashMap;

use tracing::{error, warn};

use crate::{
    columns::{BP_DESTINATION, BP_ORIGIN, ORDER_NUMBER, PASSENGER, TRIP_DESTINATION, TRIP_ORIGIN},
    error::{Error, Result},
    records::{Table, Value},
};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, PartialEq, Default, Clone)]
pub struct TripEndpoints {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

type TripKey = (Option<String>, Option<String>);

/// Appends `Trip Origin` and `Trip Destination` to every segment row.
pub fn assign_trip_endpoints(table: &mut Table) -> Result<()> {
    let missing: Vec<&'static str> = [ORDER_NUMBER, PASSENGER, BP_ORIGIN, BP_DESTINATION]
        .into_iter()
        .filter(|column| !table.has_column(column))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            table: "trip segment",
            columns: missing,
        });
    }

    let text = |row: usize, column: &str| -> Option<String> {
        table
            .get(row, column)
            .and_then(Value::non_empty_text)
            .map(|s| s.into_owned())
    };

    let mut order: Vec<TripKey> = Vec::new();
    let mut trips: HashMap<TripKey, Vec<usize>> = HashMap::new();
    for row in 0..table.len() {
        let key = (text(row, ORDER_NUMBER), text(row, PASSENGER));
        trips
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(row);
    }

    let mut origins = vec![Value::Null; table.len()];
    let mut destinations = vec![Value::Null; table.len()];

    for key in &order {
        let rows = &trips[key];
        let segments: Vec<_> = rows
            .iter()
            .map(|&row| (text(row, BP_ORIGIN), text(row, BP_DESTINATION)))
            .collect();

        let label = TripLabel::from(key);
        let endpoints = determine_trip_endpoints(&segments, &label);

        for &row in rows {
            origins[row] = Value::from(endpoints.origin.as_deref().unwrap_or(UNKNOWN));
            destinations[row] = Value::from(endpoints.destination.as_deref().unwrap_or(UNKNOWN));
        }
    }

    table.add_column(TRIP_ORIGIN, origins);
    table.add_column(TRIP_DESTINATION, destinations);

    Ok(())
}

struct TripLabel<'a> {
    order: &'a str,
    passenger: &'a str,
}

impl<'a> From<&'a TripKey> for TripLabel<'a> {
    fn from((order, passenger): &'a TripKey) -> Self {
        TripLabel {
            order: order.as_deref().unwrap_or_default(),
            passenger: passenger.as_deref().unwrap_or_default(),
        }
    }
}

/// Finds the start and end of a trip from its `(origin, destination)` segments.
/// Segments missing either end are skipped.
fn determine_trip_endpoints(
    segments: &[(Option<String>, Option<String>)],
    label: &TripLabel<'_>,
) -> TripEndpoints {
    // Nodes in first-seen order so ties resolve deterministically.
    let mut nodes: Vec<&str> = Vec::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut out_degree: HashMap<&str, usize> = HashMap::new();

    for segment in segments {
        let (Some(origin), Some(destination)) = (segment.0.as_deref(), segment.1.as_deref()) else {
            warn!(
                "Order {}, Passenger {}: Missing origin or destination in segment.",
                label.order, label.passenger
            );
            continue;
        };

        for node in [origin, destination] {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        *out_degree.entry(origin).or_default() += 1;
        *in_degree.entry(destination).or_default() += 1;
    }

    let trip_origins: Vec<&str> = nodes
        .iter()
        .copied()
        .filter(|n| in_degree.get(n).copied().unwrap_or_default() == 0)
        .collect();
    let trip_destinations: Vec<&str> = nodes
        .iter()
        .copied()
        .filter(|n| out_degree.get(n).copied().unwrap_or_default() == 0)
        .collect();

    TripEndpoints {
        origin: pick_endpoint(&trip_origins, "origin", label),
        destination: pick_endpoint(&trip_destinations, "destination", label),
    }
}

fn pick_endpoint(candidates: &[&str], kind: &str, label: &TripLabel<'_>) -> Option<String> {
    match candidates {
        [] => {
            error!(
                "Order {}, Passenger {}: No trip {kind} found.",
                label.order, label.passenger
            );
            None
        }
        [only] => Some((*only).to_owned()),
        [first, ..] => {
            warn!(
                "Order {}, Passenger {}: Multiple trip {kind}s found: {candidates:?}",
                label.order, label.passenger
            );
            Some((*first).to_owned())
        }
    }
}
