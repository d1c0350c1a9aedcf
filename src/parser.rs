//! Script output parsing.
//!
//! Each output line is either a bare number or
//! `<number>|<key1>=<value1>,<key2>=<value2>,...`.

use tracing::debug;

use crate::check::LabelSet;

/// Separator between the value and the label list.
const VALUE_SEPARATOR: char = '|';

/// Separator between label pairs.
const LABEL_SEPARATOR: char = ',';

/// One parsed line of script output.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub labels: LabelSet,
}

/// Parse a single non-empty output line.
///
/// A value that does not parse as a float yields `0.0`. Label pairs are split
/// on the first `=` only; pairs without `=` or with an empty name are dropped.
pub fn parse_line(line: &str) -> Observation {
    let (raw_value, raw_labels) = match line.split_once(VALUE_SEPARATOR) {
        Some((value, labels)) => (value, Some(labels)),
        None => (line, None),
    };

    let mut labels = LabelSet::new();
    if let Some(raw_labels) = raw_labels {
        for pair in raw_labels.split(LABEL_SEPARATOR) {
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    labels.insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => {
                    if !pair.trim().is_empty() {
                        debug!(pair = %pair, "ignoring malformed label pair");
                    }
                }
            }
        }
    }

    Observation {
        value: parse_value(raw_value),
        labels,
    }
}

/// Parse a complete script result, one observation per non-empty line.
pub fn parse_output(output: &str) -> Vec<Observation> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_value(raw: &str) -> f64 {
    let raw = raw.trim();
    raw.parse::<f64>().unwrap_or_else(|_| {
        debug!(value = %raw, "unparsable metric value, using 0");
        0.0
    })
}
