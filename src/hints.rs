//! Visualization hint heuristics.
//!
//! Coarse text-pattern matching over the raw source line just executed,
//! not semantic analysis. Hints are a UI aid with no correctness guarantee
//! and must stay that way; consumers cannot treat them as ground truth.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::{Variable, VisualizationHint};

static LITERAL_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("literal index pattern"));

/// Annotate the line just executed. Never fails; at worst returns nothing.
pub fn generate(line: &str, variables: &[Variable]) -> Vec<VisualizationHint> {
    let mut hints = Vec::new();

    if line.contains('>') || line.contains('<') {
        let sequence = variables.iter().find(|v| is_sequence_type(&v.type_name));
        hints.push(VisualizationHint {
            kind: "comparison".to_string(),
            elements: literal_indices(line),
            operation: "compare".to_string(),
            details: sequence.map(|v| v.name.clone()),
        });
    }

    if has_assignment(line) && line.contains(',') {
        hints.push(VisualizationHint {
            kind: "swap".to_string(),
            elements: Vec::new(),
            operation: "swap".to_string(),
            details: None,
        });
    }

    hints
}

fn is_sequence_type(type_name: &str) -> bool {
    matches!(type_name, "list" | "tuple")
}

/// Literal integer subscripts appearing in the line, e.g. `arr[0] > arr[1]`.
/// Computed subscripts like `arr[i]` are not recoverable from text.
fn literal_indices(line: &str) -> Vec<usize> {
    LITERAL_INDEX
        .captures_iter(line)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// A bare `=` that is not part of a comparison operator.
fn has_assignment(line: &str) -> bool {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        if next == Some(b'=') || matches!(prev, Some(b'=') | Some(b'<') | Some(b'>') | Some(b'!')) {
            continue;
        }
        return true;
    }
    false
}
