//! Equality inner join on string keys

use arrow::array::{Array, StringArray, UInt32Array};
use std::collections::HashMap;

/// Row pairs where `left[i] == right[j]`
///
/// Output follows the right side's row order; for each right row the
/// matching left rows come in their own order. Nulls never match.
pub fn inner_join_indices(left: &StringArray, right: &StringArray) -> (UInt32Array, UInt32Array) {
    let mut build: HashMap<&str, Vec<u32>> = HashMap::new();
    for (row, key) in left.iter().enumerate() {
        if let Some(key) = key {
            build.entry(key).or_default().push(row as u32);
        }
    }

    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();

    for row in 0..right.len() {
        if right.is_null(row) {
            continue;
        }
        if let Some(matches) = build.get(right.value(row)) {
            for &left_row in matches {
                left_rows.push(left_row);
                right_rows.push(row as u32);
            }
        }
    }

    (UInt32Array::from(left_rows), UInt32Array::from(right_rows))
}
