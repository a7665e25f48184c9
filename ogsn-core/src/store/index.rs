//! Ordered secondary indexes over float keys.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Map an `f64` onto a `u64` whose natural order matches the float order.
///
/// Positive values get the sign bit set; negative values are inverted so
/// larger magnitudes sort first. `-0.0` shares the key of `0.0`. NaN never
/// reaches an index.
pub fn ordered_key(value: f64) -> u64 {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    if bits >> 63 == 1 { !bits } else { bits | (1 << 63) }
}

/// Which strength value a scan runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthIndex {
    #[default]
    Median,
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    Ascending,
    #[default]
    Descending,
}

/// `(ordered_key(value), id)` pairs; ties in value order by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct FloatIndex {
    entries: BTreeSet<(u64, i64)>,
}

impl FloatIndex {
    pub(crate) fn insert(&mut self, value: f64, id: i64) {
        self.entries.insert((ordered_key(value), id));
    }

    /// Ids with value `>= min`, in the requested order.
    pub(crate) fn at_least(&self, min: f64, order: ScanOrder) -> Vec<i64> {
        let range = self.entries.range((ordered_key(min), i64::MIN)..);
        match order {
            ScanOrder::Ascending => range.map(|(_, id)| *id).collect(),
            ScanOrder::Descending => range.rev().map(|(_, id)| *id).collect(),
        }
    }
}
