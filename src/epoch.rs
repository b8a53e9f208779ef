//! Epoch grouping: splits a time ordered observation stream
//! into disjoint epochs.
use crate::{constants::Framing, observation::Observation, prelude::Duration};

/// [EpochGrouper] walks a time ordered slice of [Observation]s once and
/// yields maximal runs whose timestamps lie within the tolerance of the
/// first record of the run. Boundaries only depend on elapsed time.
#[derive(Debug, Clone)]
pub struct EpochGrouper<'a> {
    records: &'a [Observation],
    tolerance_s: f64,
    cursor: usize,
}

impl<'a> EpochGrouper<'a> {
    /// Creates an [EpochGrouper] using the default tolerance
    /// ([Framing::DTTOL]).
    pub fn new(records: &'a [Observation]) -> Self {
        Self {
            records,
            tolerance_s: Framing::DTTOL,
            cursor: 0,
        }
    }

    /// Copies and returns [EpochGrouper] with a custom tolerance.
    pub fn with_tolerance(&self, tolerance: Duration) -> Self {
        let mut s = self.clone();
        s.tolerance_s = tolerance.to_seconds();
        s
    }

    /// Index of the first record of the next epoch
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for EpochGrouper<'a> {
    type Item = &'a [Observation];
    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor;
        let first = self.records.get(start)?;

        let mut end = start + 1;
        while end < self.records.len() {
            let dt = (self.records[end].epoch - first.epoch).to_seconds();
            if dt > self.tolerance_s {
                break;
            }
            end += 1;
        }

        self.cursor = end;
        Some(&self.records[start..end])
    }
}
