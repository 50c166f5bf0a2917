// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Min-max normalization over the eligible population

use crate::types::{Metric, NormalizedProject, ProjectRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Observed range of one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

impl Bounds {
    /// Range of `metric` across `records`; `None` for an empty population
    #[must_use]
    pub fn of(records: &[ProjectRecord], metric: Metric) -> Option<Self> {
        records.iter().map(|r| r.value(metric)).fold(None, |acc, v| {
            Some(match acc {
                None => Self { min: v, max: v },
                Some(b) => Self {
                    min: b.min.min(v),
                    max: b.max.max(v),
                },
            })
        })
    }

    /// Rescale `value` into `[0, 1]`; a degenerate range maps everything to 0
    ///
    /// Operands are halved first so a range spanning most of `f64` cannot
    /// overflow to infinity.
    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        if self.max > self.min {
            (value / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        } else {
            0.0
        }
    }
}

/// Normalize each of `metrics` over `records`.
///
/// Bounds come from `records` alone, so pass the eligible population.
/// Metrics a record lacks read as zero.
#[must_use]
pub fn normalize(records: Vec<ProjectRecord>, metrics: &BTreeSet<Metric>) -> Vec<NormalizedProject> {
    let bounds: BTreeMap<Metric, Bounds> = metrics
        .iter()
        .filter_map(|m| Bounds::of(&records, *m).map(|b| (*m, b)))
        .collect();

    for (metric, b) in &bounds {
        debug!("{}: min={} max={}", metric, b.min, b.max);
    }

    records
        .into_iter()
        .map(|record| {
            let normalized = bounds
                .iter()
                .map(|(metric, b)| (*metric, b.scale(record.value(*metric))))
                .collect();
            NormalizedProject { record, normalized }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stars(values: &[f64]) -> Vec<ProjectRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ProjectRecord::new(&format!("p{i}")).with(Metric::Stars, *v))
            .collect()
    }

    fn only(metric: Metric) -> BTreeSet<Metric> {
        BTreeSet::from([metric])
    }

    #[test]
    fn test_min_max_scaling() {
        let out = normalize(stars(&[10.0, 20.0, 30.0]), &only(Metric::Stars));
        let values: Vec<f64> = out.iter().map(|p| p.normalized(Metric::Stars)).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_all_equal_normalizes_to_zero() {
        let out = normalize(stars(&[7.0, 7.0, 7.0]), &only(Metric::Stars));
        assert!(out.iter().all(|p| p.normalized(Metric::Stars) == 0.0));
    }

    #[test]
    fn test_single_row_normalizes_to_zero() {
        let out = normalize(stars(&[42.0]), &only(Metric::Stars));
        assert_eq!(out[0].normalized.get(&Metric::Stars), Some(&0.0));
    }

    #[test]
    fn test_missing_metric_synthesized_as_zero_column() {
        let out = normalize(stars(&[1.0, 2.0]), &only(Metric::GasFee));
        assert!(out.iter().all(|p| p.normalized.get(&Metric::GasFee) == Some(&0.0)));
    }

    #[test]
    fn test_extreme_range_stays_finite() {
        let out = normalize(stars(&[-1e308, 0.0, 1e308]), &only(Metric::Stars));
        let values: Vec<f64> = out.iter().map(|p| p.normalized(Metric::Stars)).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_empty_population() {
        assert!(normalize(Vec::new(), &only(Metric::Stars)).is_empty());
        assert_eq!(Bounds::of(&[], Metric::Stars), None);
    }
}
