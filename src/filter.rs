// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Eligibility thresholds

use crate::config::{ScoringParams, Threshold};
use crate::types::ProjectRecord;
use tracing::{debug, info};

/// Thresholds `record` fails; empty means eligible.
///
/// Every threshold is evaluated, so the result lists all failures.
#[must_use]
pub fn failed_thresholds<'t>(record: &ProjectRecord, thresholds: &'t [Threshold]) -> Vec<&'t Threshold> {
    thresholds
        .iter()
        .filter(|t| record.value_by_name(&t.metric) < t.floor)
        .collect()
}

/// Whether `record` meets every threshold
#[must_use]
pub fn is_eligible(record: &ProjectRecord, thresholds: &[Threshold]) -> bool {
    failed_thresholds(record, thresholds).is_empty()
}

/// Keep the projects meeting every configured threshold, preserving order
#[must_use]
pub fn filter_eligible(records: Vec<ProjectRecord>, params: &ScoringParams) -> Vec<ProjectRecord> {
    let thresholds = params.thresholds();
    let total = records.len();

    let eligible: Vec<ProjectRecord> = records
        .into_iter()
        .filter(|record| {
            let failed = failed_thresholds(record, &thresholds);
            if !failed.is_empty() {
                debug!(
                    "Excluding {}: below {}",
                    record.project_id,
                    failed
                        .iter()
                        .map(|t| format!("min_{}={}", t.metric, t.floor))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            failed.is_empty()
        })
        .collect();

    info!(
        "{} of {} projects pass {} thresholds",
        eligible.len(),
        total,
        thresholds.len()
    );
    eligible
}
