// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Per-project aggregation of dependency events

use crate::config::ScoringParams;
use crate::types::{DependencyEvent, EventType, Metric};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Aggregate dependency metrics for one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyMetrics {
    /// Project key
    pub project_id: String,
    /// All events
    pub dependents: u64,
    /// COMMIT_CODE events
    pub commit_volume: u64,
    /// PULL_REQUEST_OPENED events
    pub pull_requests: u64,
    /// FORKED events
    pub fork_events: u64,
    /// Distinct developers among COMMIT_CODE events
    pub unique_committers: u64,
    /// `fork_events / (unique_committers + 1)`, only when requested
    pub forks_to_import_ratio: Option<f64>,
}

impl DependencyMetrics {
    /// Fork events per committer, damped by one
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fork_ratio(&self) -> f64 {
        self.fork_events as f64 / (self.unique_committers as f64 + 1.0)
    }

    /// Metric values this aggregate contributes to a merged record
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn values(&self) -> Vec<(Metric, f64)> {
        let mut values = vec![
            (Metric::Dependents, self.dependents as f64),
            (Metric::CommitVolume, self.commit_volume as f64),
            (Metric::PullRequests, self.pull_requests as f64),
            (Metric::ForkEvents, self.fork_events as f64),
            (Metric::UniqueCommitters, self.unique_committers as f64),
        ];
        if let Some(ratio) = self.forks_to_import_ratio {
            values.push((Metric::ForksToImportRatio, ratio));
        }
        values
    }
}

#[derive(Default)]
struct Accumulator<'a> {
    dependents: u64,
    commit_volume: u64,
    pull_requests: u64,
    fork_events: u64,
    committers: HashSet<&'a str>,
}

/// Collapse raw events into one row per project, ordered by `project_id`.
///
/// Any project with at least one event appears with every aggregate, zero
/// where it had no matching events. Empty developer ids do not count as
/// committers.
#[must_use]
pub fn aggregate(events: &[DependencyEvent], params: &ScoringParams) -> Vec<DependencyMetrics> {
    let mut per_project: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();

    for event in events {
        let acc = per_project.entry(event.project_id.as_str()).or_default();
        acc.dependents += 1;
        match event.event_type {
            EventType::CommitCode => {
                acc.commit_volume += 1;
                if !event.developer_id.is_empty() {
                    acc.committers.insert(event.developer_id.as_str());
                }
            }
            EventType::PullRequestOpened => acc.pull_requests += 1,
            EventType::Forked => acc.fork_events += 1,
            EventType::Other => {}
        }
    }

    let with_ratio = params.references(Metric::ForksToImportRatio);

    let rows: Vec<DependencyMetrics> = per_project
        .into_iter()
        .map(|(project_id, acc)| {
            let mut row = DependencyMetrics {
                project_id: project_id.to_string(),
                dependents: acc.dependents,
                commit_volume: acc.commit_volume,
                pull_requests: acc.pull_requests,
                fork_events: acc.fork_events,
                unique_committers: acc.committers.len() as u64,
                forks_to_import_ratio: None,
            };
            if with_ratio {
                row.forks_to_import_ratio = Some(row.fork_ratio());
            }
            row
        })
        .collect();

    debug!(
        "Aggregated {} events into {} projects",
        events.len(),
        rows.len()
    );
    rows
}
