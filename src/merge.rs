// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Left-join of every per-project metric source onto the projects table
//!
//! Joins carry source column names (`star_count`, `developer_id`, ...);
//! renaming to canonical metric names happens once, after the last join.

use crate::aggregate::DependencyMetrics;
use crate::loader::{ContributorTable, Datasets, OnchainTable, ProjectRow};
use crate::types::{Metric, ProjectRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// Source column -> canonical metric, applied once after merging.
///
/// When two source columns map to the same metric, the later entry wins;
/// `developer_connection_count` from dependency data overrides the
/// contributor file.
pub const CANONICAL_RENAMES: &[(&str, Metric)] = &[
    ("star_count", Metric::Stars),
    ("fork_count", Metric::Forks),
    ("developer_id", Metric::Contributors),
    ("developer_connection_count", Metric::Contributors),
    ("dependents", Metric::Dependents),
    ("commit_volume", Metric::CommitVolume),
    ("pull_requests", Metric::PullRequests),
    ("fork_events", Metric::ForkEvents),
    ("unique_committers", Metric::UniqueCommitters),
    ("forks_to_import_ratio", Metric::ForksToImportRatio),
    ("tx_count", Metric::TxCount),
    ("unique_users", Metric::UniqueUsers),
    ("gas_fee", Metric::GasFee),
];

/// One row per base project with every metric column that any source supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    /// Metric columns present after merging, in canonical order
    pub columns: BTreeSet<Metric>,
    /// Records in projects-table order
    pub records: Vec<ProjectRecord>,
}

impl MergedTable {
    /// Number of projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no projects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

type SourceRow = BTreeMap<&'static str, Option<f64>>;

/// Merge all datasets and aggregates into one project-keyed table
#[must_use]
pub fn merge(datasets: &Datasets, dependency: &[DependencyMetrics]) -> MergedTable {
    merge_sources(
        &datasets.projects,
        &datasets.contributors,
        dependency,
        datasets.dependency.connection_counts.as_ref(),
        datasets.onchain.as_ref(),
    )
}

/// Left-join, in order: projects <- contributors <- dependency aggregates <- on-chain.
///
/// The base table is never shrunk and never duplicated. Values a source
/// lacks for a project fill with zero.
#[must_use]
pub fn merge_sources(
    projects: &[ProjectRow],
    contributors: &ContributorTable,
    dependency: &[DependencyMetrics],
    connection_counts: Option<&BTreeMap<String, f64>>,
    onchain: Option<&OnchainTable>,
) -> MergedTable {
    let mut columns: BTreeSet<&'static str> = ["star_count", "fork_count", "developer_id"].into();
    let mut rows: Vec<SourceRow> = projects
        .iter()
        .map(|p| {
            SourceRow::from([
                ("star_count", Some(p.star_count)),
                ("fork_count", Some(p.fork_count)),
            ])
        })
        .collect();

    // contributors
    for (row, project) in rows.iter_mut().zip(projects) {
        row.insert(
            "developer_id",
            contributors.developer_id.get(&project.project_id).copied(),
        );
    }

    // dependency aggregates
    let by_project: HashMap<&str, &DependencyMetrics> =
        dependency.iter().map(|d| (d.project_id.as_str(), d)).collect();
    let mut dependency_columns = vec![
        "dependents",
        "commit_volume",
        "pull_requests",
        "fork_events",
        "unique_committers",
    ];
    if dependency.iter().any(|d| d.forks_to_import_ratio.is_some()) {
        dependency_columns.push("forks_to_import_ratio");
    }
    if connection_counts.is_some() {
        dependency_columns.push("developer_connection_count");
    }
    columns.extend(dependency_columns.iter().copied());

    for (row, project) in rows.iter_mut().zip(projects) {
        for &name in &dependency_columns {
            row.insert(name, None);
        }
        if let Some(aggregate) = by_project.get(project.project_id.as_str()) {
            for (metric, value) in aggregate.values() {
                row.insert(metric.name(), Some(value));
            }
        }
        if let Some(counts) = connection_counts {
            row.insert(
                "developer_connection_count",
                counts.get(&project.project_id).copied(),
            );
        }
    }

    // on-chain
    if let Some(onchain) = onchain {
        columns.extend(["tx_count", "unique_users", "gas_fee"]);
        for (row, project) in rows.iter_mut().zip(projects) {
            let values = onchain.metrics.get(&project.project_id);
            for metric in [Metric::TxCount, Metric::UniqueUsers, Metric::GasFee] {
                row.insert(
                    metric.name(),
                    values.and_then(|v| v.get(&metric)).copied(),
                );
            }
        }
    }

    let known: HashSet<&str> = projects.iter().map(|p| p.project_id.as_str()).collect();
    let unmatched = dependency
        .iter()
        .filter(|d| !known.contains(d.project_id.as_str()))
        .count();
    if unmatched > 0 {
        debug!("{} dependency projects are not in the projects table and were dropped", unmatched);
    }

    let records: Vec<ProjectRecord> = projects
        .iter()
        .zip(rows)
        .map(|(project, row)| canonicalize(project, &row))
        .collect();

    let columns: BTreeSet<Metric> = CANONICAL_RENAMES
        .iter()
        .filter(|(source, _)| columns.contains(source))
        .map(|(_, metric)| *metric)
        .collect();

    info!(
        "Merged {} projects with {} metric columns",
        records.len(),
        columns.len()
    );
    MergedTable { columns, records }
}

/// Rename source columns to canonical metrics and fill nulls with zero
fn canonicalize(project: &ProjectRow, row: &SourceRow) -> ProjectRecord {
    let mut metrics = BTreeMap::new();
    for (source, metric) in CANONICAL_RENAMES {
        match row.get(source) {
            Some(Some(value)) => {
                metrics.insert(*metric, *value);
            }
            Some(None) => {
                metrics.entry(*metric).or_insert(0.0);
            }
            None => {}
        }
    }

    ProjectRecord {
        project_id: project.project_id.clone(),
        display_name: project.display_name.clone(),
        metrics,
    }
}
