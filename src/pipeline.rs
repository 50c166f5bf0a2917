// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end ranking pipeline
//!
//! load -> aggregate -> merge -> filter -> normalize -> score. A run is a
//! pure function of its inputs; writing the result is left to [`crate::output`].

use crate::aggregate::aggregate;
use crate::config::{Config, ScoringParams};
use crate::error::Result;
use crate::filter::filter_eligible;
use crate::loader::{load_all, Datasets};
use crate::merge::merge;
use crate::normalize::normalize;
use crate::score::rank;
use crate::types::{Metric, RankedProject};
use tracing::info;

/// Counts describing one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Projects in the base population
    pub total: usize,
    /// Projects passing every threshold (and therefore ranked)
    pub ranked: usize,
}

/// The ranked table and its column layout
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rows ordered by descending score
    pub rows: Vec<RankedProject>,
    /// Original metric columns retained in the output, canonical order
    pub metric_columns: Vec<Metric>,
    /// Metrics with a `normalized_<metric>` column, canonical order
    pub normalized_columns: Vec<Metric>,
    /// Size of the base population before filtering
    pub total_projects: usize,
}

impl Ranking {
    /// Whether any ranked project carries a display name
    #[must_use]
    pub fn has_display_name(&self) -> bool {
        self.rows.iter().any(|r| r.record.display_name.is_some())
    }

    /// Counts for reporting
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total_projects,
            ranked: self.rows.len(),
        }
    }
}

/// Load every input named by `config` and rank it
pub fn run(config: &Config) -> Result<Ranking> {
    let params = &config.model.parameters;
    params.validate()?;
    let datasets = load_all(config)?;
    Ok(rank_datasets(&datasets, params))
}

/// Rank already-loaded datasets
#[must_use]
pub fn rank_datasets(datasets: &Datasets, params: &ScoringParams) -> Ranking {
    params.warn_unrecognized();

    let dependency = aggregate(&datasets.dependency.events, params);
    let merged = merge(datasets, &dependency);
    let total_projects = merged.len();

    let scored = params.referenced_metrics();
    let mut metric_columns = merged.columns.clone();
    metric_columns.extend(scored.iter().copied());

    let eligible = filter_eligible(merged.records, params);
    let normalized = normalize(eligible, &scored);
    let rows = rank(normalized, params);

    info!("Ranking complete: {} of {} projects ranked", rows.len(), total_projects);

    Ranking {
        rows,
        metric_columns: metric_columns.into_iter().collect(),
        normalized_columns: scored.into_iter().collect(),
        total_projects,
    }
}
