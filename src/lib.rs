// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Retrorank library - weighted heuristic ranking of candidate projects
//!
//! This crate provides the batch scoring pipeline used to rank projects for
//! retro funding: loading heterogeneous metric sources, aggregating dependency
//! events, merging everything into one project-keyed table, filtering by
//! thresholds, min-max normalization and a weighted sum.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod score;
pub mod table;

/// Core data types shared by every pipeline stage
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Canonical metric names recognized by the scorer.
    ///
    /// Declaration order is the column order used in the rankings output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Metric {
        /// Repository stars
        Stars,
        /// Repository forks
        Forks,
        /// Contributor / developer connection count
        Contributors,
        /// Total dependency events recorded for the project
        Dependents,
        /// COMMIT_CODE events
        CommitVolume,
        /// PULL_REQUEST_OPENED events
        PullRequests,
        /// FORKED events
        ForkEvents,
        /// Distinct developers with COMMIT_CODE events
        UniqueCommitters,
        /// `fork_events / (unique_committers + 1)`
        ForksToImportRatio,
        /// On-chain transaction count
        TxCount,
        /// On-chain unique users
        UniqueUsers,
        /// On-chain gas fees
        GasFee,
    }

    impl Metric {
        /// Every recognized metric in canonical order
        pub const ALL: [Metric; 12] = [
            Self::Stars,
            Self::Forks,
            Self::Contributors,
            Self::Dependents,
            Self::CommitVolume,
            Self::PullRequests,
            Self::ForkEvents,
            Self::UniqueCommitters,
            Self::ForksToImportRatio,
            Self::TxCount,
            Self::UniqueUsers,
            Self::GasFee,
        ];

        /// Column name of this metric
        #[must_use]
        pub fn name(&self) -> &'static str {
            match self {
                Self::Stars => "stars",
                Self::Forks => "forks",
                Self::Contributors => "contributors",
                Self::Dependents => "dependents",
                Self::CommitVolume => "commit_volume",
                Self::PullRequests => "pull_requests",
                Self::ForkEvents => "fork_events",
                Self::UniqueCommitters => "unique_committers",
                Self::ForksToImportRatio => "forks_to_import_ratio",
                Self::TxCount => "tx_count",
                Self::UniqueUsers => "unique_users",
                Self::GasFee => "gas_fee",
            }
        }

        /// Look up a metric by its column name
        #[must_use]
        pub fn from_name(name: &str) -> Option<Self> {
            let name = name.trim();
            Self::ALL.iter().copied().find(|m| m.name() == name)
        }

        /// Output column holding the normalized value of this metric
        #[must_use]
        pub fn normalized_column(&self) -> String {
            format!("normalized_{}", self.name())
        }
    }

    impl std::fmt::Display for Metric {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.name())
        }
    }

    // =========================================================================
    // Dependency Events
    // =========================================================================

    /// Categories of dependency event that feed aggregate metrics
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum EventType {
        /// A commit landed in the project
        CommitCode,
        /// A pull request was opened against the project
        PullRequestOpened,
        /// The project was forked
        Forked,
        /// Any other event; counted only towards `dependents`
        Other,
    }

    impl EventType {
        /// Parse an event label, case-insensitively
        #[must_use]
        pub fn from_label(label: &str) -> Self {
            match label.trim().to_ascii_uppercase().as_str() {
                "COMMIT_CODE" => Self::CommitCode,
                "PULL_REQUEST_OPENED" => Self::PullRequestOpened,
                "FORKED" => Self::Forked,
                _ => Self::Other,
            }
        }
    }

    /// One recorded activity attributed to a project and developer
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DependencyEvent {
        /// Project the event belongs to
        pub project_id: String,
        /// Event category
        pub event_type: EventType,
        /// Developer who produced the event (may be empty)
        pub developer_id: String,
    }

    impl DependencyEvent {
        /// Convenience constructor
        #[must_use]
        pub fn new(project_id: &str, event_type: EventType, developer_id: &str) -> Self {
            Self {
                project_id: project_id.into(),
                event_type,
                developer_id: developer_id.into(),
            }
        }
    }

    // =========================================================================
    // Project Records
    // =========================================================================

    /// A project with every metric accumulated across the pipeline
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ProjectRecord {
        /// Unique project key
        pub project_id: String,
        /// Human-readable name, when the projects dataset carries one
        pub display_name: Option<String>,
        /// Metric values; an absent metric reads as zero
        #[serde(default)]
        pub metrics: BTreeMap<Metric, f64>,
    }

    impl ProjectRecord {
        /// Create a record with no metrics
        #[must_use]
        pub fn new(project_id: &str) -> Self {
            Self {
                project_id: project_id.into(),
                display_name: None,
                metrics: BTreeMap::new(),
            }
        }

        /// Builder-style metric setter
        #[must_use]
        pub fn with(mut self, metric: Metric, value: f64) -> Self {
            self.metrics.insert(metric, value);
            self
        }

        /// Value of `metric`, defaulting to zero
        #[must_use]
        pub fn value(&self, metric: Metric) -> f64 {
            self.metrics.get(&metric).copied().unwrap_or(0.0)
        }

        /// Value of a metric by column name; unknown names read as zero
        #[must_use]
        pub fn value_by_name(&self, name: &str) -> f64 {
            Metric::from_name(name).map_or(0.0, |m| self.value(m))
        }
    }

    /// An eligible project together with its normalized metrics
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct NormalizedProject {
        /// The merged record
        pub record: ProjectRecord,
        /// Normalized value per scored metric, in `[0, 1]`
        pub normalized: BTreeMap<Metric, f64>,
    }

    impl NormalizedProject {
        /// Normalized value of `metric`, defaulting to zero
        #[must_use]
        pub fn normalized(&self, metric: Metric) -> f64 {
            self.normalized.get(&metric).copied().unwrap_or(0.0)
        }
    }

    /// Terminal artifact: one scored row of the ranking
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RankedProject {
        /// The merged record
        pub record: ProjectRecord,
        /// Normalized value per scored metric
        pub normalized: BTreeMap<Metric, f64>,
        /// Weighted sum of normalized metrics
        pub score: f64,
    }
}
