// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Weighted scoring and ranking

use crate::config::ScoringParams;
use crate::types::{Metric, NormalizedProject, RankedProject};
use tracing::info;

/// Weighted sum of normalized metrics; weights need not sum to 1
#[must_use]
pub fn weighted_score(project: &NormalizedProject, weights: &[(Metric, f64)]) -> f64 {
    weights.iter().fold(0.0, |acc, (metric, weight)| {
        acc + project.normalized(*metric) * weight
    })
}

/// Score every project and sort by score, highest first.
///
/// The sort is stable: tied projects keep their incoming order.
/// Unrecognized weight entries contribute nothing.
#[must_use]
pub fn rank(projects: Vec<NormalizedProject>, params: &ScoringParams) -> Vec<RankedProject> {
    let weights = params.recognized_weights();

    let mut ranked: Vec<RankedProject> = projects
        .into_iter()
        .map(|p| {
            let score = weighted_score(&p, &weights);
            RankedProject {
                record: p.record,
                normalized: p.normalized,
                score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    if let Some(top) = ranked.first() {
        info!("Ranked {} projects; top is {} ({:.4})", ranked.len(), top.record.project_id, top.score);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectRecord;
    use std::collections::BTreeMap;

    fn project(id: &str, stars: f64, forks: f64) -> NormalizedProject {
        NormalizedProject {
            record: ProjectRecord::new(id),
            normalized: BTreeMap::from([(Metric::Stars, stars), (Metric::Forks, forks)]),
        }
    }

    #[test]
    fn test_weighted_sum_and_descending_order() {
        let params = ScoringParams::new(&[("stars", 2.0), ("forks", 1.0)], &[]);
        let ranked = rank(
            vec![project("low", 0.0, 0.0), project("high", 1.0, 1.0), project("mid", 0.5, 0.0)],
            &params,
        );

        let order: Vec<&str> = ranked.iter().map(|r| r.record.project_id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
        assert_eq!(ranked[0].score, 3.0);
        assert_eq!(ranked[1].score, 1.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let params = ScoringParams::new(&[("stars", 1.0)], &[]);
        let ranked = rank(
            vec![project("first", 0.5, 0.0), project("second", 0.5, 0.9), project("third", 0.5, 0.1)],
            &params,
        );

        let order: Vec<&str> = ranked.iter().map(|r| r.record.project_id.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unrecognized_weights_ignored() {
        let params = ScoringParams::new(&[("stars", 1.0), ("vibes", 100.0)], &[]);
        let ranked = rank(vec![project("a", 0.25, 1.0)], &params);
        assert_eq!(ranked[0].score, 0.25);
    }

    #[test]
    fn test_unnormalized_metric_contributes_zero() {
        let weights = vec![(Metric::GasFee, 5.0)];
        assert_eq!(weighted_score(&project("a", 1.0, 1.0), &weights), 0.0);
    }
}
