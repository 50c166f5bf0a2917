// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dataset loading and column reconciliation
//!
//! Upstream files disagree on column names. Every alias is declared here, in
//! one place, and mapped to a canonical name before any later stage sees it.

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::table::Table;
use crate::types::{DependencyEvent, EventType, Metric};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Accepted spellings of the project key column
pub const PROJECT_KEY_ALIASES: &[&str] = &["project_id", "ProjectID", "projectid", "ProjectId"];

/// Accepted spellings of the per-project developer count column
pub const DEVELOPER_COUNT_ALIASES: &[&str] = &[
    "developer_id",
    "contributor_count",
    "developers",
    "developer_connection_count",
];

/// Column carrying an authoritative contributor count in dependency data
pub const CONNECTION_COUNT_COLUMN: &str = "developer_connection_count";

/// Optional on-chain columns and the spellings accepted for each
pub const ONCHAIN_COLUMNS: &[(Metric, &[&str])] = &[
    (Metric::TxCount, &["tx_count", "transaction_count", "txs"]),
    (Metric::UniqueUsers, &["unique_users", "active_users", "unique_addresses"]),
    (Metric::GasFee, &["gas_fee", "gas_fees", "total_gas_fee"]),
];

const DISPLAY_NAME_ALIASES: &[&str] = &["display_name", "name", "project_name"];
const STAR_ALIASES: &[&str] = &["star_count", "stars"];
const FORK_ALIASES: &[&str] = &["fork_count", "forks"];
const EVENT_TYPE_ALIASES: &[&str] = &["event_type", "type", "EventType"];
const DEVELOPER_ALIASES: &[&str] = &["developer_id", "DeveloperID", "developer", "user_id"];

/// One row of the projects dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    /// Project key
    pub project_id: String,
    /// Optional human-readable name
    pub display_name: Option<String>,
    /// Raw `star_count`
    pub star_count: f64,
    /// Raw `fork_count`
    pub fork_count: f64,
    /// Zero-based data row this project was read from
    pub source_row: usize,
}

/// Per-project developer counts keyed by project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributorTable {
    /// `project_id` -> `developer_id` (a count)
    pub developer_id: BTreeMap<String, f64>,
}

/// Dependency events plus any authoritative connection counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyDataset {
    /// Raw events
    pub events: Vec<DependencyEvent>,
    /// `developer_connection_count` per project, when the file carries it
    pub connection_counts: Option<BTreeMap<String, f64>>,
}

/// Optional on-chain metrics keyed by project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnchainTable {
    /// `project_id` -> metric -> value; every expected column is present
    pub metrics: BTreeMap<String, BTreeMap<Metric, f64>>,
}

/// Everything the pipeline reads from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    /// Base population
    pub projects: Vec<ProjectRow>,
    /// Contributor counts
    pub contributors: ContributorTable,
    /// Dependency events
    pub dependency: DependencyDataset,
    /// On-chain metrics, if configured
    pub onchain: Option<OnchainTable>,
}

/// Load every dataset named by `config`
pub fn load_all(config: &Config) -> Result<Datasets> {
    let projects = load_projects(&config.projects_path())?;
    let contributors = load_contributors(&config.contributor_path(), &projects)?;
    let dependency = load_dependency_events(&config.dependency_path())?;
    let onchain = match config.onchain_path() {
        Some(path) => load_onchain(&path)?,
        None => None,
    };

    Ok(Datasets {
        projects,
        contributors,
        dependency,
        onchain,
    })
}

fn require_file(path: &Path, role: &'static str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingFile {
            role,
            path: path.to_path_buf(),
        })
    }
}

fn project_key(table: &Table, dataset: &'static str) -> Result<usize> {
    table
        .find_column(PROJECT_KEY_ALIASES)
        .ok_or(PipelineError::Schema {
            dataset,
            column: "project_id",
        })
}

/// Load the projects dataset, the base population of the ranking
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRow>> {
    require_file(path, "projects")?;
    let table = Table::read(path)?;
    projects_from_table(&table)
}

/// Build project rows from an already-parsed table.
///
/// Rows with an empty key are skipped; repeated keys keep the first row.
pub fn projects_from_table(table: &Table) -> Result<Vec<ProjectRow>> {
    let key = project_key(table, "projects")?;
    let name = table.find_column(DISPLAY_NAME_ALIASES);
    let stars = table.find_column(STAR_ALIASES);
    let forks = table.find_column(FORK_ALIASES);

    if stars.is_none() {
        warn!("Projects dataset has no star_count column; stars default to 0");
    }
    if forks.is_none() {
        warn!("Projects dataset has no fork_count column; forks default to 0");
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.len());
    for i in 0..table.len() {
        let project_id = table.cell(i, key);
        if project_id.is_empty() {
            warn!("Skipping projects row {} with an empty project_id", i + 1);
            continue;
        }
        if !seen.insert(project_id.to_string()) {
            warn!("Duplicate project_id '{}' in projects dataset; keeping the first row", project_id);
            continue;
        }
        rows.push(ProjectRow {
            project_id: project_id.to_string(),
            display_name: name
                .map(|c| table.cell(i, c))
                .filter(|n| !n.is_empty())
                .map(String::from),
            star_count: stars.map_or(0.0, |c| table.number(i, c)),
            fork_count: forks.map_or(0.0, |c| table.number(i, c)),
            source_row: i,
        });
    }

    info!("Loaded {} projects from {}", rows.len(), table.source().display());
    Ok(rows)
}

/// Load contributor counts.
///
/// A missing file degrades to zero contributors for every project.
pub fn load_contributors(path: &Path, projects: &[ProjectRow]) -> Result<ContributorTable> {
    if !path.is_file() {
        warn!(
            "Contributor file {} not found; every project gets 0 contributors",
            path.display()
        );
        return Ok(ContributorTable {
            developer_id: projects
                .iter()
                .map(|p| (p.project_id.clone(), 0.0))
                .collect(),
        });
    }

    let table = Table::read(path)?;
    contributors_from_table(&table, projects)
}

/// Reconcile a contributor table to canonical `project_id` / `developer_id`.
///
/// Without a key column, rows are attributed to projects by position. That
/// silently mis-attributes data if the files disagree on row order, so it is
/// only allowed when both tables have the same number of rows and no projects
/// row was skipped, and always warns.
pub fn contributors_from_table(table: &Table, projects: &[ProjectRow]) -> Result<ContributorTable> {
    let developers = table.find_column(DEVELOPER_COUNT_ALIASES);
    if developers.is_none() {
        warn!(
            "{} has no developer count column ({}); contributors default to 0",
            table.source().display(),
            DEVELOPER_COUNT_ALIASES.join(", ")
        );
    }
    let count = |row: usize| developers.map_or(0.0, |c| table.number(row, c));

    let mut developer_id = BTreeMap::new();
    match table.find_column(PROJECT_KEY_ALIASES) {
        Some(key) => {
            for i in 0..table.len() {
                let project_id = table.cell(i, key);
                if project_id.is_empty() {
                    continue;
                }
                if developer_id.contains_key(project_id) {
                    warn!("Duplicate contributor row for '{}'; keeping the first", project_id);
                    continue;
                }
                developer_id.insert(project_id.to_string(), count(i));
            }
        }
        None if positional_match(table, projects) => {
            warn!(
                "{} has no project_id column; attributing {} rows to projects BY ROW POSITION. \
                 Results are wrong if the files are not in the same order",
                table.source().display(),
                table.len()
            );
            for project in projects {
                developer_id.insert(project.project_id.clone(), count(project.source_row));
            }
        }
        None => {
            warn!(
                "{} has no project_id column and its {} rows do not line up with the {} loaded projects; \
                 refusing positional attribution",
                table.source().display(),
                table.len(),
                projects.len()
            );
            return Err(PipelineError::Schema {
                dataset: "contributor",
                column: "project_id",
            });
        }
    }

    info!("Loaded contributor counts for {} projects", developer_id.len());
    Ok(ContributorTable { developer_id })
}

/// Rows line up only if every projects row survived loading, in order
fn positional_match(table: &Table, projects: &[ProjectRow]) -> bool {
    table.len() == projects.len() && projects.iter().enumerate().all(|(i, p)| p.source_row == i)
}

/// Load the dependency event dataset (JSON array of records or CSV)
pub fn load_dependency_events(path: &Path) -> Result<DependencyDataset> {
    require_file(path, "dependency")?;
    let table = Table::read(path)?;
    dependency_from_table(&table)
}

/// Convert a raw table into typed dependency events
pub fn dependency_from_table(table: &Table) -> Result<DependencyDataset> {
    let key = project_key(table, "dependency")?;
    let event_type = table.find_column(EVENT_TYPE_ALIASES);
    let developer = table.find_column(DEVELOPER_ALIASES);
    let connections = table.find_column(&[CONNECTION_COUNT_COLUMN]);

    if event_type.is_none() {
        warn!("Dependency dataset has no event_type column; only dependents will be counted");
    }

    let mut events = Vec::with_capacity(table.len());
    let mut connection_counts: BTreeMap<String, f64> = BTreeMap::new();
    let mut skipped = 0usize;

    for i in 0..table.len() {
        let project_id = table.cell(i, key);
        if project_id.is_empty() {
            skipped += 1;
            continue;
        }
        if let Some(c) = connections {
            let value = table.number(i, c);
            connection_counts
                .entry(project_id.to_string())
                .and_modify(|v| *v = v.max(value))
                .or_insert(value);
        }
        events.push(DependencyEvent {
            project_id: project_id.to_string(),
            event_type: event_type.map_or(EventType::Other, |c| EventType::from_label(table.cell(i, c))),
            developer_id: developer.map(|c| table.cell(i, c).to_string()).unwrap_or_default(),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} dependency rows with an empty project_id", skipped);
    }
    info!("Loaded {} dependency events", events.len());

    Ok(DependencyDataset {
        events,
        connection_counts: connections.map(|_| connection_counts),
    })
}

/// Load optional on-chain metrics.
///
/// A configured but absent file is a warning, not an error.
pub fn load_onchain(path: &Path) -> Result<Option<OnchainTable>> {
    if !path.is_file() {
        warn!("On-chain metrics file {} not found; skipping", path.display());
        return Ok(None);
    }
    let table = Table::read(path)?;
    onchain_from_table(&table).map(Some)
}

/// Convert a raw table into on-chain metrics, zero-filling absent columns
pub fn onchain_from_table(table: &Table) -> Result<OnchainTable> {
    let key = project_key(table, "on-chain")?;

    let columns: Vec<(Metric, Option<usize>)> = ONCHAIN_COLUMNS
        .iter()
        .map(|(metric, aliases)| {
            let column = table.find_column(aliases);
            if column.is_none() {
                warn!("On-chain dataset has no '{}' column; filling with 0", metric);
            }
            (*metric, column)
        })
        .collect();

    let mut metrics = BTreeMap::new();
    for i in 0..table.len() {
        let project_id = table.cell(i, key);
        if project_id.is_empty() || metrics.contains_key(project_id) {
            debug!("Skipping on-chain row {} (empty or repeated key)", i + 1);
            continue;
        }
        let values: BTreeMap<Metric, f64> = columns
            .iter()
            .map(|(metric, column)| (*metric, column.map_or(0.0, |c| table.number(i, c))))
            .collect();
        metrics.insert(project_id.to_string(), values);
    }

    info!("Loaded on-chain metrics for {} projects", metrics.len());
    Ok(OnchainTable { metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn csv(text: &str) -> Table {
        Table::from_csv_str(text, &PathBuf::from("test.csv")).unwrap()
    }

    fn projects(ids: &[&str]) -> Vec<ProjectRow> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| ProjectRow {
                project_id: (*id).into(),
                display_name: None,
                star_count: 0.0,
                fork_count: 0.0,
                source_row: i,
            })
            .collect()
    }

    #[test]
    fn test_projects_require_key() {
        let err = projects_from_table(&csv("name,star_count\na,1\n")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { dataset: "projects", column: "project_id" }
        ));
    }

    #[test]
    fn test_projects_parse_and_dedupe() {
        let rows = projects_from_table(&csv(
            "project_id,display_name,star_count,fork_count\n\
             a,Alpha,10,5\n\
             b,,oops,2\n\
             a,Again,99,99\n\
             ,Nameless,1,1\n",
        ))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display_name.as_deref(), Some("Alpha"));
        assert_eq!(rows[0].star_count, 10.0);
        assert_eq!(rows[1].display_name, None);
        assert_eq!(rows[1].star_count, 0.0);
        assert_eq!(rows[1].fork_count, 2.0);
    }

    #[test]
    fn test_contributor_aliases() {
        for header in ["ProjectID,contributor_count", "projectid,developers", "ProjectId,developer_id"] {
            let table = csv(&format!("{header}\nb,4\na,2\n"));
            let contributors = contributors_from_table(&table, &projects(&["a", "b"])).unwrap();
            assert_eq!(contributors.developer_id["a"], 2.0, "header {header}");
            assert_eq!(contributors.developer_id["b"], 4.0, "header {header}");
        }
    }

    #[test]
    fn test_contributor_positional_fallback_when_counts_match() {
        let table = csv("developers\n3\n7\n");
        let contributors = contributors_from_table(&table, &projects(&["x", "y"])).unwrap();
        assert_eq!(contributors.developer_id["x"], 3.0);
        assert_eq!(contributors.developer_id["y"], 7.0);
    }

    #[test]
    fn test_contributor_positional_fallback_rejected_on_mismatch() {
        let table = csv("developers\n3\n");
        let err = contributors_from_table(&table, &projects(&["x", "y"])).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { dataset: "contributor", .. }));
    }

    #[test]
    fn test_contributor_positional_fallback_rejected_after_dropped_rows() {
        // three raw rows, the duplicate 'a' is dropped, leaving two projects
        let projects = projects_from_table(&csv("project_id\na\na\nb\n")).unwrap();
        assert_eq!(projects.len(), 2);

        let err = contributors_from_table(&csv("developers\n10\n20\n"), &projects).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { dataset: "contributor", .. }));

        let err = contributors_from_table(&csv("developers\n10\n20\n30\n"), &projects).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { dataset: "contributor", .. }));
    }

    #[test]
    fn test_missing_onchain_file_is_skipped() {
        let onchain = load_onchain(Path::new("/definitely/not/here.csv")).unwrap();
        assert!(onchain.is_none());
    }

    #[test]
    fn test_onchain_file_loaded_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("onchain.json");
        std::fs::write(&path, r#"[{"project_id": "a", "tx_count": 5, "unique_users": 2, "gas_fee": 0.5}]"#)
            .unwrap();

        let onchain = load_onchain(&path).unwrap().unwrap();

        assert_eq!(onchain.metrics["a"][&Metric::TxCount], 5.0);
        assert_eq!(onchain.metrics["a"][&Metric::GasFee], 0.5);
    }

    #[test]
    fn test_missing_contributor_file_synthesizes_zeros() {
        let contributors =
            load_contributors(Path::new("/definitely/not/here.json"), &projects(&["a", "b"])).unwrap();
        assert_eq!(contributors.developer_id.len(), 2);
        assert!(contributors.developer_id.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_missing_required_files() {
        let err = load_projects(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile { role: "projects", .. }));

        let err = load_dependency_events(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingFile { role: "dependency", .. }));
    }

    #[test]
    fn test_dependency_events_and_connection_counts() {
        let table = Table::from_json_str(
            r#"[
                {"project_id": "x", "event_type": "COMMIT_CODE", "developer_id": "d1", "developer_connection_count": 4},
                {"project_id": "x", "event_type": "forked", "developer_id": "d2", "developer_connection_count": 4},
                {"project_id": "", "event_type": "FORKED", "developer_id": "d3"},
                {"project_id": "y", "event_type": "STARRED", "developer_id": "d1", "developer_connection_count": 1}
            ]"#,
            Path::new("deps.json"),
        )
        .unwrap();

        let dataset = dependency_from_table(&table).unwrap();

        assert_eq!(dataset.events.len(), 3);
        assert_eq!(dataset.events[0], DependencyEvent::new("x", EventType::CommitCode, "d1"));
        assert_eq!(dataset.events[1].event_type, EventType::Forked);
        assert_eq!(dataset.events[2].event_type, EventType::Other);

        let counts = dataset.connection_counts.unwrap();
        assert_eq!(counts["x"], 4.0);
        assert_eq!(counts["y"], 1.0);
    }

    #[test]
    fn test_dependency_without_connection_column() {
        let dataset = dependency_from_table(&csv("project_id,event_type\nx,COMMIT_CODE\n")).unwrap();
        assert!(dataset.connection_counts.is_none());
        assert_eq!(dataset.events[0].developer_id, "");
    }

    #[test]
    fn test_onchain_zero_fills_missing_columns() {
        let table = csv("project_id,transaction_count\na,12\nb,3\n");
        let onchain = onchain_from_table(&table).unwrap();

        let a = &onchain.metrics["a"];
        assert_eq!(a[&Metric::TxCount], 12.0);
        assert_eq!(a[&Metric::UniqueUsers], 0.0);
        assert_eq!(a[&Metric::GasFee], 0.0);
    }
}
