// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rankings output: CSV serialization and all-or-nothing writes

use crate::error::{PipelineError, Result};
use crate::pipeline::Ranking;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row for `ranking`
#[must_use]
pub fn header(ranking: &Ranking) -> Vec<String> {
    let mut header = vec!["project_id".to_string()];
    if ranking.has_display_name() {
        header.push("display_name".into());
    }
    header.extend(ranking.metric_columns.iter().map(|m| m.name().to_string()));
    header.extend(ranking.normalized_columns.iter().map(|m| m.normalized_column()));
    header.push("score".into());
    header
}

/// Serialize `ranking` as CSV, rows in ranking order, no index column
pub fn to_csv(ranking: &Ranking) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header(ranking))?;

    let with_name = ranking.has_display_name();
    for row in &ranking.rows {
        let mut fields = vec![row.record.project_id.clone()];
        if with_name {
            fields.push(row.record.display_name.clone().unwrap_or_default());
        }
        fields.extend(
            ranking
                .metric_columns
                .iter()
                .map(|m| row.record.value(*m).to_string()),
        );
        fields.extend(
            ranking
                .normalized_columns
                .iter()
                .map(|m| row.normalized.get(m).copied().unwrap_or(0.0).to_string()),
        );
        fields.push(row.score.to_string());
        writer.write_record(&fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Hex SHA-256 of `bytes`
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write `bytes` to `path` atomically and return their fingerprint.
///
/// The data goes to a sibling temporary file first and is renamed over the
/// destination only once fully flushed, so a failed run never leaves a
/// partial file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    let digest = fingerprint(bytes);
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(digest)
}

/// Serialize and write `ranking` to `path`, returning the output fingerprint
pub fn write_ranking(ranking: &Ranking, path: &Path) -> Result<String> {
    let bytes = to_csv(ranking)?;
    let digest = write_atomic(path, &bytes)?;
    info!("Rankings written to {} (sha256 {})", path.display(), &digest[..16]);
    Ok(digest)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "rankings".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
