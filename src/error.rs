// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fatal pipeline errors
//!
//! Anything that has a sensible zero default is handled locally with a
//! warning; the variants here abort the run before any output is written.

use std::path::PathBuf;

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a ranking run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration file absent or unparsable
    #[error("Configuration {} could not be loaded: {reason}", .path.display())]
    MissingConfig {
        /// Configuration location that was tried
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required input dataset does not exist
    #[error("Required {role} file not found: {}", .path.display())]
    MissingFile {
        /// Which dataset the file was supposed to hold
        role: &'static str,
        /// Resolved location
        path: PathBuf,
    },

    /// A required column is absent after all alias fallbacks
    #[error("{dataset} dataset has no usable '{column}' column")]
    Schema {
        /// Dataset being loaded
        dataset: &'static str,
        /// Canonical name of the missing column
        column: &'static str,
    },

    /// Neither UTF-8 nor Latin-1 produced usable text
    #[error("Could not decode {} as UTF-8 or Latin-1", .path.display())]
    Encoding {
        /// File that failed to decode
        path: PathBuf,
    },

    /// Structured input is not an array of records
    #[error("Unexpected layout in {}: {reason}", .path.display())]
    Format {
        /// Offending file
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// I/O failure while reading inputs or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON data
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
