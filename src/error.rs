//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Errors fall into two tiers: fatal errors ([`EtiquetaError`] returned from
//! template/config loading and the orchestrator) abort the run before any
//! page is written, while per-row errors are collected as [`RowError`]
//! records and reported after all pages are out.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Sheet configuration missing or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// Template structure problem (bad SVG, legacy `#config` command)
    #[error("Template error: {0}")]
    Template(String),

    /// Command text did not match `#name [key=value ...] [freetext]`
    #[error("Command syntax error: {0}")]
    CommandSyntax(String),

    /// Character outside the Code128 character set
    #[error("Cannot encode {0:?} as Code128 (ASCII only)")]
    InvalidCharacter(char),

    /// `%(field)` reference with no matching CSV column
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// Generated content does not fit its allocated area
    #[error("Layout error: {0}")]
    Layout(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An error localized to one CSV row (usually one placeholder within it).
///
/// The offending placeholder is left unfiltered in the output; the row's
/// remaining placeholders and all other rows are unaffected.
#[derive(Debug)]
pub struct RowError {
    /// Zero-based index of the processed data row.
    pub row: usize,
    /// The underlying error.
    pub error: EtiquetaError,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}
