use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Could not find {field} on the first page: {detail}")]
    MetadataParse { field: &'static str, detail: String },

    #[error("Invalid statement date '{token}' for year {year}: {reason}")]
    InvalidDate {
        token: String,
        year: i32,
        reason: String,
    },

    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),

    #[error("Balance mismatch: opening {opening:.2} + transactions = {calculated:.2}, statement closes at {closing:.2}")]
    ValidationMismatch {
        opening: f64,
        closing: f64,
        calculated: f64,
    },

    #[error("Unknown statement type: {0}")]
    UnknownStatementType(String),

    #[error("Unsupported institution: {0}")]
    UnsupportedInstitution(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Bucket used by the batch report to count per-document failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FailureKind {
    Extraction,
    MetadataParse,
    Standardization,
    ValidationMismatch,
    UnsupportedLayout,
    Io,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::MetadataParse => "metadata",
            Self::Standardization => "standardization",
            Self::ValidationMismatch => "validation mismatch",
            Self::UnsupportedLayout => "unsupported layout",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl AuditError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Extraction(_) => FailureKind::Extraction,
            Self::MetadataParse { .. } => FailureKind::MetadataParse,
            Self::InvalidDate { .. } | Self::InvalidAmount(_) => FailureKind::Standardization,
            Self::ValidationMismatch { .. } => FailureKind::ValidationMismatch,
            Self::UnknownStatementType(_) | Self::UnsupportedInstitution(_) => {
                FailureKind::UnsupportedLayout
            }
            Self::Io(_)
            | Self::Csv(_)
            | Self::Json(_)
            | Self::Settings(_)
            | Self::Pdf(_)
            | Self::Other(_) => FailureKind::Io,
        }
    }
}
