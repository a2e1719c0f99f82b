//! Error taxonomy for the budgetbite library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, BudgetError>;

#[derive(Debug, Error)]
pub enum BudgetError {
    /// A document path does not exist.
    #[error("{label} not found at '{}'", path.display())]
    SourceNotFound { label: String, path: PathBuf },

    /// A document exists but could not be read or decoded.
    #[error("Could not read or parse {label} '{}': {reason}", path.display())]
    SourceUnreadable {
        label: String,
        path: PathBuf,
        reason: String,
    },

    /// A document was read but held no usable text.
    #[error("No text content found in {label} file: '{}'", path.display())]
    EmptySource { label: String, path: PathBuf },

    #[error("No meal blocks found. Check format (needs lines with 'Time:' and 'Shelf life:').")]
    NoMealBlocksFound,

    #[error("No meal selection provided.")]
    EmptySelection,

    #[error("No valid meals were ultimately selected.")]
    NoValidSelection,

    /// The text generator failed or returned an unusable response.
    #[error("{task} failed: {reason}")]
    GenerationFailed { task: String, reason: String },

    /// A streamed generation broke off before producing any content.
    #[error("{task} failed before any output was captured: {reason}")]
    GenerationEmptyPartial { task: String, reason: String },

    /// Non-fatal. Collected by the price extractor, never returned as `Err`.
    #[error("Could not parse price '{raw}' in line {line_number}: {line}")]
    PriceLineUnparsable {
        line_number: usize,
        line: String,
        raw: String,
    },
}

impl BudgetError {
    pub fn generation(task: &str, reason: impl std::fmt::Display) -> Self {
        Self::GenerationFailed {
            task: task.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unreadable(label: &str, path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnreadable {
            label: label.to_string(),
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
