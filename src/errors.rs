use std::path::PathBuf;
use thiserror::Error;

use crate::extract::ExtractionError;

/// All errors that can occur while answering a credential request.
#[derive(Debug, Error)]
pub enum HelperError {
    // --- Mapping file errors ---
    #[error("No mapping configured so far at any XDG config location. Please create {}", .0.display())]
    MappingNotFound(PathBuf),

    #[error("Unable to parse mapping file {origin}: {reason}")]
    MappingParse { origin: String, reason: String },

    #[error("Invalid section pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    // --- Section configuration errors ---
    #[error("Section '{section}' does not define the required option '{option}'")]
    MissingOption { section: String, option: String },

    #[error("{option} of type '{name}' does not exist")]
    UnknownStrategy { option: String, name: String },

    #[error("Provided regex \"{pattern}\" {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Option '{option}' in section '{section}' must be a non-negative integer, got '{value}'")]
    InvalidOption {
        section: String,
        option: String,
        value: String,
    },

    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),

    // --- Resolution errors ---
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Unable to retrieve entry from pass: {0}")]
    EntryUnavailable(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HelperError {
    /// Create a missing option error
    pub fn missing_option(section: impl Into<String>, option: impl Into<String>) -> Self {
        Self::MissingOption {
            section: section.into(),
            option: option.into(),
        }
    }

    /// Create an unknown strategy error
    pub fn unknown_strategy(option: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            option: option.into(),
            name: name.into(),
        }
    }

    /// Create an invalid regex error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for helper results.
pub type Result<T> = std::result::Result<T, HelperError>;
