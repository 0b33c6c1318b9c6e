// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced to callers.
//!
//! Only malformed requests and top-level navigation failures reach the
//! caller. Selector misses, pagination stalls, and enrichment failures are
//! recovered where they happen and never appear here.

use thiserror::Error;

/// A malformed extraction or discovery request. Raised before any page access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Valid url is required")]
    InvalidUrl,

    #[error("At least one field is required")]
    NoFields,

    #[error("listItemSelector is required for list mode")]
    MissingListSelector,

    #[error("detailUrlFieldName is required when deepSearch is enabled")]
    MissingDetailField,

    #[error("min cannot be greater than max (limit): {min} > {limit}")]
    MinExceedsLimit { min: usize, limit: usize },

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("field {0} has type attr but no attr name")]
    MissingAttr(String),

    #[error("mode must be single or list")]
    UnsupportedMode,
}

/// All errors an engine operation can return.
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),
}

impl TrawlError {
    /// HTTP status the REST surface answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Navigation { .. } | Self::Browser(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_status() {
        let e: TrawlError = ValidationError::MinExceedsLimit { min: 5, limit: 2 }.into();
        assert_eq!(e.status_code(), 400);
        assert!(e.to_string().contains("5 > 2"));

        let e = TrawlError::Navigation {
            url: "https://a.example".into(),
            reason: "timed out".into(),
        };
        assert_eq!(e.status_code(), 500);
        assert_eq!(e.to_string(), "navigation to https://a.example failed: timed out");
    }
}
