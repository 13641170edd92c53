//! Sequence windows
//!
//! A sequence provider may not serve exactly the range that was asked for:
//! it can truncate at a chromosome end or snap to its own grid. [`reconcile`]
//! merges the requested range with what actually came back and records any
//! discrepancy, so callers never assume the bases line up 1:1 with the
//! request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::ViewRange;
use crate::error::LocusError;

/// Raw answer of a sequence fetch, before reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Bases as delivered (any case)
    pub bases: String,
    /// Range the provider says it served, as `(start, end)`
    pub actual_range: Option<(u64, u64)>,
    /// Error reported by the provider
    pub error: Option<String>,
}

impl ProviderResponse {
    /// A response that served exactly the request
    pub fn bases(bases: impl Into<String>) -> Self {
        Self {
            bases: bases.into(),
            ..Default::default()
        }
    }

    /// A response that served a different range than requested
    pub fn with_range(bases: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            bases: bases.into(),
            actual_range: Some((start, end)),
            error: None,
        }
    }

    /// A response carrying a provider error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Problem attached to a window that carries no usable bases
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowError {
    /// The provider reported an error
    #[error("{0}")]
    Provider(String),

    /// The provider's bases do not match the range it claims to have served
    #[error("Malformed sequence response: {0}")]
    Malformed(String),
}

impl From<WindowError> for LocusError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::Provider(msg) => LocusError::provider("sequence fetch", msg),
            WindowError::Malformed(msg) => LocusError::malformed("sequence fetch", msg),
        }
    }
}

/// Requested range, served range and the bases of a sequence fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceWindow {
    requested: ViewRange,
    actual: Option<ViewRange>,
    bases: String,
    error: Option<WindowError>,
}

impl SequenceWindow {
    /// Range that was asked for
    pub fn requested_range(&self) -> ViewRange {
        self.requested
    }

    /// Range the bases correspond to, when known
    pub fn actual_range(&self) -> Option<ViewRange> {
        self.actual
    }

    /// Upper-case bases; empty when the window carries an error
    pub fn bases(&self) -> &str {
        &self.bases
    }

    /// Error that prevented the window from being filled
    pub fn error(&self) -> Option<&WindowError> {
        self.error.as_ref()
    }

    /// True when the window holds usable bases
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// True when the provider served something other than the request
    pub fn is_adjusted(&self) -> bool {
        self.actual.is_some_and(|actual| actual != self.requested)
    }

    /// Base at a chromosome coordinate, if it falls inside the served range
    pub fn base_at(&self, position: u64) -> Option<char> {
        if self.error.is_some() {
            return None;
        }
        let offset = self.actual?.offset_of(position)?;
        self.bases.as_bytes().get(offset).map(|b| *b as char)
    }

    /// Coordinates paired with their bases
    pub fn iter_bases(&self) -> impl Iterator<Item = (u64, char)> + '_ {
        let start = self.actual.map(|r| r.start()).unwrap_or(0);
        self.bases
            .bytes()
            .enumerate()
            .map(move |(i, b)| (start + i as u64, b as char))
    }

    /// Convert into a `Result`, surfacing the window error as a [`LocusError`]
    pub fn into_result(self) -> Result<Self, LocusError> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }
}

/// Merge a requested range with what the provider served
///
/// - A provider error yields a window without bases that keeps the request.
/// - A missing actual range means the provider honored the request exactly.
/// - The actual range is kept even when it deviates from the request.
/// - `bases.len()` must equal the actual span; otherwise the window is
///   marked malformed and carries no bases.
///
/// The function is pure; identical inputs give equal windows.
pub fn reconcile(requested: ViewRange, response: &ProviderResponse) -> SequenceWindow {
    if let Some(msg) = &response.error {
        return SequenceWindow {
            requested,
            actual: None,
            bases: String::new(),
            error: Some(WindowError::Provider(msg.clone())),
        };
    }

    let actual = match response.actual_range {
        None => requested,
        Some((start, end)) => match ViewRange::new(start, end) {
            Ok(range) => range,
            Err(_) => {
                return malformed(
                    requested,
                    None,
                    format!("provider reported an empty or inverted range {}-{}", start, end),
                )
            }
        },
    };

    let len = response.bases.len() as u64;
    if len != actual.span() {
        return malformed(
            requested,
            Some(actual),
            format!(
                "received {} bases for a range of {} bases ({})",
                len,
                actual.span(),
                actual
            ),
        );
    }

    if let Some(bad) = response.bases.chars().find(|c| !c.is_ascii_alphabetic()) {
        return malformed(
            requested,
            Some(actual),
            format!("unexpected character {:?} in sequence", bad),
        );
    }

    SequenceWindow {
        requested,
        actual: Some(actual),
        bases: response.bases.to_ascii_uppercase(),
        error: None,
    }
}

fn malformed(requested: ViewRange, actual: Option<ViewRange>, msg: String) -> SequenceWindow {
    SequenceWindow {
        requested,
        actual,
        bases: String::new(),
        error: Some(WindowError::Malformed(msg)),
    }
}
