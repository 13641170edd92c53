//! Genomic coordinate types for the locus viewer
//!
//! All ranges in this crate are half-open, `[start, end)`, on the
//! chromosome's coordinate axis. The span of a range is `end - start` and is
//! also the number of bases a sequence window for that range holds.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`GeneBounds`] | min/max coordinate covered by a gene's transcripts |
//! | [`GeneLocus`] | a selected gene together with its bounds |
//! | [`ViewRange`] | the window currently inspected (`start < end`) |
//!
//! # Examples
//!
//! ```
//! use ferro_locus::coords::{validate_range, GeneBounds, MAX_VIEW_SPAN};
//!
//! let bounds = GeneBounds::new(43_044_295, 43_170_245);
//! let range = validate_range("43,044,295", "43,054,295", Some(&bounds), MAX_VIEW_SPAN).unwrap();
//! assert_eq!(range.span(), 10_000);
//! ```

mod validate;

pub use validate::{parse_coordinate, validate_coordinates, validate_range, ValidationError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest range the viewer will request, in bases
pub const MAX_VIEW_SPAN: u64 = 10_000;

/// Strand-independent extent of a gene
///
/// Construction normalizes the pair so that `min <= max` always holds, no
/// matter in which order the provider reported the two coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBounds")]
pub struct GeneBounds {
    min: u64,
    max: u64,
}

impl GeneBounds {
    /// Create bounds from two coordinates in either order
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Lowest coordinate
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Highest coordinate
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Number of bases between min and max
    pub fn len(&self) -> u64 {
        self.max - self.min
    }

    /// True when min == max
    pub fn is_empty(&self) -> bool {
        self.min == self.max
    }

    /// Check whether a range lies entirely inside the bounds
    pub fn contains_range(&self, range: &ViewRange) -> bool {
        range.start >= self.min && range.end <= self.max
    }

    /// Default window for these bounds: starts at `min`, at most `max_span` wide
    pub fn default_range(&self, max_span: u64) -> Option<ViewRange> {
        let end = self.max.min(self.min.saturating_add(max_span));
        ViewRange::new(self.min, end).ok()
    }

    /// Shrink a candidate range until it satisfies the bounds and span limit
    ///
    /// Returns `None` if nothing of the candidate overlaps the bounds.
    pub fn clamp(&self, start: u64, end: u64, max_span: u64) -> Option<ViewRange> {
        let start = start.max(self.min);
        let end = end.min(self.max).min(start.saturating_add(max_span));
        ViewRange::new(start, end).ok()
    }
}

/// Bounds as they appear on the wire, before normalization
#[derive(Deserialize)]
struct RawBounds {
    min: u64,
    max: u64,
}

impl From<RawBounds> for GeneBounds {
    fn from(raw: RawBounds) -> Self {
        GeneBounds::new(raw.min, raw.max)
    }
}

impl fmt::Display for GeneBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_with_commas(self.min),
            format_with_commas(self.max)
        )
    }
}

/// A selected gene and where it lies
///
/// Replaced wholesale when another gene is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneLocus {
    /// Provider gene identifier (NCBI Gene ID)
    pub gene_id: String,
    /// Gene symbol (e.g., "BRCA1")
    pub symbol: String,
    /// Full gene name
    pub name: String,
    /// Chromosome name (e.g., "chr17")
    pub chromosome: String,
    /// Extent of the gene
    pub bounds: GeneBounds,
}

/// A half-open coordinate window with `start < end`
///
/// User-edited ranges only ever come out of [`validate_range`], which also
/// enforces gene bounds and the span limit. Ranges reported back by a
/// sequence provider are built with [`ViewRange::new`], which checks ordering
/// only, since the provider may snap or truncate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct ViewRange {
    start: u64,
    end: u64,
}

impl ViewRange {
    /// Create a range, rejecting `start >= end`
    pub fn new(start: u64, end: u64) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive start
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive end
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bases covered
    pub fn span(&self) -> u64 {
        self.end - self.start
    }

    /// Check whether a coordinate falls inside the range
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end
    }

    /// Offset of a coordinate from the start of the range
    pub fn offset_of(&self, position: u64) -> Option<usize> {
        if self.contains(position) {
            usize::try_from(position - self.start).ok()
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct RawRange {
    start: u64,
    end: u64,
}

impl TryFrom<RawRange> for ViewRange {
    type Error = ValidationError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        ViewRange::new(raw.start, raw.end)
    }
}

impl fmt::Display for ViewRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_with_commas(self.start),
            format_with_commas(self.end)
        )
    }
}

/// Format an integer with `,` thousands separators (e.g., `43,044,295`)
pub fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
