//! Coordinate range validation
//!
//! Pure checks on a user-requested `(start, end)` pair. Rules are applied in
//! a fixed order and the first failure wins:
//!
//! 1. both inputs parse as integers (thousands separators are stripped)
//! 2. `start < end`
//! 3. `start >= bounds.min` (only when bounds are known)
//! 4. `end <= bounds.max` (only when bounds are known)
//! 5. `end - start <= max_span`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{format_with_commas, GeneBounds, ViewRange};
use crate::error::ErrorCode;

/// Why a candidate range was rejected
///
/// The `Display` text is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// One of the inputs is not an integer
    #[error("Please enter valid start and end positions.")]
    NotANumber { start: String, end: String },

    /// Start is not before end
    #[error("Start position must be less than end position.")]
    InvertedRange { start: u64, end: u64 },

    /// Start lies below the gene minimum
    #[error(
        "Start position ({}) is below the minimum value ({}).",
        commas(.start),
        commas(.min)
    )]
    BelowMinimum { start: u64, min: u64 },

    /// End lies beyond the gene maximum
    #[error(
        "End position ({}) exceeds the maximum value ({}).",
        commas(.end),
        commas(.max)
    )]
    AboveMaximum { end: u64, max: u64 },

    /// The range is wider than the viewer allows
    #[error(
        "Selected range ({} bp) exceeds maximum view range of {} bp.",
        commas(.span),
        commas(.max_span)
    )]
    SpanTooLarge { span: u64, max_span: u64 },
}

impl ValidationError {
    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::NotANumber { .. } => ErrorCode::NotANumber,
            ValidationError::InvertedRange { .. } => ErrorCode::InvertedRange,
            ValidationError::BelowMinimum { .. } => ErrorCode::BelowMinimum,
            ValidationError::AboveMaximum { .. } => ErrorCode::AboveMaximum,
            ValidationError::SpanTooLarge { .. } => ErrorCode::SpanTooLarge,
        }
    }
}

fn commas(value: &u64) -> String {
    format_with_commas(*value)
}

/// Parse a coordinate as typed by a user
///
/// Surrounding whitespace and `,` thousands separators are ignored. Anything
/// else that is not a non-negative integer yields `None`.
pub fn parse_coordinate(input: &str) -> Option<u64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Validate a range given as raw text inputs
pub fn validate_range(
    start: &str,
    end: &str,
    bounds: Option<&GeneBounds>,
    max_span: u64,
) -> Result<ViewRange, ValidationError> {
    match (parse_coordinate(start), parse_coordinate(end)) {
        (Some(s), Some(e)) => validate_coordinates(s, e, bounds, max_span),
        _ => Err(ValidationError::NotANumber {
            start: start.to_string(),
            end: end.to_string(),
        }),
    }
}

/// Validate an already numeric range
pub fn validate_coordinates(
    start: u64,
    end: u64,
    bounds: Option<&GeneBounds>,
    max_span: u64,
) -> Result<ViewRange, ValidationError> {
    if start >= end {
        return Err(ValidationError::InvertedRange { start, end });
    }

    if let Some(bounds) = bounds {
        if start < bounds.min() {
            return Err(ValidationError::BelowMinimum {
                start,
                min: bounds.min(),
            });
        }
        if end > bounds.max() {
            return Err(ValidationError::AboveMaximum {
                end,
                max: bounds.max(),
            });
        }
    }

    let span = end - start;
    if span > max_span {
        return Err(ValidationError::SpanTooLarge { span, max_span });
    }

    ViewRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::MAX_VIEW_SPAN;

    fn brca1() -> GeneBounds {
        GeneBounds::new(43_044_295, 43_170_245)
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("43044295"), Some(43_044_295));
        assert_eq!(parse_coordinate("43,044,295"), Some(43_044_295));
        assert_eq!(parse_coordinate("  1,000 "), Some(1_000));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate(","), None);
        assert_eq!(parse_coordinate("-5"), None);
        assert_eq!(parse_coordinate("12abc"), None);
        assert_eq!(parse_coordinate("1.5"), None);
        assert_eq!(parse_coordinate("99999999999999999999999"), None);
    }

    #[test]
    fn test_valid_full_span() {
        let range = validate_range("43,044,295", "43,054,295", Some(&brca1()), MAX_VIEW_SPAN)
            .unwrap();
        assert_eq!(range.start(), 43_044_295);
        assert_eq!(range.end(), 43_054_295);
        assert_eq!(range.span(), 10_000);
    }

    #[test]
    fn test_whole_gene_is_too_wide() {
        let err = validate_range("43044295", "43170245", Some(&brca1()), MAX_VIEW_SPAN)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SpanTooLarge {
                span: 125_950,
                max_span: MAX_VIEW_SPAN
            }
        );
    }

    #[test]
    fn test_not_a_number() {
        let err = validate_range("abc", "100", None, MAX_VIEW_SPAN).unwrap_err();
        assert!(matches!(err, ValidationError::NotANumber { .. }));
        assert_eq!(err.to_string(), "Please enter valid start and end positions.");

        let err = validate_range("100", "", None, MAX_VIEW_SPAN).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotANumber);
    }

    #[test]
    fn test_inverted_wins_over_bounds() {
        // Both below the minimum and inverted: inversion is reported first
        let err = validate_coordinates(500, 100, Some(&brca1()), MAX_VIEW_SPAN).unwrap_err();
        assert_eq!(err, ValidationError::InvertedRange { start: 500, end: 100 });

        let err = validate_coordinates(100, 100, None, MAX_VIEW_SPAN).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedRange { .. }));
    }

    #[test]
    fn test_below_minimum_message_echoes_values() {
        let err = validate_coordinates(43_000_000, 43_005_000, Some(&brca1()), MAX_VIEW_SPAN)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::BelowMinimum {
                start: 43_000_000,
                min: 43_044_295
            }
        );
        assert_eq!(
            err.to_string(),
            "Start position (43,000,000) is below the minimum value (43,044,295)."
        );
    }

    #[test]
    fn test_above_maximum_message_echoes_values() {
        let err = validate_coordinates(43_165_000, 43_171_000, Some(&brca1()), MAX_VIEW_SPAN)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "End position (43,171,000) exceeds the maximum value (43,170,245)."
        );
    }

    #[test]
    fn test_below_minimum_before_above_maximum() {
        let bounds = GeneBounds::new(1_000, 2_000);
        let err = validate_coordinates(500, 2_500, Some(&bounds), MAX_VIEW_SPAN).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BelowMinimum);
    }

    #[test]
    fn test_bounds_before_span() {
        let err = validate_coordinates(43_000_000, 43_100_000, Some(&brca1()), MAX_VIEW_SPAN)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BelowMinimum);
    }

    #[test]
    fn test_span_checked_without_bounds() {
        let err = validate_coordinates(1, 20_002, None, MAX_VIEW_SPAN).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SpanTooLarge);
        assert_eq!(
            err.to_string(),
            "Selected range (20,001 bp) exceeds maximum view range of 10,000 bp."
        );
    }

    #[test]
    fn test_range_touching_both_bounds() {
        let bounds = GeneBounds::new(1_000, 2_000);
        let range = validate_coordinates(1_000, 2_000, Some(&bounds), MAX_VIEW_SPAN).unwrap();
        assert_eq!(range.span(), 1_000);
    }

    #[test]
    fn test_inverted_gene_bounds_are_normalized() {
        let bounds = GeneBounds::new(2_000, 1_000);
        assert!(validate_coordinates(1_200, 1_800, Some(&bounds), MAX_VIEW_SPAN).is_ok());
    }
}
