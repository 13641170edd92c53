//! Property-based tests for range validation and sequence reconciliation

use ferro_locus::sequence::WindowError;
use ferro_locus::{
    format_with_commas, reconcile, validate_coordinates, validate_range, GeneBounds,
    ProviderResponse, ValidationError, ViewRange,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

// =============================================================================
// Strategies
// =============================================================================

/// Coordinates in the range of real chromosome positions
fn coordinate() -> impl Strategy<Value = u64> {
    0..300_000_000u64
}

/// Window span limits
fn max_span() -> impl Strategy<Value = u64> {
    1..20_000u64
}

/// Gene bounds given in either order
fn bounds() -> impl Strategy<Value = GeneBounds> {
    (coordinate(), coordinate()).prop_map(|(a, b)| GeneBounds::new(a, b))
}

/// Nucleotide strings of mixed case
fn bases(len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just('A'),
            Just('C'),
            Just('G'),
            Just('T'),
            Just('a'),
            Just('c'),
            Just('g'),
            Just('t'),
            Just('N'),
        ],
        len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// A requested range no wider than 500 bases
fn small_range() -> impl Strategy<Value = ViewRange> {
    (coordinate(), 1..500u64).prop_map(|(start, span)| ViewRange::new(start, start + span).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // -------------------------------------------------------------------------
    // Range validation
    // -------------------------------------------------------------------------

    /// An accepted range always satisfies every rule
    #[test]
    fn accepted_ranges_satisfy_all_rules(
        start in coordinate(),
        end in coordinate(),
        bounds in bounds(),
        max_span in max_span(),
    ) {
        if let Ok(range) = validate_coordinates(start, end, Some(&bounds), max_span) {
            prop_assert!(range.start() < range.end());
            prop_assert!(range.start() >= bounds.min());
            prop_assert!(range.end() <= bounds.max());
            prop_assert!(range.span() <= max_span);
        }
    }

    /// Without bounds only ordering and span matter
    #[test]
    fn unbounded_validation_checks_order_and_span(
        start in coordinate(),
        end in coordinate(),
        max_span in max_span(),
    ) {
        let result = validate_coordinates(start, end, None, max_span);
        let expected = start < end && end - start <= max_span;
        prop_assert_eq!(result.is_ok(), expected);
        if start < end && end - start > max_span {
            let is_span_error = matches!(result, Err(ValidationError::SpanTooLarge { .. }));
            prop_assert!(is_span_error);
        }
    }

    /// Thousands separators never change the outcome
    #[test]
    fn commas_are_ignored(
        start in coordinate(),
        end in coordinate(),
        bounds in bounds(),
        max_span in max_span(),
    ) {
        let plain = validate_range(&start.to_string(), &end.to_string(), Some(&bounds), max_span);
        let grouped = validate_range(
            &format_with_commas(start),
            &format_with_commas(end),
            Some(&bounds),
            max_span,
        );
        prop_assert_eq!(plain, grouped);
    }

    /// Anything that is not a non-negative integer is rejected first
    #[test]
    fn non_numeric_input_rejected(garbage in "[a-zA-Z_ .-]{1,12}", end in coordinate()) {
        let result = validate_range(&garbage, &end.to_string(), None, 10_000);
        let is_nan = matches!(result, Err(ValidationError::NotANumber { .. }));
        prop_assert!(is_nan);
    }

    /// Bounds are normalized no matter the input order
    #[test]
    fn bounds_are_ordered(a in coordinate(), b in coordinate()) {
        let bounds = GeneBounds::new(a, b);
        prop_assert!(bounds.min() <= bounds.max());
        prop_assert_eq!(bounds, GeneBounds::new(b, a));
    }

    /// The default window of a non-empty gene is always valid
    #[test]
    fn default_range_is_valid(bounds in bounds(), max_span in max_span()) {
        match bounds.default_range(max_span) {
            Some(range) => {
                prop_assert_eq!(range.start(), bounds.min());
                let revalidated =
                    validate_coordinates(range.start(), range.end(), Some(&bounds), max_span);
                prop_assert_eq!(revalidated, Ok(range));
            }
            None => prop_assert!(bounds.is_empty()),
        }
    }

    // -------------------------------------------------------------------------
    // Sequence reconciliation
    // -------------------------------------------------------------------------

    /// Reconciliation is pure
    #[test]
    fn reconcile_is_deterministic(requested in small_range(), extra in 0..3usize) {
        let len = requested.span() as usize + extra;
        let response = ProviderResponse::bases("A".repeat(len));
        prop_assert_eq!(reconcile(requested, &response), reconcile(requested, &response));
    }

    /// Exact responses keep the requested range and upper-case the bases
    #[test]
    fn exact_response_accepted(
        (requested, seq) in small_range()
            .prop_flat_map(|r| (Just(r), bases(r.span() as usize)))
    ) {
        let window = reconcile(requested, &ProviderResponse::bases(seq.clone()));
        prop_assert!(window.is_ok());
        prop_assert_eq!(window.actual_range(), Some(requested));
        prop_assert_eq!(window.bases(), seq.to_ascii_uppercase());
        prop_assert!(!window.is_adjusted());
    }

    /// A length mismatch is always reported as malformed
    #[test]
    fn length_mismatch_is_malformed(requested in small_range(), delta in 1..5usize, shorter in any::<bool>()) {
        let span = requested.span() as usize;
        let len = if shorter { span.saturating_sub(delta) } else { span + delta };
        prop_assume!(len != span);

        let window = reconcile(requested, &ProviderResponse::bases("C".repeat(len)));
        prop_assert!(!window.is_ok());
        prop_assert!(window.bases().is_empty());
        let is_malformed = matches!(window.error(), Some(WindowError::Malformed(_)));
        prop_assert!(is_malformed);
    }

    /// A provider-reported range different from the request is kept as is
    #[test]
    fn adjusted_range_is_kept(requested in small_range(), shift in 1..100u64) {
        let actual = ViewRange::new(requested.start() + shift, requested.end() + shift).unwrap();
        let response = ProviderResponse::with_range(
            "G".repeat(actual.span() as usize),
            actual.start(),
            actual.end(),
        );
        let window = reconcile(requested, &response);
        prop_assert!(window.is_ok());
        prop_assert!(window.is_adjusted());
        prop_assert_eq!(window.actual_range(), Some(actual));
        prop_assert_eq!(window.requested_range(), requested);
    }

    /// Each base of a window is found at its genomic position
    #[test]
    fn base_at_matches_offset(
        (requested, seq, offset) in small_range().prop_flat_map(|r| {
            let span = r.span() as usize;
            (Just(r), bases(span), 0..span)
        })
    ) {
        let window = reconcile(requested, &ProviderResponse::bases(seq.clone()));
        let expected = seq.as_bytes()[offset].to_ascii_uppercase() as char;
        prop_assert_eq!(window.base_at(requested.start() + offset as u64), Some(expected));
        prop_assert_eq!(window.base_at(requested.end()), None);
    }
}
