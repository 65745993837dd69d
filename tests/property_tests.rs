//! Property-based tests for the quantity ledger and status derivation.
//!
//! These cover the derivation rules across a wide range of quantity pairs
//! and line mixes, to catch edge cases the example-based tests miss.

use proptest::prelude::*;
use rust_decimal::Decimal;

use procurement_api::models::{derive_header_status, LineStatus, RequisitionStatus};
use procurement_api::numbering::format_number;

// Strategies

/// Quantities with two decimal places, strictly positive.
fn requested_cents() -> impl Strategy<Value = i64> {
    1i64..=1_000_000
}

/// A `(requested, fulfilled)` pair with `0 <= fulfilled <= requested`.
fn consistent_pair() -> impl Strategy<Value = (Decimal, Decimal)> {
    requested_cents().prop_flat_map(|requested| {
        (Just(requested), 0i64..=requested)
            .prop_map(|(req, ful)| (Decimal::new(req, 2), Decimal::new(ful, 2)))
    })
}

fn line_status() -> impl Strategy<Value = LineStatus> {
    prop_oneof![
        Just(LineStatus::Pending),
        Just(LineStatus::PartiallyFulfilled),
        Just(LineStatus::FullyFulfilled),
    ]
}

fn any_status() -> impl Strategy<Value = RequisitionStatus> {
    prop_oneof![
        Just(RequisitionStatus::Draft),
        Just(RequisitionStatus::Submitted),
        Just(RequisitionStatus::Approved),
        Just(RequisitionStatus::Rejected),
        Just(RequisitionStatus::PartiallyFulfilled),
        Just(RequisitionStatus::FullyFulfilled),
    ]
}

fn rank(status: LineStatus) -> u8 {
    match status {
        LineStatus::Pending => 0,
        LineStatus::PartiallyFulfilled => 1,
        LineStatus::FullyFulfilled => 2,
    }
}

// Property: line status derivation is total over consistent quantity pairs
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn consistent_pairs_always_derive((requested, fulfilled) in consistent_pair()) {
        let status = LineStatus::derive(requested, fulfilled)
            .expect("consistent pair must derive");

        let expected = if fulfilled == Decimal::ZERO {
            LineStatus::Pending
        } else if fulfilled < requested {
            LineStatus::PartiallyFulfilled
        } else {
            LineStatus::FullyFulfilled
        };
        prop_assert_eq!(status, expected);
    }

    #[test]
    fn dispatching_more_never_moves_a_line_backwards(
        requested in requested_cents(),
        split in 0..=100i64,
        extra in 0..=100i64,
    ) {
        let requested_qty = Decimal::new(requested, 2);
        let before = Decimal::new(requested * split / 100, 2);
        let after = Decimal::new((requested * split / 100 + requested * extra / 100).min(requested), 2);

        let low = LineStatus::derive(requested_qty, before).expect("before derives");
        let high = LineStatus::derive(requested_qty, after).expect("after derives");
        prop_assert!(rank(low) <= rank(high));
    }

    #[test]
    fn over_fulfillment_is_always_an_integrity_error(
        requested in requested_cents(),
        excess in 1i64..=1_000_000,
    ) {
        let requested_qty = Decimal::new(requested, 2);
        let fulfilled = Decimal::new(requested + excess, 2);
        prop_assert!(LineStatus::derive(requested_qty, fulfilled).is_err());
    }

    #[test]
    fn non_positive_requested_is_always_an_integrity_error(
        requested in -1_000_000i64..=0,
        fulfilled in 0i64..=1_000_000,
    ) {
        let result = LineStatus::derive(Decimal::new(requested, 2), Decimal::new(fulfilled, 2));
        prop_assert!(result.is_err());
    }

    #[test]
    fn negative_fulfilled_is_always_an_integrity_error(
        requested in requested_cents(),
        fulfilled in -1_000_000i64..=-1,
    ) {
        let result = LineStatus::derive(Decimal::new(requested, 2), Decimal::new(fulfilled, 2));
        prop_assert!(result.is_err());
    }
}

// Property: the header status is a pure function of current status and lines
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn header_derivation_is_idempotent(
        current in any_status(),
        lines in prop::collection::vec(line_status(), 0..12),
    ) {
        let once = derive_header_status(current, &lines);
        let twice = derive_header_status(once, &lines);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn pre_approval_statuses_pass_through_unchanged(
        current in prop_oneof![
            Just(RequisitionStatus::Draft),
            Just(RequisitionStatus::Submitted),
            Just(RequisitionStatus::Rejected),
        ],
        lines in prop::collection::vec(line_status(), 0..12),
    ) {
        prop_assert_eq!(derive_header_status(current, &lines), current);
    }

    #[test]
    fn post_approval_header_matches_the_line_mix(
        current in prop_oneof![
            Just(RequisitionStatus::Approved),
            Just(RequisitionStatus::PartiallyFulfilled),
            Just(RequisitionStatus::FullyFulfilled),
        ],
        lines in prop::collection::vec(line_status(), 1..12),
    ) {
        let derived = derive_header_status(current, &lines);

        if lines.iter().all(|s| *s == LineStatus::FullyFulfilled) {
            prop_assert_eq!(derived, RequisitionStatus::FullyFulfilled);
        } else if lines.iter().any(|s| *s != LineStatus::Pending) {
            prop_assert_eq!(derived, RequisitionStatus::PartiallyFulfilled);
        } else {
            prop_assert_eq!(derived, RequisitionStatus::Approved);
        }
    }

    #[test]
    fn empty_line_sets_never_change_the_header(current in any_status()) {
        prop_assert_eq!(derive_header_status(current, &[]), current);
    }
}

// Property: ledger derivation end to end, from quantity pairs to the header
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn header_is_fully_fulfilled_only_when_every_pair_is_exhausted(
        pairs in prop::collection::vec(consistent_pair(), 1..8),
    ) {
        let statuses: Vec<LineStatus> = pairs
            .iter()
            .map(|(req, ful)| LineStatus::derive(*req, *ful).expect("consistent pair"))
            .collect();
        let header = derive_header_status(RequisitionStatus::Approved, &statuses);

        let exhausted = pairs.iter().all(|(req, ful)| req == ful);
        let untouched = pairs.iter().all(|(_, ful)| ful.is_zero());

        if exhausted {
            prop_assert_eq!(header, RequisitionStatus::FullyFulfilled);
        } else if untouched {
            prop_assert_eq!(header, RequisitionStatus::Approved);
        } else {
            prop_assert_eq!(header, RequisitionStatus::PartiallyFulfilled);
        }
    }
}

// Property: document numbers keep their shape for any allocation
proptest! {
    #[test]
    fn document_numbers_round_trip(
        prefix in prop_oneof!["PR", "PO", "SI", "MT"],
        value in 1i64..=999_999,
    ) {
        let number = format_number(&prefix, value);
        let expected_prefix = format!("{}-", prefix);
        prop_assert!(number.starts_with(&expected_prefix));
        prop_assert_eq!(number.len(), prefix.len() + 7);

        let digits = &number[prefix.len() + 1..];
        prop_assert_eq!(digits.parse::<i64>().expect("digits parse"), value);
    }
}
