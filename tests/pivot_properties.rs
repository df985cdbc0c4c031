//! Properties every pivot variant keeps over a grid of realistic sessions.

use pivotick_core::{
    compute_pivots_from_prices, PivotBands, PivotVariant, Precision, ValidationError,
};

const TOLERANCE: f64 = 1e-9;

/// (high, low, close) sessions spanning penny stocks to four-digit quotes,
/// closes at either extreme, and flat days.
fn sessions() -> Vec<(f64, f64, f64)> {
    let mut sessions = Vec::new();
    for (high, low) in [
        (10.15, 9.87),
        (582.0, 574.0),
        (2415.0, 2340.0),
        (1085.0, 1060.0),
        (0.5, 0.41),
        (100.0, 100.0),
    ] {
        for step in 0..=4 {
            let close = low + (high - low) * f64::from(step) / 4.0;
            sessions.push((high, low, close));
        }
    }
    sessions
}

fn raw(high: f64, low: f64, close: f64, variant: PivotVariant) -> PivotBands {
    let unrounded = Precision::new(4).expect("valid precision");
    compute_pivots_from_prices(high, low, close, variant, unrounded).expect("valid prices")
}

fn assert_ordered(bands: &PivotBands, context: &str) {
    assert!(bands.ah >= bands.nh, "{context}: ah {} < nh {}", bands.ah, bands.nh);
    assert!(bands.nh >= bands.nl, "{context}: nh {} < nl {}", bands.nh, bands.nl);
    assert!(bands.nl >= bands.al, "{context}: nl {} < al {}", bands.nl, bands.al);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn bands_are_ordered_for_every_variant() {
    for variant in PivotVariant::ALL {
        for (high, low, close) in sessions() {
            let bands = raw(high, low, close, variant);
            assert_ordered(&bands, &format!("{variant} H={high} L={low} C={close}"));
        }
    }
}

#[test]
fn rounding_never_breaks_ordering() {
    for variant in PivotVariant::ALL {
        for digits in 0..=4 {
            let precision = Precision::new(digits).expect("valid precision");
            for (high, low, close) in sessions() {
                let bands = compute_pivots_from_prices(high, low, close, variant, precision)
                    .expect("valid prices");
                assert_ordered(&bands, &format!("{variant}/{digits} H={high} L={low} C={close}"));
            }
        }
    }
}

#[test]
fn cdp_lies_within_the_session_range() {
    for variant in PivotVariant::ALL {
        for (high, low, close) in sessions() {
            let bands = raw(high, low, close, variant);
            assert!(
                bands.cdp >= low - 1e-4 && bands.cdp <= high + 1e-4,
                "{variant}: cdp {} outside [{low}, {high}]",
                bands.cdp
            );
        }
    }
}

// ============================================================================
// Band width
// ============================================================================

#[test]
fn full_range_variants_span_twice_the_session_range() {
    for variant in [PivotVariant::Classic, PivotVariant::TypicalFullRange] {
        for (high, low, close) in sessions() {
            let bands = raw(high, low, close, variant);
            let width = bands.ah - bands.al;
            assert!(
                (width - 2.0 * (high - low)).abs() < 1e-3,
                "{variant}: width {width} for H={high} L={low}"
            );
        }
    }
}

#[test]
fn half_distance_variant_spans_the_session_range() {
    for (high, low, close) in sessions() {
        let bands = raw(high, low, close, PivotVariant::TypicalHalfDistance);
        let width = bands.ah - bands.al;
        assert!(
            (width - (high - low)).abs() < 1e-3,
            "width {width} for H={high} L={low}"
        );
    }
}

#[test]
fn flat_session_collapses_every_band() {
    for variant in PivotVariant::ALL {
        let bands = raw(100.0, 100.0, 100.0, variant);
        for level in [bands.cdp, bands.ah, bands.nh, bands.nl, bands.al] {
            assert!((level - 100.0).abs() < TOLERANCE, "{variant}: {bands:?}");
        }
    }
}

// ============================================================================
// Purity and rejection
// ============================================================================

#[test]
fn same_inputs_give_identical_bands() {
    for variant in PivotVariant::ALL {
        for (high, low, close) in sessions() {
            let first = compute_pivots_from_prices(high, low, close, variant, Precision::default());
            let second = compute_pivots_from_prices(high, low, close, variant, Precision::default());
            assert_eq!(first, second);
        }
    }
}

#[test]
fn classic_matches_the_published_formula() {
    // Given: a session whose values stay exact in binary floating point
    let bands = compute_pivots_from_prices(
        582.0,
        574.0,
        576.0,
        PivotVariant::Classic,
        Precision::default(),
    )
    .expect("valid prices");

    // Then: cdp = (H + L + 2C) / 4, ah = cdp + range, nh = 2cdp - L
    assert_eq!(bands.cdp, 577.0);
    assert_eq!(bands.ah, 585.0);
    assert_eq!(bands.nh, 580.0);
    assert_eq!(bands.nl, 572.0);
    assert_eq!(bands.al, 569.0);
}

#[test]
fn inconsistent_prices_are_rejected_before_any_arithmetic() {
    let cases = [
        (90.0, 100.0, 95.0),
        (100.0, 90.0, 101.0),
        (100.0, 90.0, 89.0),
        (100.0, 0.0, 50.0),
        (f64::NAN, 90.0, 95.0),
        (f64::INFINITY, 90.0, 95.0),
    ];

    for variant in PivotVariant::ALL {
        for (high, low, close) in cases {
            let result = compute_pivots_from_prices(high, low, close, variant, Precision::default());
            assert!(
                matches!(
                    result,
                    Err(ValidationError::InvalidRange
                        | ValidationError::CloseOutOfRange
                        | ValidationError::NonPositiveValue { .. }
                        | ValidationError::NonFiniteValue { .. })
                ),
                "{variant} H={high} L={low} C={close} gave {result:?}"
            );
        }
    }
}
