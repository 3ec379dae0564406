//! Property tests for range normalization.
//!
//! For any finite input with distinct extremes:
//!
//! 1. The output spans exactly `[lo, hi]`.
//! 2. The mapping preserves the order of the inputs.
//! 3. The output keeps the input's shape.
//! 4. Rounded output is integer valued and stays inside the target range.

use heatgrid::normalize::{range_normalize, NumericArray};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn array_strategy() -> impl Strategy<Value = NumericArray> {
    (1usize..=12, 1usize..=5).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(-1.0e6f64..1.0e6, rows * cols)
            .prop_map(move |values| {
                NumericArray::new(vec![rows, cols], values.into_iter().map(Some).collect())
            })
    })
}

fn target_strategy() -> impl Strategy<Value = (f64, f64)> {
    (-1000.0f64..1000.0, 1.0f64..1000.0).prop_map(|(lo, span)| (lo, lo + span))
}

fn present(array: &NumericArray) -> Vec<f64> {
    array.values().iter().map(|v| v.unwrap()).collect()
}

fn has_distinct_extremes(array: &NumericArray) -> bool {
    matches!(array.finite_range(), Some((lo, hi)) if lo < hi)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Output spans the target range
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn output_spans_target(array in array_strategy(), (lo, hi) in target_strategy()) {
        prop_assume!(has_distinct_extremes(&array));

        let out = range_normalize(&array, lo, hi, false);
        let (min, max) = out.finite_range().unwrap();
        let tolerance = 1e-9 * (hi - lo).abs().max(1.0);

        prop_assert!((min - lo).abs() <= tolerance, "min {} != {}", min, lo);
        prop_assert!((max - hi).abs() <= tolerance, "max {} != {}", max, hi);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Order preserving
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn order_preserving(array in array_strategy(), (lo, hi) in target_strategy()) {
        let input = present(&array);
        let output = present(&range_normalize(&array, lo, hi, false));

        for i in 0..input.len() {
            for j in 0..input.len() {
                if input[i] <= input[j] {
                    prop_assert!(
                        output[i] <= output[j],
                        "{} <= {} but {} > {}",
                        input[i], input[j], output[i], output[j]
                    );
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Shape preserving
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn shape_preserving(array in array_strategy(), round in any::<bool>()) {
        let out = range_normalize(&array, 0.0, 255.0, round);
        prop_assert_eq!(out.shape(), array.shape());
        prop_assert_eq!(out.len(), array.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Rounded output is integral and in range
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rounded_is_integral(array in array_strategy()) {
        let out = range_normalize(&array, 0.0, 255.0, true);
        for value in present(&out) {
            prop_assert_eq!(value.fract(), 0.0, "{} is not integral", value);
            prop_assert!((0.0..=255.0).contains(&value), "{} out of range", value);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Constant input never yields NaN
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn constant_input_is_defined(value in -1.0e6f64..1.0e6, len in 1usize..20) {
        let array = NumericArray::from_values(vec![value; len]);
        let out = range_normalize(&array, 0.0, 255.0, true);
        prop_assert!(out.values().iter().all(|v| *v == Some(0.0)));
    }
}
