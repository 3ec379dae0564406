//! Range normalization of numeric data.
//!
//! Values are rescaled into `[min_val, max_val]` using a single minimum and
//! maximum taken over the whole array, never per row or per column. When the
//! array was stacked from several columns the columns therefore share one
//! scale, which is what lets a column group render on one coherent colormap.

use polars::prelude::*;

use crate::error::Result;

/// Dense row-major array of optional `f64` values with an explicit shape.
///
/// `None` marks a cell with no numeric value (null in the source frame, or a
/// non-finite value after normalization).
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    shape: Vec<usize>,
    values: Vec<Option<f64>>,
}

impl NumericArray {
    /// Wrap `values` with the given `shape`.
    ///
    /// # Panics
    /// If the product of `shape` differs from `values.len()`.
    pub fn new(shape: Vec<usize>, values: Vec<Option<f64>>) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            expected,
            values.len(),
            "shape {:?} does not hold {} values",
            shape,
            values.len()
        );
        Self { shape, values }
    }

    /// One-dimensional array of present values.
    pub fn from_values(values: Vec<f64>) -> Self {
        let len = values.len();
        Self::new(vec![len], values.into_iter().map(Some).collect())
    }

    /// Cast a single frame column to `f64`, keeping nulls as `None`.
    pub fn from_column(column: &Column) -> Result<Self> {
        let values = column_as_f64(column)?;
        Ok(Self::new(vec![values.len()], values))
    }

    /// Stack several named columns into a `(rows, columns)` array.
    ///
    /// Each column is cast to `f64` independently and then laid out side by
    /// side, so row `r` of the result holds row `r` of every column in the
    /// order given.
    pub fn from_columns(frame: &DataFrame, names: &[&str]) -> Result<Self> {
        let rows = frame.height();
        let width = names.len();
        let mut values = vec![None; rows * width];
        for (offset, name) in names.iter().enumerate() {
            let column_values = column_as_f64(frame.column(name)?)?;
            for (row, value) in column_values.into_iter().enumerate() {
                values[row * width + offset] = value;
            }
        }
        Ok(Self::new(vec![rows, width], values))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `(row, offset)` treating the array as row-major 2-D.
    ///
    /// One-dimensional arrays are addressed with `offset == 0`.
    pub fn at(&self, row: usize, offset: usize) -> Option<f64> {
        let width = if self.shape.len() >= 2 {
            self.shape[1..].iter().product()
        } else {
            1
        };
        self.values.get(row * width + offset).copied().flatten()
    }

    /// Smallest and largest finite values, if any are present.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |range, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn column_as_f64(column: &Column) -> Result<Vec<Option<f64>>> {
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.f64()?.iter().collect())
}

/// Rescale every value of `array` into `[min_val, max_val]`.
///
/// The scale is `(x - lo) / (hi - lo) * (max_val - min_val) + min_val`, with
/// `lo`/`hi` the global finite minimum and maximum of the whole array. The
/// output has the input's shape. With `round_up` each value is rounded to the
/// nearest integer, ties to even.
///
/// Non-finite and missing inputs are left out of the min/max scan and come
/// out as `None`, as does any result that is not finite. When every finite
/// value is identical (`hi == lo`) the scale is undefined; each of them maps
/// to `min_val` instead.
pub fn range_normalize(
    array: &NumericArray,
    min_val: f64,
    max_val: f64,
    round_up: bool,
) -> NumericArray {
    let Some((lo, hi)) = array.finite_range() else {
        return NumericArray::new(array.shape.clone(), vec![None; array.len()]);
    };

    // halving keeps the span finite when the extremes are near f64::MAX apart
    let (offset, span, scale) = match hi - lo {
        span if span.is_finite() => (lo, span, 1.0),
        _ => (lo * 0.5, hi * 0.5 - lo * 0.5, 0.5),
    };
    let degenerate = span == 0.0;
    if degenerate {
        log::debug!(
            "degenerate normalization range [{lo}, {hi}] over {} values, mapping to {min_val}",
            array.len()
        );
    }

    let values = array
        .values
        .iter()
        .map(|value| {
            let x = (*value).filter(|x| x.is_finite())?;
            let scaled = if degenerate {
                min_val
            } else {
                (x * scale - offset) / span * (max_val - min_val) + min_val
            };
            let scaled = if round_up {
                scaled.round_ties_even()
            } else {
                scaled
            };
            scaled.is_finite().then_some(scaled)
        })
        .collect();

    NumericArray::new(array.shape.clone(), values)
}
