#![allow(dead_code)]

use polars::prelude::*;

/// Five trading days of price bars.
pub fn ohlcv() -> DataFrame {
    df!(
        "Open" => &[100.0, 102.5, 101.0, 98.0, 99.5],
        "High" => &[103.0, 104.0, 102.0, 100.0, 120.0],
        "Low" => &[99.0, 101.0, 97.0, 95.0, 99.0],
        "Close" => &[102.5, 101.0, 98.0, 99.5, 118.0],
        "Volume" => &[12_000i64, 8_500, 20_000, 1_250_000, 15_000]
    )
    .unwrap()
}

/// Mixed-type records with a null, a negative value, and tied sort keys.
pub fn mixed_records() -> DataFrame {
    df!(
        "name" => &["delta", "alpha", "charlie", "bravo", "echo"],
        "score" => &[Some(3i32), Some(1), None, Some(3), Some(-2)],
        "ratio" => &[0.25f64, -1.5, 2.0, 0.25, 1.0]
    )
    .unwrap()
}

/// Row header labels in current order.
pub fn row_ids(model: &heatgrid::TabularModel) -> Vec<i64> {
    (0..model.row_count()).map(|row| model.row_id(row)).collect()
}
