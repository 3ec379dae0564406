//! Canonical record layout for incoming arrays.
//!
//! Every table is a polars frame whose first column is a synthetic `Idx`
//! column holding each row's position in the original input. Record frames
//! keep their own columns; rank-2 arrays get one column per array column,
//! named `"0"`, `"1"`, ...

use polars::prelude::*;

use crate::error::{Result, TableError};

/// Name of the synthetic row identity column.
pub const IDX_COLUMN: &str = "Idx";

pub fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

pub fn is_float_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Integer or floating point; the types a colormap can be bound to.
pub fn is_numeric_type(dtype: &DataType) -> bool {
    is_integer_type(dtype) || is_float_type(dtype)
}

/// A homogeneous array stored flat in row-major order with an explicit shape.
#[derive(Debug, Clone)]
pub struct DenseArray {
    shape: Vec<usize>,
    values: Series,
}

impl DenseArray {
    /// Wrap a flat series. The element count must match `shape`.
    pub fn new(shape: Vec<usize>, values: Series) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(TableError::schema(format!(
                "shape {:?} needs {} elements but {} were given",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    /// Build a rank-2 array from nested rows, all of the same length.
    pub fn from_rows<T>(rows: Vec<Vec<T>>) -> Result<Self>
    where
        Series: NamedFrom<Vec<T>, [T]>,
    {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TableError::schema(format!(
                "row {} has {} elements, expected {}",
                i,
                row.len(),
                width
            )));
        }
        let shape = vec![rows.len(), width];
        let flat: Vec<T> = rows.into_iter().flatten().collect();
        Self::new(shape, Series::new("values".into(), flat))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> &DataType {
        self.values.dtype()
    }
}

/// Input accepted by the table engine.
#[derive(Debug, Clone)]
pub enum RawArray {
    /// One-dimensional sequence of named, independently typed records.
    Records(DataFrame),
    /// Homogeneous array; only rank 2 is accepted.
    Dense(DenseArray),
}

impl From<DataFrame> for RawArray {
    fn from(frame: DataFrame) -> Self {
        RawArray::Records(frame)
    }
}

impl From<DenseArray> for RawArray {
    fn from(array: DenseArray) -> Self {
        RawArray::Dense(array)
    }
}

/// Build the canonical record frame for `input`, with `Idx` prepended.
pub fn build(input: RawArray) -> Result<DataFrame> {
    match input {
        RawArray::Records(frame) => records_frame(frame),
        RawArray::Dense(array) => dense_frame(array),
    }
}

fn idx_column(rows: usize) -> Column {
    Column::new(IDX_COLUMN.into(), (0..rows as i64).collect::<Vec<i64>>())
}

fn records_frame(frame: DataFrame) -> Result<DataFrame> {
    if frame
        .get_column_names()
        .iter()
        .any(|name| name.as_str() == IDX_COLUMN)
    {
        return Err(TableError::schema(format!(
            "records already contain a column named '{IDX_COLUMN}'"
        )));
    }

    let mut columns = Vec::with_capacity(frame.width() + 1);
    columns.push(idx_column(frame.height()));
    columns.extend(frame.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

fn dense_frame(array: DenseArray) -> Result<DataFrame> {
    let (rows, width) = match array.shape.as_slice() {
        [rows, width] => (*rows, *width),
        other => {
            return Err(TableError::schema(format!(
                "expected a rank-2 array, got rank {} with shape {:?}",
                other.len(),
                other
            )))
        }
    };
    if array.values.dtype().is_nested() {
        return Err(TableError::schema(format!(
            "dense arrays must hold scalars, got {}",
            array.values.dtype()
        )));
    }

    let mut columns = Vec::with_capacity(width + 1);
    columns.push(idx_column(rows));
    for j in 0..width {
        let indices = IdxCa::new(
            "indices".into(),
            (0..rows)
                .map(|r| (r * width + j) as IdxSize)
                .collect::<Vec<IdxSize>>(),
        );
        let column = array.values.take(&indices)?.with_name(j.to_string().into());
        columns.push(column.into());
    }
    Ok(DataFrame::new(columns)?)
}
