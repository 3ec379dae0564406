//! Tabular presentation engine.
//!
//! Wraps a record frame (or a rank-2 array) in a [`TabularModel`] that a
//! table view queries cell by cell: display strings from per-column format
//! rules, alignment, negative-value hints and background colors taken from
//! colormaps normalized over single columns or column groups.
//!
//! ```no_run
//! use heatgrid::{TableOptions, TabularModel, Target};
//! use polars::prelude::*;
//!
//! # fn main() -> heatgrid::Result<()> {
//! let frame = df!(
//!     "Open" => &[10.0, 12.5, 9.0],
//!     "Close" => &[11.0, 12.0, 8.5]
//! )?;
//! let options = TableOptions::default()
//!     .with_format("Open", "{:,.2f}")
//!     .with_colormap("RdBu", vec![Target::group(["Open", "Close"])]);
//! let mut table = TabularModel::new(frame, options)?;
//!
//! table.sort_by_column_name("Close", false)?;
//! table.redraw()?;
//! let color = table.cell_overlay_color(0, 2);
//! # Ok(())
//! # }
//! ```

pub mod colormap;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod style;

pub use colormap::{ColormapTable, ContinuousColormap, Rgba};
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorMode, ColorParser, ConfigManager, Theme,
};
pub use error::{Result, RuleKind, TableError};
pub use format::CellFormat;
pub use model::{
    CellAlignment, ColormapBinding, ColormapSelection, ForegroundHint, Orientation, TableOptions,
    TabularModel, Target,
};
pub use normalize::{range_normalize, NumericArray};
pub use schema::{DenseArray, RawArray, IDX_COLUMN};
pub use style::CellStyler;

/// Application name used for the config directory
pub const APP_NAME: &str = "heatgrid";
