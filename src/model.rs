//! The tabular presentation engine.
//!
//! [`TabularModel`] owns the canonical record frame and everything derived
//! from its schema: per-column display formats, alignments and colormap
//! bindings. A view adapter queries it one cell at a time; the only
//! mutations are [`TabularModel::sort_by_column`] and
//! [`TabularModel::redraw`].
//!
//! Overlay colors come from per-target caches of normalized values. Those
//! caches follow row order, so they go stale on every sort. The engine does
//! not refresh them on its own: callers invoke `redraw` after reordering and
//! before asking for overlay colors again.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::colormap::{ColormapTable, Rgba, DEFAULT_COLORMAP, DEFAULT_SAMPLES};
use crate::config::AppConfig;
use crate::error::{Result, RuleKind, TableError};
use crate::format::{numeric_value, CellFormat};
use crate::normalize::{range_normalize, NumericArray};
use crate::schema::{self, is_numeric_type, RawArray, IDX_COLUMN};

/// Horizontal placement of a cell's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellAlignment {
    Left,
    Center,
    Right,
}

/// Which header a label is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Column headers; sections are column positions.
    Horizontal,
    /// Row headers; sections are physical row positions.
    Vertical,
}

/// Rendering hint for a cell's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundHint {
    /// The cell holds a negative number.
    Negative,
}

/// Columns sharing one colormap scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Column(String),
    Group(Vec<String>),
}

impl Target {
    pub fn column(name: impl Into<String>) -> Self {
        Target::Column(name.into())
    }

    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Target::Group(names.into_iter().map(Into::into).collect())
    }

    fn names(&self) -> Vec<&str> {
        match self {
            Target::Column(name) => vec![name.as_str()],
            Target::Group(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A named colormap and the targets it shades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColormapBinding {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Which columns get overlay colors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SelectionRepr")]
pub enum ColormapSelection {
    /// Every numeric data column, as one group, on the default colormap.
    AllColumns,
    /// Explicit bindings; earlier bindings win where targets overlap.
    Bindings(Vec<ColormapBinding>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Keyword(String),
    Bindings(Vec<ColormapBinding>),
}

impl TryFrom<SelectionRepr> for ColormapSelection {
    type Error = String;

    fn try_from(repr: SelectionRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            SelectionRepr::Keyword(word) if word == "all" => Ok(ColormapSelection::AllColumns),
            SelectionRepr::Keyword(word) => Err(format!(
                "unknown colormap selection '{word}', expected \"all\" or a list of bindings"
            )),
            SelectionRepr::Bindings(bindings) => Ok(ColormapSelection::Bindings(bindings)),
        }
    }
}

/// Construction options for a [`TabularModel`].
///
/// Rule sets are optional: an absent alignment rule set leaves non-`Idx`
/// columns unaligned, while a present one defaults missing columns to left.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Column name to format template, e.g. `"{:,.2f}"`.
    pub formats: Option<HashMap<String, String>>,
    pub alignment: Option<HashMap<String, CellAlignment>>,
    pub colormaps: Option<ColormapSelection>,
    /// Alpha written into every colormap entry.
    pub alpha: Option<u8>,
    /// Fractional digits for floats without a format rule.
    pub float_precision: usize,
    /// Thousands separators in the type-driven defaults.
    pub grouping: bool,
    /// Colormap used when none is bound and for [`ColormapSelection::AllColumns`].
    pub default_colormap: String,
    /// Entries per colormap table.
    pub samples: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            formats: None,
            alignment: None,
            colormaps: None,
            alpha: None,
            float_precision: 4,
            grouping: true,
            default_colormap: DEFAULT_COLORMAP.to_string(),
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl TableOptions {
    /// Options seeded from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            alpha: config.colormap.alpha,
            float_precision: config.display.float_precision,
            grouping: config.display.grouping,
            default_colormap: config.colormap.default.clone(),
            samples: config.colormap.samples,
            ..Self::default()
        }
    }

    /// Parse a TOML view profile.
    ///
    /// ```toml
    /// alpha = 255
    ///
    /// [formats]
    /// Volume = "{:,.0f}"
    ///
    /// [alignment]
    /// Open = "center"
    ///
    /// [[colormaps]]
    /// name = "RdBu"
    /// targets = [["Open", "High", "Low", "Close"], "Volume"]
    /// ```
    ///
    /// `colormaps = "all"` selects every numeric column instead.
    pub fn from_toml_str(profile: &str) -> Result<Self> {
        Ok(toml::from_str(profile)?)
    }

    pub fn with_format(mut self, column: impl Into<String>, template: impl Into<String>) -> Self {
        self.formats
            .get_or_insert_with(HashMap::new)
            .insert(column.into(), template.into());
        self
    }

    pub fn with_alignment(mut self, column: impl Into<String>, alignment: CellAlignment) -> Self {
        self.alignment
            .get_or_insert_with(HashMap::new)
            .insert(column.into(), alignment);
        self
    }

    /// Bind `targets` to the colormap `name`, appending to an existing
    /// binding of the same name.
    pub fn with_colormap(mut self, name: impl Into<String>, targets: Vec<Target>) -> Self {
        let name = name.into();
        if !matches!(self.colormaps, Some(ColormapSelection::Bindings(_))) {
            self.colormaps = Some(ColormapSelection::Bindings(Vec::new()));
        }
        if let Some(ColormapSelection::Bindings(bindings)) = &mut self.colormaps {
            match bindings.iter_mut().find(|b| b.name == name) {
                Some(binding) => binding.targets.extend(targets),
                None => bindings.push(ColormapBinding { name, targets }),
            }
        }
        self
    }

    pub fn with_all_columns(mut self) -> Self {
        self.colormaps = Some(ColormapSelection::AllColumns);
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    pub fn with_default_colormap(mut self, name: impl Into<String>) -> Self {
        self.default_colormap = name.into();
        self
    }
}

/// Bijection between column names and positions.
#[derive(Debug, Clone)]
struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(frame: &DataFrame) -> Self {
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, positions }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    fn require(&self, name: &str, rule: RuleKind) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| TableError::unknown_column(name, rule))
    }
}

#[derive(Debug, Clone)]
struct BoundTarget {
    names: Vec<String>,
    grouped: bool,
    /// Normalized colormap indices, in current row order.
    levels: NumericArray,
}

#[derive(Debug, Clone)]
struct BoundColormap {
    table: ColormapTable,
    targets: Vec<BoundTarget>,
}

#[derive(Debug, Clone, Copy)]
struct OverlaySlot {
    binding: usize,
    target: usize,
    offset: usize,
}

/// Presentation engine over one record frame.
#[derive(Debug, Clone)]
pub struct TabularModel {
    frame: DataFrame,
    columns: ColumnIndex,
    formats: Vec<CellFormat>,
    alignments: Vec<Option<CellAlignment>>,
    colormaps: Vec<BoundColormap>,
    overlay_slots: Vec<Option<OverlaySlot>>,
    alpha: Option<u8>,
    stale: bool,
}

impl TabularModel {
    /// Build a table from `input`.
    ///
    /// Every rule is validated here: unknown columns, unknown colormaps,
    /// malformed formats and non-numeric colormap targets all fail
    /// construction. Colormap caches are computed before returning.
    pub fn new(input: impl Into<RawArray>, options: TableOptions) -> Result<Self> {
        let frame = schema::build(input.into())?;
        let columns = ColumnIndex::new(&frame);

        let formats = resolve_formats(&frame, &columns, &options)?;
        let alignments = resolve_alignments(&columns, options.alignment.as_ref())?;
        let colormaps = prepare_colormaps(&frame, &columns, &options)?;
        let overlay_slots = overlay_slots(&columns, &colormaps);

        log::debug!(
            "built table: {} rows x {} columns, {} colormap binding(s)",
            frame.height(),
            frame.width(),
            colormaps.len()
        );

        Ok(Self {
            frame,
            columns,
            formats,
            alignments,
            colormaps,
            overlay_slots,
            alpha: options.alpha,
            stale: false,
        })
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    /// Underlying frame in current row order.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.position(name)
    }

    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.columns.names.get(col).map(String::as_str)
    }

    /// Global alpha override applied to colormap tables, if any.
    pub fn alpha(&self) -> Option<u8> {
        self.alpha
    }

    /// Lookup table of the first binding using colormap `name`.
    pub fn colormap_table(&self, name: &str) -> Option<&ColormapTable> {
        self.colormaps
            .iter()
            .map(|bound| &bound.table)
            .find(|table| table.name() == name)
    }

    /// Whether rows were reordered since the last [`redraw`](Self::redraw).
    pub fn needs_redraw(&self) -> bool {
        self.stale
    }

    /// Raw value at `(row, col)`.
    ///
    /// # Panics
    /// If `row` or `col` is outside the table.
    pub fn cell_value(&self, row: usize, col: usize) -> AnyValue<'_> {
        self.check_bounds(row, col);
        self.frame.get_columns()[col]
            .get(row)
            .unwrap_or(AnyValue::Null)
    }

    /// Display text at `(row, col)` after applying the column's format.
    pub fn cell_display_string(&self, row: usize, col: usize) -> String {
        let value = self.cell_value(row, col);
        self.formats[col].render(&value)
    }

    /// Alignment at `(row, col)`.
    ///
    /// `Idx` is always centered. Other columns follow the alignment rules,
    /// defaulting to left; without any alignment rules they return `None`
    /// and the view decides.
    pub fn cell_alignment(&self, row: usize, col: usize) -> Option<CellAlignment> {
        self.check_bounds(row, col);
        self.alignments[col]
    }

    /// Overlay color at `(row, col)` from the first binding covering `col`.
    ///
    /// Returns `None` when no binding targets the column or the cell has no
    /// numeric value. Reflects the row order at the last redraw.
    pub fn cell_overlay_color(&self, row: usize, col: usize) -> Option<Rgba> {
        self.check_bounds(row, col);
        let slot = self.overlay_slots[col]?;
        let bound = &self.colormaps[slot.binding];
        let level = bound.targets[slot.target].levels.at(row, slot.offset)?;
        bound.table.get(level as usize)
    }

    /// [`ForegroundHint::Negative`] for numeric cells below zero.
    pub fn cell_foreground_hint(&self, row: usize, col: usize) -> Option<ForegroundHint> {
        let value = self.cell_value(row, col);
        if !is_numeric_type(self.frame.get_columns()[col].dtype()) {
            return None;
        }
        match numeric_value(&value) {
            Some(v) if v < 0.0 => Some(ForegroundHint::Negative),
            _ => None,
        }
    }

    /// Header text for a section.
    ///
    /// Column headers are column names. Row headers are the row's `Idx`
    /// value rather than its position, so rows keep their label across
    /// sorts.
    pub fn header_label(&self, section: usize, orientation: Orientation) -> String {
        match orientation {
            Orientation::Horizontal => {
                assert!(
                    section < self.column_count(),
                    "column {} out of range for table with {} columns",
                    section,
                    self.column_count()
                );
                self.columns.names[section].clone()
            }
            Orientation::Vertical => self.row_id(section).to_string(),
        }
    }

    /// Original input position of the row currently at `row`.
    pub fn row_id(&self, row: usize) -> i64 {
        match self.cell_value(row, 0) {
            AnyValue::Int64(id) => id,
            other => numeric_value(&other).map(|v| v as i64).unwrap_or_default(),
        }
    }

    /// Stable sort of all rows by column `col`.
    ///
    /// Descending order is the ascending order reversed, so tied rows come
    /// out in reverse input order. Nulls sort after every value ascending.
    /// Overlay caches are stale afterwards until [`redraw`](Self::redraw).
    ///
    /// # Panics
    /// If `col` is outside the table.
    pub fn sort_by_column(&mut self, col: usize, ascending: bool) -> Result<()> {
        assert!(
            col < self.column_count(),
            "column {} out of range for table with {} columns",
            col,
            self.column_count()
        );
        let name = self.columns.names[col].clone();
        let options = SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true);
        let sorted = self.frame.sort([name.as_str()], options)?;
        self.frame = if ascending { sorted } else { sorted.reverse() };
        self.stale = self.has_overlays();

        log::debug!(
            "sorted by '{}' ({}), overlay caches {}",
            name,
            if ascending { "ascending" } else { "descending" },
            if self.stale { "stale" } else { "unused" }
        );
        Ok(())
    }

    /// [`sort_by_column`](Self::sort_by_column) addressed by name.
    pub fn sort_by_column_name(&mut self, name: &str, ascending: bool) -> Result<()> {
        let col = self.columns.require(name, RuleKind::Sort)?;
        self.sort_by_column(col, ascending)
    }

    /// Recompute every colormap cache from the current row order.
    pub fn redraw(&mut self) -> Result<()> {
        for bound in &mut self.colormaps {
            let top = bound.table.max_index() as f64;
            for target in &mut bound.targets {
                target.levels =
                    normalized_levels(&self.frame, &target.names, target.grouped, top)?;
            }
        }
        self.stale = false;
        log::debug!("redrew {} colormap binding(s)", self.colormaps.len());
        Ok(())
    }

    fn has_overlays(&self) -> bool {
        self.colormaps.iter().any(|bound| !bound.targets.is_empty())
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.row_count() && col < self.column_count(),
            "cell ({}, {}) out of range for table of {} rows x {} columns",
            row,
            col,
            self.row_count(),
            self.column_count()
        );
    }
}

fn resolve_formats(
    frame: &DataFrame,
    columns: &ColumnIndex,
    options: &TableOptions,
) -> Result<Vec<CellFormat>> {
    let mut rules: HashMap<usize, CellFormat> = HashMap::new();
    if let Some(formats) = &options.formats {
        for (name, template) in formats {
            let col = columns.require(name, RuleKind::Format)?;
            if col == 0 {
                // Idx always renders plain
                continue;
            }
            let invalid = |reason: String| TableError::InvalidFormat {
                column: name.clone(),
                spec: template.clone(),
                reason,
            };
            let format = CellFormat::parse(template).map_err(invalid)?;
            format
                .check_dtype(frame.get_columns()[col].dtype())
                .map_err(invalid)?;
            rules.insert(col, format);
        }
    }

    Ok(frame
        .get_columns()
        .iter()
        .enumerate()
        .map(|(col, column)| {
            if col == 0 {
                CellFormat::plain()
            } else {
                rules.remove(&col).unwrap_or_else(|| {
                    CellFormat::default_for(
                        column.dtype(),
                        options.float_precision,
                        options.grouping,
                    )
                })
            }
        })
        .collect())
}

fn resolve_alignments(
    columns: &ColumnIndex,
    rules: Option<&HashMap<String, CellAlignment>>,
) -> Result<Vec<Option<CellAlignment>>> {
    if let Some(rules) = rules {
        for name in rules.keys() {
            columns.require(name, RuleKind::Alignment)?;
        }
    }
    Ok(columns
        .names
        .iter()
        .map(|name| {
            if name == IDX_COLUMN {
                Some(CellAlignment::Center)
            } else {
                rules.map(|r| r.get(name).copied().unwrap_or(CellAlignment::Left))
            }
        })
        .collect())
}

fn prepare_colormaps(
    frame: &DataFrame,
    columns: &ColumnIndex,
    options: &TableOptions,
) -> Result<Vec<BoundColormap>> {
    let bindings = match &options.colormaps {
        None => {
            let table = ColormapTable::build(
                &options.default_colormap,
                options.samples,
                options.alpha,
            )?;
            return Ok(vec![BoundColormap {
                table,
                targets: Vec::new(),
            }]);
        }
        Some(ColormapSelection::AllColumns) => {
            let numeric: Vec<String> = frame
                .get_columns()
                .iter()
                .skip(1)
                .filter(|c| is_numeric_type(c.dtype()))
                .map(|c| c.name().to_string())
                .collect();
            let targets = if numeric.is_empty() {
                Vec::new()
            } else {
                vec![Target::Group(numeric)]
            };
            vec![ColormapBinding {
                name: options.default_colormap.clone(),
                targets,
            }]
        }
        Some(ColormapSelection::Bindings(bindings)) => bindings.clone(),
    };

    bindings
        .iter()
        .map(|binding| {
            let table = ColormapTable::build(&binding.name, options.samples, options.alpha)?;
            let top = table.max_index() as f64;
            let targets = binding
                .targets
                .iter()
                .map(|target| {
                    let names = target.names();
                    if names.is_empty() {
                        return Err(TableError::EmptyGroup {
                            colormap: binding.name.clone(),
                        });
                    }
                    for name in &names {
                        let col = columns.require(name, RuleKind::Colormap)?;
                        let dtype = frame.get_columns()[col].dtype();
                        if !is_numeric_type(dtype) {
                            return Err(TableError::NonNumericColumn {
                                name: name.to_string(),
                                dtype: dtype.to_string(),
                            });
                        }
                    }
                    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
                    let grouped = matches!(target, Target::Group(_));
                    let levels = normalized_levels(frame, &names, grouped, top)?;
                    Ok(BoundTarget {
                        names,
                        grouped,
                        levels,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(BoundColormap { table, targets })
        })
        .collect()
}

/// Colormap indices for one target: a single column stays 1-D, a group is
/// stacked into `(rows, members)` and scaled over one shared range.
fn normalized_levels(
    frame: &DataFrame,
    names: &[String],
    grouped: bool,
    top: f64,
) -> Result<NumericArray> {
    let raw = if grouped {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        NumericArray::from_columns(frame, &names)?
    } else {
        NumericArray::from_column(frame.column(&names[0])?)?
    };
    log::trace!(
        "normalizing {:?} ({} values) into [0, {}]",
        names,
        raw.len(),
        top
    );
    Ok(range_normalize(&raw, 0.0, top, true))
}

fn overlay_slots(columns: &ColumnIndex, colormaps: &[BoundColormap]) -> Vec<Option<OverlaySlot>> {
    let mut slots = vec![None; columns.names.len()];
    for (binding, bound) in colormaps.iter().enumerate() {
        for (target, bound_target) in bound.targets.iter().enumerate() {
            for (offset, name) in bound_target.names.iter().enumerate() {
                match columns.position(name) {
                    Some(col) if slots[col].is_none() => {
                        slots[col] = Some(OverlaySlot {
                            binding,
                            target,
                            offset,
                        });
                    }
                    _ => {}
                }
            }
        }
    }
    slots
}
