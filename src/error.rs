//! Error types for table construction and mutation.

use std::fmt;

/// Result type alias for heatgrid table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Which rule set referenced a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Format,
    Alignment,
    Colormap,
    Sort,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Format => "format",
            RuleKind::Alignment => "alignment",
            RuleKind::Colormap => "colormap",
            RuleKind::Sort => "sort",
        };
        f.write_str(name)
    }
}

/// Errors raised while building or reordering a table.
///
/// Everything here is surfaced at construction (or at the explicit
/// sort/redraw call that triggered it); queries never return errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// Input is neither a record frame nor a rank-2 homogeneous array.
    #[error("Unsupported input: {message}")]
    Schema {
        /// What was wrong with the input shape.
        message: String,
    },

    /// A rule references a column the table does not have.
    #[error("Column '{name}' referenced by {rule} rule not found in schema")]
    UnknownColumn {
        /// The missing column name.
        name: String,
        /// The rule set that referenced it.
        rule: RuleKind,
    },

    /// Colormap name is not in the registry.
    #[error("Unknown colormap '{name}'. Available: {available}")]
    UnknownColormap {
        /// The requested colormap.
        name: String,
        /// Comma-separated list of registered names.
        available: String,
    },

    /// A format rule does not parse, or does not apply to the column type.
    #[error("Invalid format '{spec}' for column '{column}': {reason}")]
    InvalidFormat {
        /// Column the rule is attached to.
        column: String,
        /// The raw format template.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A colormap target is not numeric.
    #[error("Column '{name}' has non-numeric type {dtype} and cannot carry a colormap")]
    NonNumericColumn {
        /// The offending column.
        name: String,
        /// Its polars type, rendered.
        dtype: String,
    },

    /// A colormap group target lists no columns.
    #[error("Colormap '{colormap}' has an empty column group")]
    EmptyGroup {
        /// The binding holding the empty group.
        colormap: String,
    },

    /// Construction options are malformed.
    #[error("Invalid table options: {message}")]
    InvalidOptions {
        /// Description of the problem.
        message: String,
    },

    /// Error bubbled up from polars.
    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl TableError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        TableError::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_column(name: impl Into<String>, rule: RuleKind) -> Self {
        TableError::UnknownColumn {
            name: name.into(),
            rule,
        }
    }
}

impl From<toml::de::Error> for TableError {
    fn from(e: toml::de::Error) -> Self {
        TableError::InvalidOptions {
            message: e.to_string(),
        }
    }
}
