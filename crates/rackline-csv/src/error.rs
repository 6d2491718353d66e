//! Error types for CSV import.

use thiserror::Error;

/// Errors raised while importing CSV data.
///
/// All of these are user-facing form errors.
#[derive(Debug, Error)]
pub enum CsvImportError {
    /// No header row was supplied.
    #[error("No CSV data provided; the first line must list column headers.")]
    EmptyInput,

    /// A data row has a different number of cells than the header.
    #[error("Row {row}: Expected {expected} columns but found {found}")]
    RowArity {
        /// 1-based data row index.
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A header names a field the form does not declare.
    #[error("Unexpected column header \"{0}\" found.")]
    UnknownColumn(String),

    /// A dotted header is used on a non-relation field, or names an
    /// attribute the related entity lacks.
    #[error("{}", relation_message(.field, .attribute))]
    InvalidRelation {
        field: String,
        attribute: Option<String>,
    },

    /// Required fields are absent from the header.
    #[error("Required column header(s) not found: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    /// A value is not one of the field's choices.
    #[error("Column \"{field}\": {value} is not one of the available choices.")]
    InvalidChoice { field: String, value: String },

    /// A field refers to a choice table that is not registered.
    #[error("Unknown choice set \"{0}\"")]
    UnknownChoiceSet(String),

    /// An uploaded file is not UTF-8.
    #[error("CSV file is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// A range or bracket pattern could not be expanded.
    #[error("Range \"{0}\" is invalid.")]
    InvalidRange(String),

    /// Only IPv4 and IPv6 patterns can be expanded.
    #[error("Invalid IP address family: {0}")]
    InvalidFamily(u8),

    /// Tokenizer failure.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Form declaration could not be loaded.
    #[error("form declaration error: {0}")]
    Declaration(#[from] serde_yaml::Error),
}

fn relation_message(field: &str, attribute: &Option<String>) -> String {
    match attribute {
        None => format!("Column \"{field}\" is not a related object; cannot use dots"),
        Some(attr) => format!("Invalid related object attribute for column \"{field}\": {attr}"),
    }
}
