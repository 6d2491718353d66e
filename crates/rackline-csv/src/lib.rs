//! # rackline-csv
//!
//! Bulk CSV import for Rackline objects.
//!
//! Import data is a header line followed by one line per object:
//!
//! ```text
//! name,site.slug,status
//! router1,dc1,active
//! ```
//!
//! A dotted header (`site.slug`) references a related object by one of its
//! attributes. Parsing produces a [`CsvHeaderMap`] and one [`CsvRecord`] per
//! data row; validation then checks the headers against the form's declared
//! [`FormFields`] before any record becomes a domain object.
//!
//! ```rust
//! use rackline_csv::{CsvImportForm, FieldDescriptor, FormFields, RelatedEntity};
//!
//! let form = CsvImportForm::new(
//!     FormFields::new()
//!         .with("name", FieldDescriptor::required())
//!         .with("site", FieldDescriptor::relation(RelatedEntity::new("site", &["name", "slug"]), "name")),
//! );
//! let parsed = form.clean_text("name,site.slug\nrouter1,dc1").unwrap();
//! assert_eq!(parsed.records[0]["site"], "dc1");
//! ```

pub mod error;
pub mod fields;
pub mod import;
pub mod parser;
pub mod patterns;
pub mod validator;

pub use error::CsvImportError;
pub use fields::{FieldDescriptor, FormFields, RelatedEntity};
pub use import::{CsvImportForm, parse_choice, parse_entity_type};
pub use parser::{CsvHeaderMap, CsvImport, CsvRecord, parse_csv, parse_rows, split_header};
pub use patterns::{
    expand_alphanumeric_pattern, expand_ipaddress_pattern, parse_alphanumeric_range,
    parse_numeric_range,
};
pub use validator::validate_csv;
