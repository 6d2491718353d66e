//! Header validation against a form declaration.

use crate::error::CsvImportError;
use crate::fields::FormFields;
use crate::parser::CsvHeaderMap;

/// Check parsed headers against the declared fields.
///
/// Headers are checked in order and the first offending column is reported.
/// Missing required fields are then reported all at once.
pub fn validate_csv(
    headers: &CsvHeaderMap,
    fields: &FormFields,
    required_fields: &[String],
) -> Result<(), CsvImportError> {
    for (field, to_field) in headers {
        let descriptor = fields
            .get(field)
            .ok_or_else(|| CsvImportError::UnknownColumn(field.clone()))?;

        if let Some(to_field) = to_field {
            let related = descriptor
                .related
                .as_ref()
                .ok_or_else(|| CsvImportError::InvalidRelation {
                    field: field.clone(),
                    attribute: None,
                })?;
            if !related.has_attribute(to_field) {
                return Err(CsvImportError::InvalidRelation {
                    field: field.clone(),
                    attribute: Some(to_field.clone()),
                });
            }
        }
    }

    let missing: Vec<String> = required_fields
        .iter()
        .filter(|f| !headers.contains_key(f.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(CsvImportError::MissingRequiredColumns(missing));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDescriptor, RelatedEntity};
    use crate::parser::parse_csv;

    fn device_fields() -> FormFields {
        FormFields::new()
            .with("name", FieldDescriptor::required())
            .with(
                "site",
                FieldDescriptor::relation(RelatedEntity::new("site", &["name", "slug"]), "name"),
            )
            .with("status", FieldDescriptor::optional())
    }

    fn validate(text: &str, fields: &FormFields) -> Result<(), CsvImportError> {
        let parsed = parse_csv(text).unwrap();
        validate_csv(&parsed.headers, fields, &fields.required_fields())
    }

    #[test]
    fn test_dotted_relation_accepted() {
        validate("name,site.slug\nr1,dc1", &device_fields()).unwrap();
    }

    #[test]
    fn test_unknown_column() {
        let err = validate("name,rack\nr1,a", &device_fields()).unwrap_err();
        assert!(matches!(err, CsvImportError::UnknownColumn(ref f) if f == "rack"));
        assert_eq!(err.to_string(), "Unexpected column header \"rack\" found.");
    }

    #[test]
    fn test_unknown_attribute_on_relation() {
        let err = validate("name,site.bogus\nr1,x", &device_fields()).unwrap_err();
        match err {
            CsvImportError::InvalidRelation { field, attribute } => {
                assert_eq!(field, "site");
                assert_eq!(attribute.as_deref(), Some("bogus"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dots_on_plain_field() {
        let err = validate("name,status.label\nr1,x", &device_fields()).unwrap_err();
        assert!(matches!(
            err,
            CsvImportError::InvalidRelation { ref field, attribute: None } if field == "status"
        ));
        assert_eq!(
            err.to_string(),
            "Column \"status\" is not a related object; cannot use dots"
        );
    }

    #[test]
    fn test_all_missing_required_reported() {
        let fields = device_fields()
            .with("role", FieldDescriptor::required())
            .with("platform", FieldDescriptor::required());
        let err = validate("status\nactive", &fields).unwrap_err();
        match err {
            CsvImportError::MissingRequiredColumns(missing) => {
                assert_eq!(missing, vec!["name", "role", "platform"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_column_checked_before_required() {
        let err = validate("bogus\nx", &device_fields()).unwrap_err();
        assert!(matches!(err, CsvImportError::UnknownColumn(_)));
    }
}
