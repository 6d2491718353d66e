//! Bulk-import form: parse CSV text or an uploaded file and validate it
//! against a form declaration.

use crate::error::CsvImportError;
use crate::fields::FormFields;
use crate::parser::{CsvImport, parse_csv};
use crate::validator::validate_csv;
use rackline_core::{ChoiceSet, EntityType};

/// Cleans CSV input for one kind of object.
#[derive(Debug, Clone)]
pub struct CsvImportForm {
    fields: FormFields,
    required_fields: Vec<String>,
}

impl CsvImportForm {
    pub fn new(fields: FormFields) -> Self {
        let required_fields = fields.required_fields();
        Self {
            fields,
            required_fields,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// Header line pre-filled into an empty import form.
    pub fn initial_template(&self) -> String {
        format!("{}\n", self.required_fields.join(","))
    }

    /// Parse and validate pasted CSV text.
    pub fn clean_text(&self, text: &str) -> Result<CsvImport, CsvImportError> {
        let parsed = parse_csv(text)?;
        validate_csv(&parsed.headers, &self.fields, &self.required_fields)?;
        self.check_choices(&parsed)?;
        Ok(parsed)
    }

    /// Parse and validate an uploaded CSV file.
    pub fn clean_file(&self, content: &[u8]) -> Result<CsvImport, CsvImportError> {
        let text = std::str::from_utf8(content)?;
        self.clean_text(text)
    }

    fn check_choices(&self, parsed: &CsvImport) -> Result<(), CsvImportError> {
        for record in &parsed.records {
            for (field, value) in record {
                if value.is_empty() {
                    continue;
                }
                let Some(descriptor) = self.fields.get(field) else {
                    continue;
                };
                if let Some(set) = descriptor.choice_set()? {
                    parse_choice(field, value, set)?;
                }
            }
        }
        Ok(())
    }
}

/// Validate a value against a choice table.
pub fn parse_choice<'a>(
    field: &str,
    value: &'a str,
    choices: &dyn ChoiceSet,
) -> Result<&'a str, CsvImportError> {
    if choices.contains(value) {
        Ok(value)
    } else {
        Err(CsvImportError::InvalidChoice {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Validate an `<app>.<model>` reference.
pub fn parse_entity_type(value: &str) -> Result<EntityType, rackline_core::EntityTypeParseError> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDescriptor, RelatedEntity};

    fn form() -> CsvImportForm {
        CsvImportForm::new(
            FormFields::new()
                .with("name", FieldDescriptor::required())
                .with(
                    "site",
                    FieldDescriptor::relation(RelatedEntity::new("site", &["name", "slug"]), "name")
                        .with_required(true),
                )
                .with(
                    "action",
                    FieldDescriptor::optional().with_choices("object_change_action"),
                ),
        )
    }

    #[test]
    fn test_initial_template() {
        assert_eq!(form().initial_template(), "name,site\n");
    }

    #[test]
    fn test_clean_text() {
        let parsed = form()
            .clean_text("name,site.slug,action\nr1,dc1,create\nr2,dc2,\n")
            .unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1]["action"], "");
    }

    #[test]
    fn test_clean_text_rejects_bad_choice() {
        let err = form().clean_text("name,site,action\nr1,dc1,Created").unwrap_err();
        assert!(matches!(err, CsvImportError::InvalidChoice { ref value, .. } if value == "Created"));
    }

    #[test]
    fn test_unregistered_choice_set_is_an_error() {
        let form = CsvImportForm::new(
            FormFields::new().with("status", FieldDescriptor::optional().with_choices("nope")),
        );
        assert!(matches!(
            form.clean_text("status\nactive"),
            Err(CsvImportError::UnknownChoiceSet(ref name)) if name == "nope"
        ));
        // Blank values are never checked.
        assert!(form.clean_text("status\n\"\"").is_ok());
    }

    #[test]
    fn test_clean_file_requires_utf8() {
        let err = form().clean_file(&[0xff, 0xfe, b'a']).unwrap_err();
        assert!(matches!(err, CsvImportError::InvalidEncoding(_)));

        let parsed = form().clean_file(b"name,site\nr1,dc1\n").unwrap();
        assert_eq!(parsed.records[0]["site"], "dc1");
    }

    #[test]
    fn test_parse_entity_type() {
        assert_eq!(parse_entity_type("dcim.site").unwrap().model, "site");
        assert!(parse_entity_type("site").is_err());
    }
}
