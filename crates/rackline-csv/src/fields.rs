//! Form field declarations consumed by CSV validation.

use crate::error::CsvImportError;
use indexmap::IndexMap;
use rackline_core::{ChoiceSet, choice_set};
use serde::{Deserialize, Serialize};

/// The entity a relation field points at, and the attributes it can be
/// looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl RelatedEntity {
    pub fn new(name: impl Into<String>, attributes: &[&str]) -> Self {
        Self {
            name: name.into(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn has_attribute(&self, attr: &str) -> bool {
        self.attributes.iter().any(|a| a == attr)
    }
}

/// A declared form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub required: bool,

    /// Attribute used to match related objects when no dotted accessor is
    /// given, e.g. `name`.
    #[serde(default)]
    pub to_field_name: Option<String>,

    /// Set for relation fields.
    #[serde(default)]
    pub related: Option<RelatedEntity>,

    /// Name of the choice table that holds the allowed values, e.g.
    /// `object_change_action`.
    #[serde(default)]
    pub choices: Option<String>,
}

impl FieldDescriptor {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    /// A relation field matched by `to_field_name`.
    pub fn relation(related: RelatedEntity, to_field_name: &str) -> Self {
        Self {
            to_field_name: Some(to_field_name.to_string()),
            related: Some(related),
            ..Default::default()
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_choices(mut self, choice_set: &str) -> Self {
        self.choices = Some(choice_set.to_string());
        self
    }

    /// The choice table this field validates against.
    pub fn choice_set(&self) -> Result<Option<&'static dyn ChoiceSet>, CsvImportError> {
        match &self.choices {
            None => Ok(None),
            Some(name) => choice_set(name)
                .map(Some)
                .ok_or_else(|| CsvImportError::UnknownChoiceSet(name.clone())),
        }
    }

    pub fn is_relation(&self) -> bool {
        self.related.is_some()
    }
}

/// Declared fields of a bulk-import form, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(IndexMap<String, FieldDescriptor>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.0.insert(name.into(), field);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, field: FieldDescriptor) {
        self.0.insert(name.into(), field);
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, f)| f.required)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Parse a form declaration from YAML.
    ///
    /// ```yaml
    /// name: { required: true }
    /// site:
    ///   required: true
    ///   to_field_name: name
    ///   related: { name: site, attributes: [name, slug] }
    /// status: { choices: object_change_action }
    /// ```
    ///
    /// Every `choices` entry must name a registered choice table.
    pub fn from_yaml(content: &str) -> Result<Self, CsvImportError> {
        let fields: Self = serde_yaml::from_str(content)?;
        for (_, field) in fields.iter() {
            field.choice_set()?;
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_in_order() {
        let fields = FormFields::new()
            .with("status", FieldDescriptor::required())
            .with("description", FieldDescriptor::optional())
            .with("name", FieldDescriptor::required());
        assert_eq!(fields.required_fields(), vec!["status", "name"]);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
name:
  required: true
site:
  required: true
  to_field_name: name
  related:
    name: site
    attributes: [name, slug]
action:
  choices: object_change_action
"#;
        let fields = FormFields::from_yaml(yaml).unwrap();
        assert_eq!(fields.len(), 3);
        let site = fields.get("site").unwrap();
        assert!(site.is_relation());
        assert!(site.related.as_ref().unwrap().has_attribute("slug"));

        let action = fields.get("action").unwrap();
        assert!(!action.required);
        assert!(action.choice_set().unwrap().unwrap().contains("delete"));
    }

    #[test]
    fn test_from_yaml_rejects_unknown_choice_set() {
        let err = FormFields::from_yaml("status:\n  choices: device_status\n").unwrap_err();
        assert_eq!(err.to_string(), "Unknown choice set \"device_status\"");
    }
}
