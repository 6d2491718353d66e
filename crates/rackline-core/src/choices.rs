//! Static choice tables.
//!
//! Choice tables are lists of `(value, label)` pairs, optionally grouped under
//! a heading. Forms and CSV imports validate input against the flattened view
//! and refer to a table by its registered name.

use std::collections::BTreeMap;

/// A single selectable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// An entry in a choice table: either a choice or a named group of choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceEntry {
    Single(Choice),
    Group {
        label: &'static str,
        choices: &'static [Choice],
    },
}

/// Shorthand for building a [`ChoiceEntry::Single`] in a `const` table.
pub const fn choice(value: &'static str, label: &'static str) -> ChoiceEntry {
    ChoiceEntry::Single(Choice { value, label })
}

/// Flatten a grouped choice hierarchy into its choices, preserving order.
pub fn unpack_grouped_choices(entries: &[ChoiceEntry]) -> Vec<Choice> {
    let mut unpacked = Vec::new();
    for entry in entries {
        match entry {
            ChoiceEntry::Single(c) => unpacked.push(*c),
            ChoiceEntry::Group { choices, .. } => unpacked.extend_from_slice(choices),
        }
    }
    unpacked
}

/// A named table of choices.
pub trait ChoiceSet: Send + Sync {
    /// Registry name, as used in form declarations.
    fn name(&self) -> &'static str;

    fn entries(&self) -> &'static [ChoiceEntry];

    /// All selectable values in table order.
    fn values(&self) -> Vec<&'static str> {
        unpack_grouped_choices(self.entries())
            .into_iter()
            .map(|c| c.value)
            .collect()
    }

    fn as_map(&self) -> BTreeMap<&'static str, &'static str> {
        unpack_grouped_choices(self.entries())
            .into_iter()
            .map(|c| (c.value, c.label))
            .collect()
    }

    fn label_for(&self, value: &str) -> Option<&'static str> {
        unpack_grouped_choices(self.entries())
            .into_iter()
            .find(|c| c.value == value)
            .map(|c| c.label)
    }

    fn contains(&self, value: &str) -> bool {
        self.label_for(value).is_some()
    }
}

pub struct ObjectChangeActionChoices;

impl ChoiceSet for ObjectChangeActionChoices {
    fn name(&self) -> &'static str {
        "object_change_action"
    }

    fn entries(&self) -> &'static [ChoiceEntry] {
        const ENTRIES: &[ChoiceEntry] = &[
            choice("create", "Created"),
            choice("update", "Updated"),
            choice("delete", "Deleted"),
        ];
        ENTRIES
    }
}

/// HTTP methods a webhook may be sent with.
pub struct WebhookHttpMethodChoices;

impl ChoiceSet for WebhookHttpMethodChoices {
    fn name(&self) -> &'static str {
        "webhook_http_method"
    }

    fn entries(&self) -> &'static [ChoiceEntry] {
        const ENTRIES: &[ChoiceEntry] = &[
            choice("GET", "GET"),
            choice("POST", "POST"),
            choice("PUT", "PUT"),
            choice("PATCH", "PATCH"),
            choice("DELETE", "DELETE"),
        ];
        ENTRIES
    }
}

static REGISTRY: &[&dyn ChoiceSet] = &[&ObjectChangeActionChoices, &WebhookHttpMethodChoices];

/// Look up a registered choice table by name.
pub fn choice_set(name: &str) -> Option<&'static dyn ChoiceSet> {
    REGISTRY.iter().copied().find(|set| set.name() == name)
}

/// Names of every registered choice table.
pub fn choice_set_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|set| set.name()).collect()
}
