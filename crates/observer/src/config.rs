//! Watch configuration.
//!
//! `ObserveConfig` is immutable once handed to the registry; re-observing a root
//! replaces it wholesale.

use serde_json::Value;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveConfig {
    pub attributes: bool,
    /// Ordered, de-duplicated names. `None` means every attribute.
    pub attribute_filter: Option<Vec<String>>,
    pub attribute_old_value: bool,
    pub child_list: bool,
    pub subtree: bool,
    pub character_data: bool,
    pub character_data_old_value: bool,
}

impl ObserveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(mut self) -> Self {
        self.attributes = true;
        self
    }

    pub fn attribute_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !filter.contains(&name) {
                filter.push(name);
            }
        }
        self.attribute_filter = Some(filter);
        self
    }

    pub fn attribute_old_value(mut self) -> Self {
        self.attribute_old_value = true;
        self
    }

    pub fn child_list(mut self) -> Self {
        self.child_list = true;
        self
    }

    pub fn subtree(mut self) -> Self {
        self.subtree = true;
        self
    }

    pub fn character_data(mut self) -> Self {
        self.character_data = true;
        self
    }

    pub fn character_data_old_value(mut self) -> Self {
        self.character_data_old_value = true;
        self
    }

    /// Build from a `MutationObserverInit`-style dictionary.
    ///
    /// Unknown keys are ignored, flags are coerced by truthiness and a non-object
    /// value yields the default (empty) configuration.
    pub fn from_init(init: &Value) -> Self {
        let Some(map) = init.as_object() else {
            return Self::default();
        };
        let flag = |key: &str| map.get(key).is_some_and(truthy);
        let attribute_filter = map.get("attributeFilter").and_then(|value| match value {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).map(str::to_string)),
            _ => None,
        });
        let mut config = Self {
            attributes: flag("attributes"),
            attribute_filter: None,
            attribute_old_value: flag("attributeOldValue"),
            child_list: flag("childList"),
            subtree: flag("subtree"),
            character_data: flag("characterData"),
            character_data_old_value: flag("characterDataOldValue"),
        };
        if let Some(names) = attribute_filter {
            config = config.attribute_filter(names);
        }
        config
    }

    /// Attribute watching, including the flags that imply it.
    pub fn watches_attributes(&self) -> bool {
        self.attributes || self.attribute_old_value || self.attribute_filter.is_some()
    }

    /// Character-data watching, including the flag that implies it.
    pub fn watches_character_data(&self) -> bool {
        self.character_data || self.character_data_old_value
    }

    pub fn watches_children(&self) -> bool {
        self.child_list || self.subtree
    }
}

/// Resolved form used by the cloner and diff engine.
#[derive(Clone, Debug)]
pub(crate) struct WatchFlags {
    pub attributes: bool,
    pub filter: Option<HashSet<String>>,
    pub child_list: bool,
    pub subtree: bool,
    pub character_data: bool,
}

impl WatchFlags {
    pub fn from_config(config: &ObserveConfig) -> Self {
        Self {
            attributes: config.watches_attributes(),
            filter: config
                .attribute_filter
                .as_ref()
                .map(|names| names.iter().cloned().collect()),
            child_list: config.child_list,
            subtree: config.subtree,
            character_data: config.watches_character_data(),
        }
    }

    pub fn accepts_attribute(&self, name: &str) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|names| names.contains(name))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
