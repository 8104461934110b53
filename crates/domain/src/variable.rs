//! Variable value types for the resolver scopes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A variable value in one of the resolver scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A plain string value.
    Single(String),
    /// A multi-option value with one active selection.
    Multi(MultiValue),
}

impl VariableValue {
    /// Returns the value used for substitution. A multi-value resolves to
    /// its active option; an out-of-range active index yields an empty
    /// string.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Single(value) => value,
            Self::Multi(multi) => multi.active_value(),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

/// A variable with several named option values and one active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MultiValue {
    /// Ordered option values.
    pub options: Vec<String>,
    /// Index of the active option.
    #[serde(default)]
    pub active: usize,
    /// Alias name to option index.
    #[serde(default)]
    pub aliases: HashMap<String, usize>,
}

impl MultiValue {
    /// Creates a multi-value from options with the first option active.
    #[must_use]
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            active: 0,
            aliases: HashMap::new(),
        }
    }

    /// Registers an alias for an option index, builder-style.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, index: usize) -> Self {
        self.aliases.insert(alias.into(), index);
        self
    }

    /// Returns the active option, or an empty string if the active index is
    /// out of range.
    #[must_use]
    pub fn active_value(&self) -> &str {
        self.options
            .get(self.active)
            .map_or("", String::as_str)
    }

    /// Activates an option by alias name. Returns false if the alias is
    /// unknown or points outside the option list.
    pub fn activate_alias(&mut self, alias: &str) -> bool {
        match self.aliases.get(alias) {
            Some(&index) if index < self.options.len() => {
                self.active = index;
                true
            }
            _ => false,
        }
    }

    /// Activates an option by index. Returns false if out of range.
    pub fn activate(&mut self, index: usize) -> bool {
        if index < self.options.len() {
            self.active = index;
            true
        } else {
            false
        }
    }
}
