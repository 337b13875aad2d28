//! Option declarations and parsed option values

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::PluginError;

/// Declarative command-line option an action exposes.
///
/// `flag` uses the familiar `-p, --port <port>` notation: a short and/or long
/// name, followed by `<value>` for a required value or `[value]` for an
/// optional one. A flag without a value placeholder is a boolean switch;
/// `--no-<name>` declares a switch that defaults to on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOption {
    /// Flag specification, e.g. `-p, --port <port>`
    pub flag: String,
    /// Help text
    pub description: String,
    /// Value used when the flag is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
}

impl ActionOption {
    pub fn new(flag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            description: description.into(),
            default: None,
        }
    }

    /// Builder: set the default value
    pub fn with_default(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A single parsed option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    String(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Option values parsed from the command line, keyed by option name.
///
/// The key is the long flag name without dashes (`--dry-run` -> `dry-run`),
/// or the short letter when the option has no long name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ActionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// String value of an option, if it was given one
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    /// Whether a switch is on. Options carrying a string value count as on.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(OptionValue::Bool(b)) => *b,
            Some(OptionValue::String(_)) => true,
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deserialize all values into a typed options struct
    ///
    /// # Example
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct DevOptions { port: Option<String>, open: bool }
    /// let opts: DevOptions = options.parse()?;
    /// ```
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        let value = serde_json::to_value(self).map_err(|e| PluginError::InvalidInput(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| PluginError::InvalidInput(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for ActionOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
