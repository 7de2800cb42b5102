//! Answer values collected by wizard steps

use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single answer: free text, a checkbox state, or nothing yet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Text(String),
    #[default]
    Null,
}

impl AnswerValue {
    /// Whether this value counts as "not provided" for a required field.
    ///
    /// Null, whitespace-only text and an unchecked box are all blank.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Null => true,
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Bool(checked) => !checked,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Bool(true) => write!(f, "yes"),
            AnswerValue::Bool(false) => write!(f, "no"),
            AnswerValue::Text(s) => write!(f, "{}", s),
            AnswerValue::Null => write!(f, "-"),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Bool(b)
    }
}

impl<T: Into<AnswerValue>> From<Option<T>> for AnswerValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AnswerValue::Null, Into::into)
    }
}

/// Field name to answer mapping, accumulated across steps
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardAnswers(HashMap<String, AnswerValue>);

impl WizardAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AnswerValue> {
        self.0.get(name)
    }

    /// Set one answer, returning the value it replaced
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AnswerValue>) -> Option<AnswerValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Overwrite the keys present in `partial`, leaving every other key alone
    pub fn merge_from(&mut self, partial: WizardAnswers) {
        self.0.extend(partial.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in sorted order, for stable display
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>, V: Into<AnswerValue>> FromIterator<(K, V)> for WizardAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for WizardAnswers {
    type Item = (String, AnswerValue);
    type IntoIter = hash_map::IntoIter<String, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
