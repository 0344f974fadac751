//! Responses coming in from the presentation layer and the answers they
//! become once merged into a session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::flow::InputKind;

/// A raw response to the current step, tagged by the widget that produced it.
///
/// Serialized adjacently tagged: `{"kind": "text", "value": "Alice"}`.
/// `None` is what info/summary steps (and an untouched input) send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Response {
    #[default]
    None,
    Text(String),
    Number(f64),
    Slider(f64),
    Toggle(bool),
    SingleSelect(String),
    MultiSelect(Vec<String>),
}

impl Response {
    /// The input kind this response was produced by, if any.
    pub fn input_kind(&self) -> Option<InputKind> {
        match self {
            Self::None => None,
            Self::Text(_) => Some(InputKind::Text),
            Self::Number(_) => Some(InputKind::Number),
            Self::Slider(_) => Some(InputKind::Slider),
            Self::Toggle(_) => Some(InputKind::Toggle),
            Self::SingleSelect(_) => Some(InputKind::SingleSelect),
            Self::MultiSelect(_) => Some(InputKind::MultiSelect),
        }
    }

    /// Absent for the purpose of a `required` rule: no value, blank text,
    /// no choice, or an empty selection.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(s) | Self::SingleSelect(s) => s.trim().is_empty(),
            Self::MultiSelect(items) => items.is_empty(),
            Self::Number(_) | Self::Slider(_) | Self::Toggle(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::SingleSelect(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::Slider(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Toggle(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::MultiSelect(items) => Some(items),
            _ => None,
        }
    }

    /// Convert into the value stored in the session's answers.
    pub fn to_answer(&self) -> Option<AnswerValue> {
        match self {
            Self::None => None,
            Self::Text(s) | Self::SingleSelect(s) => Some(AnswerValue::Text(s.clone())),
            Self::Number(n) | Self::Slider(n) => Some(AnswerValue::Number(*n)),
            Self::Toggle(b) => Some(AnswerValue::Bool(*b)),
            Self::MultiSelect(items) => Some(AnswerValue::List(items.clone())),
        }
    }
}

/// A merged answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Accumulated answers, keyed by logical field name (e.g. `firstName`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, AnswerValue>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AnswerValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AnswerValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(AnswerValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(AnswerValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// List answer, or an empty slice when absent or of another type.
    pub fn get_list(&self, key: &str) -> &[String] {
        match self.0.get(key) {
            Some(AnswerValue::List(items)) => items,
            _ => &[],
        }
    }

    /// Whether a list answer contains `item`.
    pub fn list_contains(&self, key: &str, item: &str) -> bool {
        self.get_list(key).iter().any(|v| v == item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
