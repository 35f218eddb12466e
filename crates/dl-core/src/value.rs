use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<DialogValue>),
    Map(BTreeMap<String, DialogValue>),
}

pub type LocalValues = BTreeMap<String, DialogValue>;

// 2^53: integral doubles below this convert to i64 exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl DialogValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER => {
                format!("{}", *value as i64)
            }
            Self::Number(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Array(values) => values
                .iter()
                .map(DialogValue::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(values) => values
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value.to_text()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for DialogValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DialogValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for DialogValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for DialogValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
