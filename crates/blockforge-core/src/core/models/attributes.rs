use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value stored in a building block's attribute side map.
///
/// Only these declared types can be persisted by a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
}

/// Named extra attributes attached to a building block.
pub type Attributes = BTreeMap<String, AttrValue>;

impl AttrValue {
    /// Interprets a command-line style literal: booleans, integers and floats
    /// are recognised, anything else is kept as a string.
    pub fn infer(literal: &str) -> Self {
        let trimmed = literal.trim();
        if let Ok(b) = trimmed.parse::<bool>() {
            Self::Bool(b)
        } else if let Ok(i) = trimmed.parse::<i64>() {
            Self::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::Str(literal.to_string())
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{:?}", v),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}
