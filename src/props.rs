use std::fmt;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The prop key under which a failed single-future fetch records its
/// error marker.
pub const ERROR_PROP: &str = "error";

/// A single resolved prop: either an actual value, or the reason a
/// fetch for it was rejected.
///
/// Rejections are always stored in the `Error` variant, on both the
/// single-future and the named-map resolution paths, so consumers only
/// ever have to check one representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PropValue {
    Value(serde_json::Value),
    Error(String),
}

impl PropValue {
    /// Construct the error marker from a rejection reason.
    pub fn error(reason: impl Into<String>) -> Self {
        PropValue::Error(reason.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PropValue::Error(_))
    }

    /// The underlying value, if this prop resolved successfully.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            PropValue::Value(value) => Some(value),
            PropValue::Error(_) => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Value(value) => value.fmt(f),
            PropValue::Error(reason) => reason.fmt(f),
        }
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        PropValue::Value(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Value(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Value(value.into())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Value(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Value(value.into())
    }
}

impl From<u64> for PropValue {
    fn from(value: u64) -> Self {
        PropValue::Value(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Value(value.into())
    }
}

/// An insertion-ordered mapping from prop name to resolved value.
///
/// Resolution passes produce one of these per component; the ordering
/// of the keys follows the ordering of the fetch result that produced
/// them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropMap(IndexMap<String, PropValue>);

impl PropMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prop, returning the previous value for the key if any.
    /// An existing key keeps its original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> Option<PropValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Additive merge: every entry of `other` is written over `self`,
    /// so later keys win.
    pub fn merge(&mut self, other: PropMap) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }
}

impl Deref for PropMap {
    type Target = IndexMap<String, PropValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PropMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<IndexMap<String, PropValue>> for PropMap {
    fn from(map: IndexMap<String, PropValue>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for PropMap
where
    K: Into<String>,
    V: Into<PropValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for PropMap {
    type Item = (String, PropValue);
    type IntoIter = indexmap::map::IntoIter<String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
