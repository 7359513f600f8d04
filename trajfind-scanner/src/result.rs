use crate::validator::{ID_FIELD, STEPS_FIELD, is_valid_trajectory};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A node whose key matched the marker key during a scan.
#[derive(Debug, Clone)]
pub struct CandidateContainer<N> {
    /// Dotted path from the scan root, e.g. `a.props.taskResponse.questions`.
    pub path: String,
    pub node: N,
}

impl<N> CandidateContainer<N> {
    pub fn new(path: String, node: N) -> Self {
        Self { path, node }
    }

    pub fn matches_preference(&self, preferred_path_substring: &str) -> bool {
        self.path.contains(preferred_path_substring)
    }
}

/// An owned, validated trajectory payload.
///
/// Parsed out of host text, so it never aliases the host graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRecord {
    value: Value,
    location: String,
}

impl TrajectoryRecord {
    pub(crate) fn new(value: Value, location: String) -> Self {
        Self { value, location }
    }

    /// Wrap an already-parsed value, returning `None` unless it validates.
    pub fn from_value(value: Value, location: impl Into<String>) -> Option<Self> {
        is_valid_trajectory(&value).then(|| Self::new(value, location.into()))
    }

    pub fn uuid(&self) -> &Value {
        &self.value[ID_FIELD]
    }

    pub fn steps(&self) -> &Value {
        &self.value[STEPS_FIELD]
    }

    /// Number of steps when `steps` is an array.
    pub fn step_count(&self) -> Option<usize> {
        self.steps().as_array().map(Vec::len)
    }

    /// Dotted path of the entry the record was parsed from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Serialize for TrajectoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
