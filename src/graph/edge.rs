use serde::{Deserialize, Serialize};

/// A directed, optionally labeled connection between two entities.
///
/// Either endpoint may name an id that is missing from the model's node list;
/// consumers skip such edges instead of rejecting the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Free-text label such as "calls", "imports" or "extends".
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship: None,
        }
    }

    pub fn labeled(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship: Some(relationship.into()),
        }
    }

    /// Label describing this edge as seen from `from_id`.
    ///
    /// Falls back to "calls" when `from_id` is the source and "called by" otherwise.
    pub fn label_from(&self, from_id: &str) -> String {
        match self.relationship.as_deref() {
            Some(label) if !label.trim().is_empty() => label.to_owned(),
            _ if self.source == from_id => "calls".to_owned(),
            _ => "called by".to_owned(),
        }
    }
}
