use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "other".to_owned()
}

/// One named code unit in the relationship graph (function, class, variable, file, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntity {
    /// Unique identifier referenced by edges.
    pub id: String,
    /// The entity's identifier name as written in source.
    pub name: String,
    /// Path of the file that declares the entity, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Source text of the entity, when the producer attached it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Open category string: function, class, method, variable, import, export, file, other.
    #[serde(default = "default_category", alias = "type")]
    pub category: String,
    /// 1-based first line of the entity in its file.
    #[serde(default, alias = "startLine", skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    /// 1-based last line of the entity in its file.
    #[serde(default, alias = "endLine", skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl CodeEntity {
    /// Create an entity with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            file: None,
            code: None,
            category: category.into(),
            start_line: None,
            end_line: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Source text, treating whitespace-only code as absent.
    pub fn source_text(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.trim().is_empty())
    }
}
