//! Typed access into the optional structured context document.
//!
//! The document is a free-form nested mapping. Every accessor takes an
//! explicit default, so a missing or oddly shaped field degrades to that
//! default instead of failing the whole repository.

use serde_json::Value;
use tracing::debug;

/// Neutral project type used when the document does not name one.
pub const DEFAULT_PROJECT_TYPE: &str = "project";

/// Resolves a dot-separated path, returning `default` when any segment is missing.
///
/// Numeric segments index into arrays.
///
/// # Examples
///
/// ```
/// use folio_core::get_path;
/// use serde_json::json;
///
/// let doc = json!({"tech_stack": {"primary": ["Flask"]}});
/// assert_eq!(get_path(&doc, "tech_stack.primary.0", json!(null)), json!("Flask"));
/// assert_eq!(get_path(&doc, "tech_stack.secondary", json!([])), json!([]));
/// ```
pub fn get_path(document: &Value, path: &str, default: Value) -> Value {
    lookup(document, path).cloned().unwrap_or(default)
}

/// Borrowing variant of [`get_path`].
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String at `path`, or `default` when absent or not a string.
pub fn path_str(document: &Value, path: &str, default: &str) -> String {
    match lookup(document, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => {
            debug!(path, kind = value_kind(other), "expected string in context document");
            default.to_string()
        }
    }
}

/// List of strings at `path`.
///
/// A single string is promoted to a one-element list; non-string array items
/// are skipped; any other shape yields an empty list.
pub fn path_str_list(document: &Value, path: &str) -> Vec<String> {
    match lookup(document, path) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    debug!(path, kind = value_kind(other), "skipping non-string list item");
                    None
                }
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            debug!(path, kind = value_kind(other), "expected list in context document");
            Vec::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The recognized sections of a context document, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    /// `tech_stack.primary`
    pub primary: Vec<String>,
    /// `tech_stack.secondary`
    pub secondary: Vec<String>,
    /// `skill_manifest.technical`
    pub technical: Vec<String>,
    /// `skill_manifest.domain`
    pub domain: Vec<String>,
    /// `project_identity.type`
    pub project_type: String,
    /// `project_identity.description`, falling back to a top-level `description`.
    pub description: String,
}

impl Default for ContextSummary {
    fn default() -> Self {
        Self {
            primary: Vec::new(),
            secondary: Vec::new(),
            technical: Vec::new(),
            domain: Vec::new(),
            project_type: DEFAULT_PROJECT_TYPE.to_string(),
            description: String::new(),
        }
    }
}

impl ContextSummary {
    /// Extracts the recognized sections; an absent document yields defaults.
    pub fn from_document(document: Option<&Value>) -> Self {
        let Some(doc) = document else {
            return Self::default();
        };

        let mut description = path_str(doc, "project_identity.description", "");
        if description.is_empty() {
            description = path_str(doc, "description", "");
        }

        let mut project_type = path_str(doc, "project_identity.type", DEFAULT_PROJECT_TYPE);
        if project_type.trim().is_empty() {
            project_type = DEFAULT_PROJECT_TYPE.to_string();
        }

        Self {
            primary: path_str_list(doc, "tech_stack.primary"),
            secondary: path_str_list(doc, "tech_stack.secondary"),
            technical: path_str_list(doc, "skill_manifest.technical"),
            domain: path_str_list(doc, "skill_manifest.domain"),
            project_type,
            description,
        }
    }

    /// Primary and secondary tech entries, in document order.
    pub fn tech_stack(&self) -> impl Iterator<Item = &str> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(String::as_str)
    }
}
