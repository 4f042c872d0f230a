use folio_core::RepositoryRecord;
use serde_json::{json, Value};

/// Fluent builder for repository records used in scenarios
pub struct RecordBuilder {
    record: RepositoryRecord,
    primary: Vec<String>,
    secondary: Vec<String>,
    technical: Vec<String>,
    project_type: Option<String>,
}

/// Start building a record for `owner/name`
pub fn repo(owner: &str, name: &str) -> RecordBuilder {
    RecordBuilder {
        record: RepositoryRecord::new(owner, name),
        primary: Vec::new(),
        secondary: Vec::new(),
        technical: Vec::new(),
        project_type: None,
    }
}

impl RecordBuilder {
    pub fn description(mut self, text: &str) -> Self {
        self.record.description = Some(text.to_string());
        self
    }

    pub fn language(mut self, name: &str, bytes: u64) -> Self {
        self.record.languages.insert(name.to_string(), bytes);
        self
    }

    pub fn tech(mut self, items: &[&str]) -> Self {
        self.primary.extend(items.iter().map(|s| s.to_string()));
        self
    }

    pub fn secondary_tech(mut self, items: &[&str]) -> Self {
        self.secondary.extend(items.iter().map(|s| s.to_string()));
        self
    }

    pub fn skills(mut self, items: &[&str]) -> Self {
        self.technical.extend(items.iter().map(|s| s.to_string()));
        self
    }

    pub fn project_type(mut self, kind: &str) -> Self {
        self.project_type = Some(kind.to_string());
        self
    }

    pub fn readme(mut self, text: &str) -> Self {
        self.record.readme = Some(text.to_string());
        self
    }

    pub fn skills_index(mut self, text: &str) -> Self {
        self.record.skills_index = Some(text.to_string());
        self
    }

    pub fn files(mut self, paths: &[&str]) -> Self {
        self.record.file_tree = paths.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn updated_at(mut self, ts: i64) -> Self {
        self.record.metadata.updated_at = ts;
        self
    }

    pub fn build(mut self) -> RepositoryRecord {
        let has_context = !self.primary.is_empty()
            || !self.secondary.is_empty()
            || !self.technical.is_empty()
            || self.project_type.is_some();
        if has_context {
            let mut doc = json!({
                "tech_stack": {"primary": self.primary, "secondary": self.secondary},
                "skill_manifest": {"technical": self.technical},
            });
            if let (Some(kind), Value::Object(map)) = (self.project_type, &mut doc) {
                map.insert("project_identity".into(), json!({ "type": kind }));
            }
            self.record.context = Some(doc);
        }
        self.record
    }
}
