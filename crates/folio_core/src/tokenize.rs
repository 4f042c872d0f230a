//! Tokenization of free text and structured documents into comparable term sets.

use crate::document::ContextSummary;
use crate::types::RepositoryRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Words that carry no signal for repository matching.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "have", "how", "i", "in", "is", "it", "me", "my", "of", "on", "or", "show", "some", "that",
    "the", "this", "to", "use", "used", "uses", "using", "what", "which", "with", "you", "your",
];

/// Shortest token kept after splitting.
const MIN_TOKEN_CHARS: usize = 2;

/// Origin category of a term set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermCategory {
    /// Language names from the byte map.
    Language,
    /// Tech stack entries and topics.
    Tech,
    /// Skill manifest entries.
    Skill,
    /// Description-like free text.
    Description,
}

impl TermCategory {
    /// All categories, in scoring order.
    pub const ALL: [TermCategory; 4] = [
        TermCategory::Language,
        TermCategory::Tech,
        TermCategory::Skill,
        TermCategory::Description,
    ];

    /// Language and tech hits mark a query as technical.
    pub fn is_technical(self) -> bool {
        matches!(self, TermCategory::Language | TermCategory::Tech)
    }
}

/// Normalized tokens tagged with where they came from. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSet {
    /// Origin category.
    pub category: TermCategory,
    /// Lowercase normalized tokens.
    pub tokens: BTreeSet<String>,
}

impl TermSet {
    /// Creates an empty term set for a category.
    pub fn new(category: TermCategory) -> Self {
        Self {
            category,
            tokens: BTreeSet::new(),
        }
    }

    /// Adds every token of `text`.
    pub fn extend_text(&mut self, text: &str) {
        self.tokens.extend(tokenize(text));
    }

    /// Adds only the whole words of `text`, without compound splitting.
    pub fn extend_words(&mut self, text: &str) {
        self.tokens.extend(whole_words(text));
    }
}

/// The four term sets of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTerms {
    /// Language names.
    pub language: TermSet,
    /// Tech stack entries and topics.
    pub tech: TermSet,
    /// Skill manifest entries.
    pub skill: TermSet,
    /// Descriptions, project type and the repository name.
    pub description: TermSet,
}

impl RepositoryTerms {
    /// Builds the term sets from a record, applying typed defaults for any
    /// missing or malformed context field.
    pub fn from_record(record: &RepositoryRecord) -> Self {
        let summary = ContextSummary::from_document(record.context.as_ref());

        let mut language = TermSet::new(TermCategory::Language);
        for name in record.languages.keys() {
            language.extend_words(name);
        }

        let mut tech = TermSet::new(TermCategory::Tech);
        for entry in summary.tech_stack() {
            tech.extend_text(entry);
        }
        for topic in &record.topics {
            tech.extend_text(topic);
        }

        let mut skill = TermSet::new(TermCategory::Skill);
        for entry in summary.technical.iter().chain(&summary.domain) {
            skill.extend_text(entry);
        }

        let mut description = TermSet::new(TermCategory::Description);
        description.extend_text(&record.name);
        if let Some(text) = &record.description {
            description.extend_text(text);
        }
        description.extend_text(&summary.description);
        description.extend_text(&summary.project_type);

        Self {
            language,
            tech,
            skill,
            description,
        }
    }

    /// Term set for a category.
    pub fn get(&self, category: TermCategory) -> &TermSet {
        match category {
            TermCategory::Language => &self.language,
            TermCategory::Tech => &self.tech,
            TermCategory::Skill => &self.skill,
            TermCategory::Description => &self.description,
        }
    }
}

/// Turns free text into a set of normalized tokens.
///
/// Lowercases, strips punctuation, splits on whitespace as well as
/// camelCase / snake_case / kebab-case boundaries, drops stop words and
/// tokens shorter than two characters. Compound words are kept whole in
/// addition to their parts, so `SQLAlchemy` yields `sqlalchemy`, `sql` and
/// `alchemy`. `+` and `#` are word characters so `c++` and `c#` survive.
///
/// # Examples
///
/// ```
/// use folio_core::tokenize;
///
/// let tokens = tokenize("Python Flask projects");
/// assert!(tokens.contains("python"));
/// assert!(tokens.contains("flask"));
/// assert!(tokens.contains("project"));
/// assert!(tokenize("").is_empty());
/// ```
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    for word in text.split(|c: char| !is_word_char(c)) {
        if word.is_empty() {
            continue;
        }

        let whole: String = word.chars().filter(|c| *c != '_' && *c != '-').collect();
        push_token(&mut tokens, &whole);

        let parts = split_compound(word);
        if parts.len() > 1 {
            for part in parts {
                push_token(&mut tokens, part);
            }
        }
    }

    tokens
}

/// Like [`tokenize`] but keeps compound words whole.
///
/// Used for language names, where `JavaScript` must not produce a `java` term.
pub fn whole_words(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for word in text.split(|c: char| !is_word_char(c)) {
        let whole: String = word.chars().filter(|c| *c != '_' && *c != '-').collect();
        push_token(&mut tokens, &whole);
    }
    tokens
}

/// Tokenizes every string leaf of a nested document and unions the results.
///
/// Numbers, booleans and nulls are ignored. Nodes are tracked by identity so
/// a node reachable twice is only visited once.
pub fn flatten(document: &Value) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let mut visited: HashSet<*const Value> = HashSet::new();
    let mut stack: Vec<&Value> = vec![document];

    while let Some(node) = stack.pop() {
        if !visited.insert(node as *const Value) {
            continue;
        }

        match node {
            Value::String(s) => tokens.extend(tokenize(s)),
            Value::Array(items) => stack.extend(items.iter()),
            Value::Object(map) => stack.extend(map.values()),
            Value::Number(_) | Value::Bool(_) | Value::Null => {}
        }
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '#')
}

/// Splits a word on `_`/`-` and on case or letter/digit transitions.
fn split_compound(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();

    for piece in word.split(|c| c == '_' || c == '-') {
        if piece.is_empty() {
            continue;
        }

        let chars: Vec<(usize, char)> = piece.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (idx, cur) = chars[i];
            let prev = chars[i - 1].1;
            let next = chars.get(i + 1).map(|(_, c)| *c);
            let after_next = chars.get(i + 2).map(|(_, c)| *c);

            let lower_to_upper = prev.is_lowercase() && cur.is_uppercase();
            // "SQLAlchemy": split before the 'A' that starts a lowercase run,
            // but leave plural acronyms like "APIs" alone.
            let acronym_end = prev.is_uppercase()
                && cur.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase())
                && after_next.is_some_and(|n| n.is_lowercase());
            let digit_edge = prev.is_ascii_digit() != cur.is_ascii_digit()
                && prev.is_alphanumeric()
                && cur.is_alphanumeric();

            if lower_to_upper || acronym_end || digit_edge {
                parts.push(&piece[start..idx]);
                start = idx;
            }
        }
        parts.push(&piece[start..]);
    }

    parts
}

fn push_token(tokens: &mut BTreeSet<String>, raw: &str) {
    let lower = raw.to_lowercase();
    let trimmed = lower.trim_matches(|c| c == '+' || c == '#');
    // Keep trailing symbols only when they are part of a name like c++ or f#.
    let token = if trimmed.is_empty() || lower.starts_with(['+', '#']) {
        trimmed
    } else {
        lower.as_str()
    };

    if token.chars().count() < MIN_TOKEN_CHARS || STOP_WORDS.contains(&token) {
        return;
    }
    tokens.insert(normalize(token));
}

/// Light plural folding so `projects` and `project` compare equal.
fn normalize(token: &str) -> String {
    let is_plural = token.len() > 4
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
        && token.chars().all(|c| c.is_alphabetic());

    if is_plural {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{}y", stem);
        }
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
