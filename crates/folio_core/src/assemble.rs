//! Tiered, size-budgeted context assembly for the downstream model.
//!
//! Rank 1 gets full detail, rank 2 a short excerpt, everything after a single
//! line. Two independent caps (characters and estimated tokens) bound the
//! result; when over budget, mentioned lines go first, then the secondary
//! section shrinks. The primary section is sized up front and never cut by
//! the global pass.

use crate::config::ContextBudget;
use crate::document::{ContextSummary, DEFAULT_PROJECT_TYPE};
use crate::types::{RepositoryRecord, ShortlistEntry, Tier};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Appended wherever text was cut.
pub const TRUNCATION_MARKER: &str = " [...]";

/// Leading line when the shortlist came from fallback mode.
pub const FALLBACK_NOTE: &str = "Note: no project clearly matched this question. \
The projects below are the closest candidates and may be only loosely related.";

const MENTIONED_HEADER: &str = "Other possibly relevant projects:";
const SEPARATOR: &str = "\n\n";
const MAX_LANGUAGES_SHOWN: usize = 5;

/// Estimate token count (rough approximation: chars / 4).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Cuts `text` to at most `max_chars` characters at a whitespace boundary
/// and appends [`TRUNCATION_MARKER`]. Text that already fits is borrowed.
///
/// # Examples
///
/// ```
/// use folio_core::{truncate_at_word, TRUNCATION_MARKER};
///
/// let cut = truncate_at_word("alpha beta gamma delta", 16);
/// assert_eq!(cut, format!("alpha beta{}", TRUNCATION_MARKER));
/// assert_eq!(truncate_at_word("short", 16), "short");
/// ```
pub fn truncate_at_word(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return Cow::Owned(String::new());
    }

    let budget = max_chars - marker_len;
    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let at_boundary = text[cut..].chars().next().map_or(true, char::is_whitespace);
    let kept = if at_boundary {
        head
    } else {
        head.rfind(char::is_whitespace).map_or("", |i| &head[..i])
    };

    let kept = kept.trim_end();
    if kept.is_empty() {
        Cow::Owned(TRUNCATION_MARKER.trim_start().to_string())
    } else {
        Cow::Owned(format!("{}{}", kept, TRUNCATION_MARKER))
    }
}

/// One rendered repository in the assembled context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSection {
    /// `owner/name`.
    pub repository: String,
    /// Detail level.
    pub tier: Tier,
    /// Characters contributed.
    pub chars: usize,
    /// Whether any of its content was cut.
    pub truncated: bool,
}

/// The text handed to the model, with accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Rendered context.
    pub text: String,
    /// Character count of `text`.
    pub chars: usize,
    /// Token estimate of `text`.
    pub estimated_tokens: usize,
    /// Whether anything was cut or dropped to fit the budgets.
    pub truncated: bool,
    /// Sections that made it into `text`, in rank order.
    pub sections: Vec<ContextSection>,
    /// Whether the fallback note was included.
    pub fallback_used: bool,
}

impl AssembledContext {
    /// Sections of one tier.
    pub fn sections_in(&self, tier: Tier) -> impl Iterator<Item = &ContextSection> {
        self.sections.iter().filter(move |s| s.tier == tier)
    }
}

struct Block {
    repository: String,
    tier: Tier,
    text: String,
    truncated: bool,
}

/// Renders a ranked shortlist into budgeted text.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    /// Creates an assembler with the given budgets.
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    /// Tightens the character cap to a model's input ceiling.
    pub fn with_input_ceiling(mut self, max_input_chars: Option<usize>) -> Self {
        if let Some(ceiling) = max_input_chars {
            self.budget.max_chars = self.budget.max_chars.min(ceiling);
        }
        self
    }

    /// Active budgets.
    pub fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Largest character count satisfying both caps.
    fn char_cap(&self) -> usize {
        let by_tokens = self
            .budget
            .max_tokens
            .saturating_mul(4)
            .saturating_add(3);
        self.budget.max_chars.min(by_tokens)
    }

    /// Assembles context for `shortlist`, looking repositories up in `records`.
    ///
    /// Entries without a matching record are skipped. Never fails; budget
    /// pressure is resolved by truncation.
    pub fn assemble(
        &self,
        shortlist: &[ShortlistEntry],
        records: &[RepositoryRecord],
        fallback_used: bool,
    ) -> AssembledContext {
        let by_name: HashMap<String, &RepositoryRecord> =
            records.iter().map(|r| (r.full_name(), r)).collect();
        let cap = self.char_cap();

        let mut primary: Option<Block> = None;
        let mut secondary: Option<Block> = None;
        let mut mentioned: Vec<Block> = Vec::new();

        for entry in shortlist {
            let Some(record) = by_name.get(&entry.repository) else {
                debug!(repository = %entry.repository, "shortlisted repository has no record");
                continue;
            };
            match entry.tier {
                Tier::Primary if primary.is_none() => {
                    let bound = self
                        .budget
                        .primary_readme_chars
                        .max(self.budget.primary_section_chars)
                        .min(cap);
                    primary = Some(self.render_primary(record, bound));
                }
                Tier::Secondary if secondary.is_none() => {
                    secondary = Some(self.render_secondary(record));
                }
                _ => mentioned.push(self.render_mentioned(record)),
            }
        }

        // The note only gets the room the primary section leaves.
        let note = if fallback_used && !shortlist.is_empty() {
            let used = primary.as_ref().map_or(0, |b| b.text.chars().count());
            let room = if used == 0 {
                cap
            } else {
                cap.saturating_sub(used + SEPARATOR.len())
            };
            fit_note(room)
        } else {
            String::new()
        };

        let mut truncated = primary.as_ref().is_some_and(|b| b.truncated)
            || secondary.as_ref().is_some_and(|b| b.truncated)
            || (fallback_used && !shortlist.is_empty() && note != FALLBACK_NOTE);

        // Lowest tier first: drop mentioned lines from the bottom.
        while !mentioned.is_empty()
            && compose(&note, &primary, &secondary, &mentioned).chars().count() > cap
        {
            mentioned.pop();
            truncated = true;
        }

        // Then shrink the secondary section.
        if compose(&note, &primary, &secondary, &mentioned).chars().count() > cap {
            if let Some(block) = secondary.take() {
                let others = compose(&note, &primary, &None, &mentioned).chars().count();
                let separator = if others == 0 { 0 } else { SEPARATOR.len() };
                let room = cap.saturating_sub(others + separator);
                let cut = truncate_at_word(&block.text, room);
                let header_len = block.text.lines().next().map_or(0, |l| l.chars().count());
                if cut.chars().count() > header_len {
                    secondary = Some(Block {
                        text: cut.into_owned(),
                        truncated: true,
                        ..block
                    });
                }
                truncated = true;
            }
        }

        let text = compose(&note, &primary, &secondary, &mentioned);
        let sections = primary
            .iter()
            .chain(secondary.iter())
            .chain(mentioned.iter())
            .filter(|b| !b.text.is_empty())
            .map(|b| ContextSection {
                repository: b.repository.clone(),
                tier: b.tier,
                chars: b.text.chars().count(),
                truncated: b.truncated,
            })
            .collect();

        let chars = text.chars().count();
        debug!(chars, truncated, "assembled context");
        AssembledContext {
            estimated_tokens: estimate_tokens(&text),
            chars,
            text,
            truncated,
            sections,
            fallback_used: !note.is_empty(),
        }
    }

    fn render_primary(&self, record: &RepositoryRecord, bound: usize) -> Block {
        let summary = ContextSummary::from_document(record.context.as_ref());
        let head = header(record, &summary, Tier::Primary);
        let skills = non_empty(record.skills_index.as_deref())
            .map(|s| format!("{}Skills index:\n{}", SEPARATOR, s))
            .unwrap_or_default();

        let mut truncated = false;
        let mut text = head;
        if let Some(readme) = non_empty(record.readme.as_deref()) {
            let label = format!("{}README:\n", SEPARATOR);
            let fixed = text.chars().count() + skills.chars().count() + label.chars().count();
            // The README gives way before the skills index does.
            let room = bound.saturating_sub(fixed).min(self.budget.primary_readme_chars);
            let excerpt = truncate_at_word(readme, room);
            truncated |= matches!(excerpt, Cow::Owned(_));
            if !excerpt.is_empty() {
                text.push_str(&label);
                text.push_str(&excerpt);
            }
        }
        text.push_str(&skills);

        if text.chars().count() > bound {
            text = fit_primary(&text, &record.full_name(), bound);
            truncated = true;
        }

        Block {
            repository: record.full_name(),
            tier: Tier::Primary,
            text,
            truncated,
        }
    }

    fn render_secondary(&self, record: &RepositoryRecord) -> Block {
        let summary = ContextSummary::from_document(record.context.as_ref());
        let mut text = header(record, &summary, Tier::Secondary);
        let mut truncated = false;
        if let Some(readme) = non_empty(record.readme.as_deref()) {
            let excerpt = truncate_at_word(readme, self.budget.secondary_readme_chars);
            truncated = matches!(excerpt, Cow::Owned(_));
            if !excerpt.is_empty() {
                text.push_str(SEPARATOR);
                text.push_str("README excerpt:\n");
                text.push_str(&excerpt);
            }
        }
        Block {
            repository: record.full_name(),
            tier: Tier::Secondary,
            text,
            truncated,
        }
    }

    fn render_mentioned(&self, record: &RepositoryRecord) -> Block {
        let summary = ContextSummary::from_document(record.context.as_ref());
        let line = one_line_description(record, &summary)
            .map(|d| truncate_at_word(&d, self.budget.description_chars).into_owned())
            .unwrap_or_else(|| "no description".to_string());
        Block {
            repository: record.full_name(),
            tier: Tier::Mentioned,
            text: format!("- {}: {}", record.full_name(), line),
            truncated: false,
        }
    }
}

fn compose(
    note: &str,
    primary: &Option<Block>,
    secondary: &Option<Block>,
    mentioned: &[Block],
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !note.is_empty() {
        parts.push(note.to_string());
    }
    for block in primary.iter().chain(secondary.iter()) {
        if !block.text.is_empty() {
            parts.push(block.text.clone());
        }
    }
    if !mentioned.is_empty() {
        let mut list = String::from(MENTIONED_HEADER);
        for block in mentioned {
            list.push('\n');
            list.push_str(&block.text);
        }
        parts.push(list);
    }
    parts.join(SEPARATOR)
}

/// Fallback note cut to `room`, or nothing when not even a word fits.
fn fit_note(room: usize) -> String {
    let cut = truncate_at_word(FALLBACK_NOTE, room);
    if cut.is_empty() || cut == TRUNCATION_MARKER.trim_start() {
        String::new()
    } else {
        cut.into_owned()
    }
}

/// Cuts a primary section to `bound` without losing the repository name.
///
/// Falls back to the heading line, then to a bare `## owner/name`.
fn fit_primary(text: &str, full_name: &str, bound: usize) -> String {
    let heading = text.lines().next().unwrap_or_default();
    let cut = truncate_at_word(text, bound);
    if !heading.is_empty() && cut.starts_with(heading) {
        return cut.into_owned();
    }
    let bare = format!("## {}", full_name);
    if heading.chars().count() <= bound {
        return heading.to_string();
    }
    if bare.chars().count() <= bound {
        return bare;
    }
    bare.chars().take(bound).collect()
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

fn one_line_description(record: &RepositoryRecord, summary: &ContextSummary) -> Option<String> {
    non_empty(record.description.as_deref())
        .or_else(|| non_empty(Some(summary.description.as_str())))
        .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(str::to_string)
}

fn header(record: &RepositoryRecord, summary: &ContextSummary, tier: Tier) -> String {
    let mut out = format!("## {} ({} match)", record.full_name(), tier);
    if let Some(description) = one_line_description(record, summary) {
        out.push('\n');
        out.push_str(&description);
    }
    if summary.project_type != DEFAULT_PROJECT_TYPE {
        out.push_str(&format!("\nType: {}", summary.project_type));
    }
    if let Some(languages) = language_line(record) {
        out.push_str(&format!("\nLanguages: {}", languages));
    }
    let tech: Vec<&str> = summary.tech_stack().collect();
    if !tech.is_empty() {
        out.push_str(&format!("\nTech stack: {}", tech.join(", ")));
    }
    out
}

fn language_line(record: &RepositoryRecord) -> Option<String> {
    let total = record.total_language_bytes();
    if total == 0 {
        return None;
    }
    let mut langs: Vec<(&String, &u64)> = record.languages.iter().collect();
    langs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let shown: Vec<String> = langs
        .iter()
        .take(MAX_LANGUAGES_SHOWN)
        .map(|(name, bytes)| {
            let (bytes, total) = (u128::from(**bytes), u128::from(total));
            format!("{} {}%", name, (bytes * 100 + total / 2) / total)
        })
        .collect();
    Some(shown.join(", "))
}
