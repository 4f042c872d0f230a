//! Canonical language taxonomy: language names, file extensions and coarse categories.
//!
//! Consumed read-only by the language scorer (to reject near-matches) and the
//! composition scorer (to classify files).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a language or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Source code.
    Programming,
    /// Structured data and configuration.
    Data,
    /// Markup and styling.
    Markup,
    /// Human prose.
    Prose,
    /// Unclassified.
    Nil,
}

impl FileCategory {
    /// All categories, in display order.
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Programming,
        FileCategory::Data,
        FileCategory::Markup,
        FileCategory::Prose,
        FileCategory::Nil,
    ];
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileCategory::Programming => "programming",
            FileCategory::Data => "data",
            FileCategory::Markup => "markup",
            FileCategory::Prose => "prose",
            FileCategory::Nil => "nil",
        };
        f.write_str(s)
    }
}

/// One entry of the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDef {
    /// Canonical display name.
    pub name: &'static str,
    /// Coarse category.
    pub category: FileCategory,
    /// Extensions including the leading dot, lowercase.
    pub extensions: &'static [&'static str],
    /// Exact file names, lowercase.
    pub filenames: &'static [&'static str],
}

const fn lang(
    name: &'static str,
    category: FileCategory,
    extensions: &'static [&'static str],
    filenames: &'static [&'static str],
) -> LanguageDef {
    LanguageDef {
        name,
        category,
        extensions,
        filenames,
    }
}

use FileCategory::{Data, Markup, Programming, Prose};

/// The canonical table.
pub static LANGUAGES: &[LanguageDef] = &[
    lang("C", Programming, &[".c", ".h"], &[]),
    lang("C#", Programming, &[".cs", ".csx"], &[]),
    lang("C++", Programming, &[".cpp", ".cc", ".cxx", ".hpp", ".hh", ".hxx"], &[]),
    lang("Clojure", Programming, &[".clj", ".cljs", ".cljc", ".edn"], &[]),
    lang("CMake", Programming, &[".cmake"], &["cmakelists.txt"]),
    lang("CoffeeScript", Programming, &[".coffee"], &[]),
    lang("CSS", Markup, &[".css"], &[]),
    lang("CSV", Data, &[".csv", ".tsv"], &[]),
    lang("Dart", Programming, &[".dart"], &[]),
    lang("Dockerfile", Programming, &[".dockerfile"], &["dockerfile", "containerfile"]),
    lang("Elixir", Programming, &[".ex", ".exs"], &[]),
    lang("Elm", Programming, &[".elm"], &[]),
    lang("Erlang", Programming, &[".erl", ".hrl"], &[]),
    lang("F#", Programming, &[".fs", ".fsi", ".fsx"], &[]),
    lang("Fortran", Programming, &[".f", ".f90", ".f95", ".for"], &[]),
    lang("Go", Programming, &[".go"], &[]),
    lang("GraphQL", Data, &[".graphql", ".gql"], &[]),
    lang("Groovy", Programming, &[".groovy", ".gradle"], &[]),
    lang("Haskell", Programming, &[".hs", ".lhs"], &[]),
    lang("HCL", Programming, &[".hcl", ".tf", ".tfvars"], &[]),
    lang("HTML", Markup, &[".html", ".htm", ".xhtml"], &[]),
    lang("INI", Data, &[".ini", ".cfg", ".conf"], &[]),
    lang("Java", Programming, &[".java"], &[]),
    lang("JavaScript", Programming, &[".js", ".mjs", ".cjs", ".jsx"], &[]),
    lang("JSON", Data, &[".json", ".jsonc", ".geojson"], &[]),
    lang("Julia", Programming, &[".jl"], &[]),
    lang("Jupyter Notebook", Markup, &[".ipynb"], &[]),
    lang("Kotlin", Programming, &[".kt", ".kts"], &[]),
    lang("Less", Markup, &[".less"], &[]),
    lang("Lua", Programming, &[".lua"], &[]),
    lang("Makefile", Programming, &[".mk", ".mak"], &["makefile", "gnumakefile"]),
    lang("Markdown", Prose, &[".md", ".markdown", ".mdx"], &[]),
    lang("MATLAB", Programming, &[".matlab"], &[]),
    lang("Nix", Programming, &[".nix"], &[]),
    lang("Objective-C", Programming, &[".m", ".mm"], &[]),
    lang("OCaml", Programming, &[".ml", ".mli"], &[]),
    lang("Perl", Programming, &[".pl", ".pm"], &[]),
    lang("PHP", Programming, &[".php", ".phtml"], &[]),
    lang("PowerShell", Programming, &[".ps1", ".psm1"], &[]),
    lang("Protocol Buffer", Data, &[".proto"], &[]),
    lang("Python", Programming, &[".py", ".pyi", ".pyw"], &["pipfile"]),
    lang("R", Programming, &[".r", ".rmd"], &[]),
    lang("reStructuredText", Prose, &[".rst"], &[]),
    lang("Ruby", Programming, &[".rb", ".rake", ".gemspec"], &["gemfile", "rakefile"]),
    lang("Rust", Programming, &[".rs"], &[]),
    lang("Sass", Markup, &[".sass"], &[]),
    lang("Scala", Programming, &[".scala", ".sc"], &[]),
    lang("SCSS", Markup, &[".scss"], &[]),
    lang("Shell", Programming, &[".sh", ".bash", ".zsh", ".fish"], &[]),
    lang("Solidity", Programming, &[".sol"], &[]),
    lang("SQL", Data, &[".sql"], &[]),
    lang("Svelte", Markup, &[".svelte"], &[]),
    lang("Swift", Programming, &[".swift"], &[]),
    lang("TeX", Markup, &[".tex", ".sty", ".cls"], &[]),
    lang("Text", Prose, &[".txt", ".text"], &["license", "authors", "changelog"]),
    lang("TOML", Data, &[".toml"], &["cargo.lock"]),
    lang("TypeScript", Programming, &[".ts", ".tsx", ".mts", ".cts"], &[]),
    lang("Vue", Markup, &[".vue"], &[]),
    lang("XML", Data, &[".xml", ".xsd", ".xsl", ".svg", ".plist"], &[]),
    lang("YAML", Data, &[".yml", ".yaml"], &[]),
    lang("Zig", Programming, &[".zig"], &[]),
];

/// Looks up a language by name, case-insensitively.
///
/// # Examples
///
/// ```
/// use folio_core::{lookup_language, FileCategory};
///
/// let python = lookup_language("python").unwrap();
/// assert_eq!(python.name, "Python");
/// assert_eq!(python.category, FileCategory::Programming);
/// assert!(lookup_language("pythonic").is_none());
/// ```
pub fn lookup_language(name: &str) -> Option<&'static LanguageDef> {
    let name = name.trim();
    LANGUAGES.iter().find(|def| def.name.eq_ignore_ascii_case(name))
}

/// Whether `name` is a canonical language name.
pub fn is_known_language(name: &str) -> bool {
    lookup_language(name).is_some()
}

/// Language for a file path, by exact file name first and extension second.
pub fn language_for_path(path: &str) -> Option<&'static LanguageDef> {
    let file_name = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path)
        .to_ascii_lowercase();
    if file_name.is_empty() {
        return None;
    }

    if let Some(def) = LANGUAGES
        .iter()
        .find(|def| def.filenames.contains(&file_name.as_str()))
    {
        return Some(def);
    }

    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        // Dotfiles like ".gitignore" have no extension.
        return None;
    }
    let ext = format!(".{}", ext);
    LANGUAGES
        .iter()
        .find(|def| def.extensions.contains(&ext.as_str()))
}

/// Category of a file path; unknown files are [`FileCategory::Nil`].
pub fn classify_path(path: &str) -> FileCategory {
    language_for_path(path)
        .map(|def| def.category)
        .unwrap_or(FileCategory::Nil)
}
