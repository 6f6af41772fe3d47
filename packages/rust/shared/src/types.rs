//! Core domain types for the link corpus.
//!
//! Corpus files are JSON documents edited in place. The serde types keep
//! unknown sibling fields via `#[serde(flatten)]` so a rewrite never drops
//! data it does not understand. `serde_json`'s `preserve_order` feature
//! keeps map keys in insertion order across a read/rebuild/write cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Corpus file shapes
// ---------------------------------------------------------------------------

/// A term-link file (`data/term_links/T*.json`): display term → URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermLinkFile {
    /// Mapping of display term to a reference URL (usually Wikipedia).
    /// Values are absolute URLs or empty strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Map<String, Value>>,

    /// Any other top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A resource file (`data/resources/*.json`): ordered sections of external links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFile {
    /// Ordered list of sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,

    /// Any other top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One section of a resource file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// External resources listed under this heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single titled external resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Change records
// ---------------------------------------------------------------------------

/// What kind of mutation a pass applied to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File-specific override table set the URL unconditionally.
    Override,
    /// A known-wrong fragment was substituted in the URL.
    Spelling,
    /// An ambiguous name was redirected to its canonical article.
    Disambiguation,
    /// The entry was deleted (removal table or dead resource link).
    Removal,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Override => "FIXED",
            ChangeKind::Spelling => "FIXED SPELLING",
            ChangeKind::Disambiguation => "FIXED AMBIGUOUS",
            ChangeKind::Removal => "REMOVED",
        };
        f.write_str(s)
    }
}

/// A single recorded mutation: term (or resource title), old URL, new URL.
#[derive(Debug, Clone)]
pub struct Change {
    pub kind: ChangeKind,
    /// Display term, or resource title for resource files.
    pub term: String,
    pub old_url: String,
    /// `None` for removals.
    pub new_url: Option<String>,
}

/// A non-mutating finding flagged for editorial review.
#[derive(Debug, Clone)]
pub struct Issue {
    pub term: String,
    pub url: String,
    pub note: String,
}
