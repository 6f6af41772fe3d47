//! Table-driven rewriting of term → URL mappings.
//!
//! Every pass is a pure function over an insertion-ordered map plus a
//! [`RuleSet`]; nothing here touches the filesystem or the network. The
//! passes are idempotent by construction: overrides set an exact value,
//! spelling tables only contain wrong fragments, and a canonical fix
//! produces a URL that already satisfies the canonical check.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use linkcurator_shared::{Change, ChangeKind, Issue, RuleSet};

/// Result of rewriting one term-link file's `terms` map.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// The rebuilt map, in processing order.
    pub terms: Map<String, Value>,
    /// Every mutation applied, in order.
    pub changes: Vec<Change>,
}

impl RewriteOutcome {
    /// True if any entry was modified or removed.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Override pass (file-specific tables only)
// ---------------------------------------------------------------------------

/// Apply only the file-specific override and removal tables.
///
/// Overrides replace the URL unconditionally when the term is present;
/// terms on the removal list are dropped from the map.
pub fn apply_overrides(file_name: &str, terms: &Map<String, Value>, rules: &RuleSet) -> RewriteOutcome {
    let overrides = rules.overrides_for(file_name);
    let removals = rules.removals_for(file_name);

    let mut out = Map::new();
    let mut changes = Vec::new();

    for (term, value) in terms {
        if removals.iter().any(|t| t == term) {
            changes.push(Change {
                kind: ChangeKind::Removal,
                term: term.clone(),
                old_url: value.as_str().unwrap_or_default().to_string(),
                new_url: None,
            });
            continue;
        }

        // The override wins whatever the old value was, string or not.
        match overrides.and_then(|map| map.get(term)) {
            Some(new) if value.as_str() != Some(new.as_str()) => {
                changes.push(Change {
                    kind: ChangeKind::Override,
                    term: term.clone(),
                    old_url: value.as_str().unwrap_or_default().to_string(),
                    new_url: Some(new.clone()),
                });
                out.insert(term.clone(), Value::String(new.clone()));
            }
            _ => {
                out.insert(term.clone(), value.clone());
            }
        }
    }

    RewriteOutcome { terms: out, changes }
}

// ---------------------------------------------------------------------------
// Full rewrite pass (overrides → removals → spelling → canonical)
// ---------------------------------------------------------------------------

/// Apply the full rule set to a term map.
///
/// Per entry: a file-specific override wins outright; otherwise any known
/// wrong fragment in the URL is substituted; otherwise an ambiguous name
/// is redirected to its canonical article. Entries without a string URL
/// pass through untouched.
pub fn rewrite_terms(file_name: &str, terms: &Map<String, Value>, rules: &RuleSet) -> RewriteOutcome {
    let overridden = apply_overrides(file_name, terms, rules);
    let overridden_terms: std::collections::BTreeSet<&String> = overridden
        .changes
        .iter()
        .map(|c| &c.term)
        .collect();

    let mut out = Map::new();
    let mut changes = overridden.changes.clone();

    for (term, value) in &overridden.terms {
        // An entry the override table already decided is final for this run.
        if overridden_terms.contains(term) {
            out.insert(term.clone(), value.clone());
            continue;
        }

        let Some(url) = value.as_str() else {
            out.insert(term.clone(), value.clone());
            continue;
        };

        let mut current = url.to_string();

        if let Some(fixed) = apply_spelling(&current, rules) {
            changes.push(Change {
                kind: ChangeKind::Spelling,
                term: term.clone(),
                old_url: current.clone(),
                new_url: Some(fixed.clone()),
            });
            current = fixed;
        }

        if let Some(fixed) = canonical_fix(term, &current, rules) {
            if fixed != current {
                changes.push(Change {
                    kind: ChangeKind::Disambiguation,
                    term: term.clone(),
                    old_url: current.clone(),
                    new_url: Some(fixed.clone()),
                });
                current = fixed;
            }
        }

        out.insert(term.clone(), Value::String(current));
    }

    debug!(file_name, changes = changes.len(), "rewrite pass done");
    RewriteOutcome { terms: out, changes }
}

/// Substitute the first matching wrong fragment in `url`, if any.
///
/// Returns `None` when no known-wrong fragment occurs, leaving the URL
/// byte-for-byte untouched. A URL that already carries the corrected
/// fragment is also left alone: "Michail_Fokin" is a substring of the
/// corrected "Michail_Fokine", and replacing it again would corrupt an
/// already-fixed URL on every rerun.
pub fn apply_spelling(url: &str, rules: &RuleSet) -> Option<String> {
    for (wrong, correct) in &rules.spelling {
        if url.contains(wrong.as_str()) && !url.contains(correct.as_str()) {
            return Some(url.replace(wrong.as_str(), correct));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Canonical disambiguation
// ---------------------------------------------------------------------------

/// Redirect an ambiguous term's URL to its canonical article, if the rule
/// set names one and the URL does not already point there.
///
/// Matching is case-insensitive and tolerant of abbreviated forms: the
/// term and the table key match when either contains the other ("Fokine"
/// matches "M. Fokine"). The rewritten URL keeps the original wiki base,
/// so a Czech article stays on cs.wikipedia.org.
pub fn canonical_fix(term: &str, url: &str, rules: &RuleSet) -> Option<String> {
    let title = wiki_title(url)?;
    let base = wiki_base(url)?;
    let term_lower = term.to_lowercase();

    // An exact key wins over substring matches.
    let canonical = rules.canonical.get(term).or_else(|| {
        rules
            .canonical
            .iter()
            .find(|(key, _)| {
                let key_lower = key.to_lowercase();
                term_lower.contains(&key_lower) || key_lower.contains(&term_lower)
            })
            .map(|(_, title)| title)
    })?;

    // The table may write "Mats Ek" for the article title "Mats_Ek";
    // compare in underscored form or an already-canonical URL would be
    // rewritten to itself on every run.
    let canonical_title = canonical.replace(' ', "_");
    if title.to_lowercase().contains(&canonical_title.to_lowercase()) {
        return None;
    }

    Some(format!("{base}{canonical_title}"))
}

static WIKI_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wiki/(.+)").expect("valid regex"));

/// Extract the article title from a Wikipedia URL, without any `#fragment`.
pub fn wiki_title(url: &str) -> Option<String> {
    let caps = WIKI_TITLE_RE.captures(url)?;
    let title = caps.get(1)?.as_str();
    let title = title.split('#').next().unwrap_or(title);
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// The URL prefix up to and including `/wiki/`.
fn wiki_base(url: &str) -> Option<&str> {
    let idx = url.find("/wiki/")?;
    Some(&url[..idx + "/wiki/".len()])
}

// ---------------------------------------------------------------------------
// Editorial review flags
// ---------------------------------------------------------------------------

/// Flag entries whose term matches a person from the years table but whose
/// URL does not obviously point at that person. No mutation — these are
/// content-level questions for a human.
pub fn audit_people(terms: &Map<String, Value>, rules: &RuleSet) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (term, value) in terms {
        let Some(url) = value.as_str() else { continue };
        let Some(title) = wiki_title(url) else {
            continue;
        };
        let term_lower = term.to_lowercase();

        for (person, years) in &rules.people {
            let person_lower = person.to_lowercase();
            if !term_lower.contains(&person_lower) && !person_lower.contains(&term_lower) {
                continue;
            }

            let expected = person.to_lowercase().replace(' ', "_");
            if !title.to_lowercase().contains(&expected) {
                let span = match years.died {
                    Some(died) => format!("{}–{}", years.born.unwrap_or_default(), died),
                    None => format!("*{}", years.born.unwrap_or_default()),
                };
                issues.push(Issue {
                    term: term.clone(),
                    url: url.to_string(),
                    note: format!("URL may not match {person} ({span})"),
                });
                break;
            }
        }
    }

    issues
}
