//! Passes over the term-link corpus (`data/term_links/T*.json`).
//!
//! Three operations, each one sequential sweep over the directory:
//! - [`fix_terms`] — file-specific override/removal tables only.
//! - [`audit_terms`] — full offline rewrite plus editorial review flags.
//! - [`check_wiki`] — online liveness check with canonical fixes. Dead
//!   term links are reported, never removed; which URL a term should get
//!   is an editorial decision that belongs in the rule tables.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use linkcurator_linkcheck::LinkChecker;
use linkcurator_rules::{apply_overrides, canonical_fix, rewrite_terms};
use linkcurator_shared::{Change, ChangeKind, Issue, Result, RuleSet, TermLinkFile};

use crate::io::{file_name, list_json_files, read_json, write_json};
use crate::report::{FileReport, RunSummary};

/// Default delay between wiki checks, in milliseconds.
pub const TERM_CHECK_DELAY_MS: u64 = 100;

/// Options shared by the online passes.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Report changes without writing files back.
    pub dry_run: bool,
    /// Courtesy sleep between consecutive URL checks.
    pub courtesy_delay_ms: u64,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            courtesy_delay_ms: TERM_CHECK_DELAY_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for long-running passes.
pub trait ProgressReporter: Send + Sync {
    /// Called when a file begins processing.
    fn file_started(&self, name: &str, current: usize, total: usize);
    /// Called after each URL probe.
    fn link_checked(&self, url: &str, live: bool);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn file_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn link_checked(&self, _url: &str, _live: bool) {}
}

// ---------------------------------------------------------------------------
// fix-terms (offline, override tables only)
// ---------------------------------------------------------------------------

/// Apply the file-specific override and removal tables to the term-link
/// files they name. Files without configured rules are not touched.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn fix_terms(dir: &Path, rules: &RuleSet, dry_run: bool) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    // Union of file names the tables mention, in stable order.
    let targets: BTreeSet<&String> = rules
        .file_overrides
        .keys()
        .chain(rules.removals.keys())
        .collect();

    info!(files = targets.len(), "applying per-file fix tables");

    for name in targets {
        let path = dir.join(name);
        if !path.exists() {
            warn!(file = %name, "configured file not found, skipping");
            summary.skip();
            continue;
        }

        let mut report = FileReport::new(path.clone());

        let mut file: TermLinkFile = match read_json(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable file, skipping");
                summary.skip();
                continue;
            }
        };
        let Some(terms) = file.terms.as_ref() else {
            warn!(file = %name, "no 'terms' key found, skipping");
            summary.skip();
            continue;
        };

        let outcome = apply_overrides(name, terms, rules);
        report.changes = outcome.changes;

        if report.changed() && !dry_run {
            file.terms = Some(outcome.terms);
            match write_json(&path, &file) {
                Ok(()) => report.written = true,
                Err(e) => {
                    warn!(file = %name, error = %e, "write failed, skipping");
                    summary.skip();
                    continue;
                }
            }
        }

        summary.absorb(report);
    }

    summary.elapsed = start.elapsed();
    info!(
        files_written = summary.files_written,
        total_changes = summary.total_changes,
        "fix-terms pass complete"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// audit-terms (offline, full rule set)
// ---------------------------------------------------------------------------

/// Run the full offline rewrite over every `T*.json` in `dir`:
/// overrides, removals, spelling fixes, and canonical disambiguation,
/// plus review flags for known-person mismatches.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn audit_terms(dir: &Path, rules: &RuleSet, dry_run: bool) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    for path in term_link_files(dir)? {
        let name = file_name(&path);
        let mut report = FileReport::new(path.clone());

        let mut file: TermLinkFile = match read_json(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable file, skipping");
                summary.skip();
                continue;
            }
        };
        let Some(terms) = file.terms.as_ref() else {
            warn!(file = %name, "no 'terms' key found, skipping");
            summary.skip();
            continue;
        };

        let outcome = rewrite_terms(&name, terms, rules);
        report.issues = linkcurator_rules::audit_people(&outcome.terms, rules);
        report.changes = outcome.changes;

        if report.changed() && !dry_run {
            file.terms = Some(outcome.terms);
            match write_json(&path, &file) {
                Ok(()) => report.written = true,
                Err(e) => {
                    warn!(file = %name, error = %e, "write failed, skipping");
                    summary.skip();
                    continue;
                }
            }
        }

        summary.absorb(report);
    }

    summary.elapsed = start.elapsed();
    info!(
        files_written = summary.files_written,
        total_changes = summary.total_changes,
        total_issues = summary.total_issues,
        "audit-terms pass complete"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// check-wiki (online)
// ---------------------------------------------------------------------------

/// Liveness-check every non-empty term URL and apply canonical fixes.
///
/// Strictly sequential: one URL at a time with a courtesy sleep between
/// probes. Dead links become review issues in the report; the entries
/// themselves stay in place.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn check_wiki(
    dir: &Path,
    rules: &RuleSet,
    checker: &LinkChecker,
    opts: &CheckOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    let files = term_link_files(dir)?;
    let total = files.len();

    for (index, path) in files.iter().enumerate() {
        let name = file_name(path);
        progress.file_started(&name, index + 1, total);
        let mut report = FileReport::new(path.clone());

        let mut file: TermLinkFile = match read_json(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable file, skipping");
                summary.skip();
                continue;
            }
        };
        let Some(terms) = file.terms.as_ref() else {
            warn!(file = %name, "no 'terms' key found, skipping");
            summary.skip();
            continue;
        };

        let mut rebuilt = Map::new();

        for (term, value) in terms {
            let Some(url) = value.as_str().filter(|u| !u.is_empty()) else {
                rebuilt.insert(term.clone(), value.clone());
                continue;
            };

            let mut current = url.to_string();
            if let Some(fixed) = canonical_fix(term, &current, rules) {
                if fixed != current {
                    report.changes.push(Change {
                        kind: ChangeKind::Disambiguation,
                        term: term.clone(),
                        old_url: current.clone(),
                        new_url: Some(fixed.clone()),
                    });
                    current = fixed;
                }
            }

            let verdict = checker.check(&current).await;
            report.checked += 1;
            progress.link_checked(&current, verdict.is_live());

            if !verdict.is_live() {
                report.issues.push(Issue {
                    term: term.clone(),
                    url: current.clone(),
                    note: format!(
                        "dead link: {}",
                        verdict.reason.as_deref().unwrap_or("unknown")
                    ),
                });
            }

            rebuilt.insert(term.clone(), Value::String(current));

            if opts.courtesy_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(opts.courtesy_delay_ms)).await;
            }
        }

        if report.changed() && !opts.dry_run {
            file.terms = Some(rebuilt);
            match write_json(path, &file) {
                Ok(()) => report.written = true,
                Err(e) => {
                    warn!(file = %name, error = %e, "write failed, skipping");
                    summary.skip();
                    continue;
                }
            }
        }

        summary.absorb(report);
    }

    summary.elapsed = start.elapsed();
    info!(
        links_checked = summary.total_checked,
        total_changes = summary.total_changes,
        dead_links = summary.total_issues,
        "check-wiki pass complete"
    );
    Ok(summary)
}

/// The `T*.json` files of a term-link directory, sorted.
fn term_link_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    Ok(list_json_files(dir)?
        .into_iter()
        .filter(|p| file_name(p).starts_with('T'))
        .collect())
}
