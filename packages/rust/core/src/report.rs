//! Human-readable change reports.
//!
//! Each processed file produces a [`FileReport`]; a run folds them into a
//! [`RunSummary`]. The Display impls render the report the way the run
//! prints it, so the CLI only has to `println!` the structures.

use std::path::PathBuf;
use std::time::Duration;

use linkcurator_shared::{Change, ChangeKind, Issue};

/// Outcome of processing a single corpus file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Mutations applied, in order.
    pub changes: Vec<Change>,
    /// Non-mutating findings flagged for review.
    pub issues: Vec<Issue>,
    /// Number of URLs probed over the network.
    pub checked: usize,
    /// Whether the file was written back.
    pub written: bool,
}

impl FileReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            changes: Vec::new(),
            issues: Vec::new(),
            checked: 0,
            written: false,
        }
    }

    /// True if any entry was modified or removed.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Number of removed entries.
    pub fn removed(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Removal)
            .count()
    }
}

impl std::fmt::Display for FileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Processing {}", self.path.display())?;

        for change in &self.changes {
            match &change.new_url {
                Some(new_url) => {
                    writeln!(f, "  {}: {}", change.kind, change.term)?;
                    writeln!(f, "    Old: {}", change.old_url)?;
                    writeln!(f, "    New: {new_url}")?;
                }
                None => {
                    writeln!(f, "  {}: {} -> {}", change.kind, change.term, change.old_url)?;
                }
            }
        }

        for issue in &self.issues {
            writeln!(f, "  ⚠ {}: {} ({})", issue.term, issue.url, issue.note)?;
        }

        if self.written {
            writeln!(f, "  ✓ saved {} change(s)", self.changes.len())?;
        } else if self.changed() {
            writeln!(f, "  {} change(s), not written (dry run)", self.changes.len())?;
        } else {
            writeln!(f, "  no changes needed")?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate counters for one pass over a directory.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files examined (including skipped ones).
    pub files_seen: usize,
    /// Files skipped due to read/parse errors or missing keys.
    pub files_skipped: usize,
    /// Files written back.
    pub files_written: usize,
    /// Total mutations across all files.
    pub total_changes: usize,
    /// Entries removed across all files.
    pub total_removed: usize,
    /// URLs probed over the network.
    pub total_checked: usize,
    /// Findings flagged for review.
    pub total_issues: usize,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
    /// Per-file reports, in processing order.
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    /// Fold a file report into the counters.
    pub fn absorb(&mut self, report: FileReport) {
        self.files_seen += 1;
        self.total_changes += report.changes.len();
        self.total_removed += report.removed();
        self.total_checked += report.checked;
        self.total_issues += report.issues.len();
        if report.written {
            self.files_written += 1;
        }
        self.reports.push(report);
    }

    /// Record a file that could not be processed.
    pub fn skip(&mut self) {
        self.files_seen += 1;
        self.files_skipped += 1;
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Files checked:  {}", self.files_seen)?;
        writeln!(f, "Files updated:  {}", self.files_written)?;
        if self.files_skipped > 0 {
            writeln!(f, "Files skipped:  {}", self.files_skipped)?;
        }
        writeln!(f, "Total fixes:    {}", self.total_changes - self.total_removed)?;
        writeln!(f, "Total removed:  {}", self.total_removed)?;
        if self.total_checked > 0 {
            writeln!(f, "Links checked:  {}", self.total_checked)?;
        }
        if self.total_issues > 0 {
            writeln!(f, "Needs review:   {}", self.total_issues)?;
        }
        write!(f, "Elapsed:        {:.1}s", self.elapsed.as_secs_f64())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_rendering_shows_old_and_new() {
        let mut report = FileReport::new(PathBuf::from("T16_terms.json"));
        report.changes.push(Change {
            kind: ChangeKind::Override,
            term: "Fokine".into(),
            old_url: "https://cs.wikipedia.org/wiki/Michail_Fokin".into(),
            new_url: Some("https://cs.wikipedia.org/wiki/Michail_Fokine".into()),
        });
        report.written = true;

        let rendered = report.to_string();
        assert!(rendered.contains("FIXED: Fokine"));
        assert!(rendered.contains("Old: https://cs.wikipedia.org/wiki/Michail_Fokin"));
        assert!(rendered.contains("New: https://cs.wikipedia.org/wiki/Michail_Fokine"));
        assert!(rendered.contains("saved 1 change(s)"));
    }

    #[test]
    fn summary_counters_accumulate() {
        let mut summary = RunSummary::default();

        let mut a = FileReport::new(PathBuf::from("a.json"));
        a.changes.push(Change {
            kind: ChangeKind::Removal,
            term: "Gone".into(),
            old_url: "https://example.com/gone".into(),
            new_url: None,
        });
        a.checked = 3;
        a.written = true;
        summary.absorb(a);

        summary.skip();

        assert_eq!(summary.files_seen, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_written, 1);
        assert_eq!(summary.total_changes, 1);
        assert_eq!(summary.total_removed, 1);
        assert_eq!(summary.total_checked, 3);

        let rendered = summary.to_string();
        assert!(rendered.contains("Total removed:  1"));
        assert!(rendered.contains("Links checked:  3"));
    }
}
