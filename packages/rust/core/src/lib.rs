//! Directory-level passes over the link corpus.
//!
//! Each operation is a sequential sweep: read a JSON file, rewrite its
//! entries with the rule tables and/or the liveness checker, collect a
//! change report, and write back only when something changed.

pub mod io;
pub mod report;
pub mod resources;
pub mod terms;

pub use report::{FileReport, RunSummary};
pub use resources::{RESOURCE_CHECK_DELAY_MS, validate_resources};
pub use terms::{
    CheckOptions, ProgressReporter, SilentProgress, TERM_CHECK_DELAY_MS, audit_terms, check_wiki,
    fix_terms,
};
