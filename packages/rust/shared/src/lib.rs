//! Shared types, error model, and rule-set configuration for linkcurator.
//!
//! This crate is the foundation depended on by all other linkcurator crates.
//! It provides:
//! - [`LinkCuratorError`] — the unified error type
//! - Corpus types ([`TermLinkFile`], [`ResourceFile`], [`Change`])
//! - Rule configuration ([`RuleSet`], rules loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CheckerConfig, PersonYears, RULES_FILE_NAME, RuleSet, default_rules, init_rules, load_rules,
    load_rules_from,
};
pub use error::{LinkCuratorError, Result};
pub use types::{Change, ChangeKind, Issue, Resource, ResourceFile, Section, TermLinkFile};
