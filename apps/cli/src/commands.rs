//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use linkcurator_core::{
    CheckOptions, ProgressReporter, RESOURCE_CHECK_DELAY_MS, RunSummary, TERM_CHECK_DELAY_MS,
};
use linkcurator_linkcheck::LinkChecker;
use linkcurator_shared::{RuleSet, load_rules, load_rules_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// linkcurator — keep the dance-history link corpus clean.
#[derive(Parser)]
#[command(
    name = "linkcurator",
    version,
    about = "Fix ambiguous Wikipedia links and prune dead resource links in the corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the rules file (defaults to ./rules.toml, or built-in rules).
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Apply the per-file override and removal tables to term-link files.
    FixTerms {
        /// Term-link directory.
        #[arg(long, default_value = "data/term_links")]
        dir: PathBuf,

        /// Report changes without writing files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Offline pass over all term-link files: overrides, spelling fixes,
    /// canonical disambiguation, and review flags.
    AuditTerms {
        /// Term-link directory.
        #[arg(long, default_value = "data/term_links")]
        dir: PathBuf,

        /// Report changes without writing files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check every term-link URL over the network and apply canonical fixes.
    /// Dead links are reported, never removed.
    CheckWiki {
        /// Term-link directory.
        #[arg(long, default_value = "data/term_links")]
        dir: PathBuf,

        /// Report changes without writing files.
        #[arg(long)]
        dry_run: bool,

        /// Delay between checks in milliseconds.
        #[arg(long, default_value_t = TERM_CHECK_DELAY_MS)]
        delay_ms: u64,
    },

    /// Check every resource URL over the network and remove dead entries.
    ValidateResources {
        /// Resource directory.
        #[arg(long, default_value = "data/resources")]
        dir: PathBuf,

        /// Report changes without writing files.
        #[arg(long)]
        dry_run: bool,

        /// Delay between checks in milliseconds.
        #[arg(long, default_value_t = RESOURCE_CHECK_DELAY_MS)]
        delay_ms: u64,
    },

    /// Rule-set management.
    Rules {
        /// Rules subcommand.
        #[command(subcommand)]
        action: RulesAction,
    },
}

/// Rules subcommands.
#[derive(Subcommand)]
pub(crate) enum RulesAction {
    /// Write the built-in default rule set to a rules.toml.
    Init {
        /// Destination path.
        #[arg(long, default_value = "rules.toml")]
        path: PathBuf,
    },
    /// Print the resolved rule set.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "linkcurator=info",
        1 => "linkcurator=debug",
        _ => "linkcurator=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let rules = resolve_rules(cli.rules.as_deref())?;

    match cli.command {
        Command::FixTerms { dir, dry_run } => cmd_fix_terms(&dir, &rules, dry_run),
        Command::AuditTerms { dir, dry_run } => cmd_audit_terms(&dir, &rules, dry_run),
        Command::CheckWiki {
            dir,
            dry_run,
            delay_ms,
        } => cmd_check_wiki(&dir, &rules, dry_run, delay_ms).await,
        Command::ValidateResources {
            dir,
            dry_run,
            delay_ms,
        } => cmd_validate_resources(&dir, &rules, dry_run, delay_ms).await,
        Command::Rules { action } => match action {
            RulesAction::Init { path } => cmd_rules_init(&path),
            RulesAction::Show => cmd_rules_show(&rules),
        },
    }
}

/// Load the rule set from an explicit path, or fall back to the default
/// lookup (./rules.toml, then built-in rules).
fn resolve_rules(path: Option<&Path>) -> Result<RuleSet> {
    let rules = match path {
        Some(p) => load_rules_from(p)?,
        None => load_rules()?,
    };
    Ok(rules)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_fix_terms(dir: &Path, rules: &RuleSet, dry_run: bool) -> Result<()> {
    let summary = linkcurator_core::fix_terms(dir, rules, dry_run)?;
    print_summary(&summary);
    Ok(())
}

fn cmd_audit_terms(dir: &Path, rules: &RuleSet, dry_run: bool) -> Result<()> {
    let summary = linkcurator_core::audit_terms(dir, rules, dry_run)?;
    print_summary(&summary);
    Ok(())
}

async fn cmd_check_wiki(dir: &Path, rules: &RuleSet, dry_run: bool, delay_ms: u64) -> Result<()> {
    let checker = LinkChecker::new(rules.checker.clone())?;
    let opts = CheckOptions {
        dry_run,
        courtesy_delay_ms: delay_ms,
    };

    let progress = BarProgress::new();
    let summary = linkcurator_core::check_wiki(dir, rules, &checker, &opts, &progress).await?;
    progress.finish();

    print_summary(&summary);
    Ok(())
}

async fn cmd_validate_resources(
    dir: &Path,
    rules: &RuleSet,
    dry_run: bool,
    delay_ms: u64,
) -> Result<()> {
    let checker = LinkChecker::new(rules.checker.clone())?;
    let opts = CheckOptions {
        dry_run,
        courtesy_delay_ms: delay_ms,
    };

    let progress = BarProgress::new();
    let summary =
        linkcurator_core::validate_resources(dir, &checker, &opts, &progress).await?;
    progress.finish();

    print_summary(&summary);
    Ok(())
}

fn cmd_rules_init(path: &Path) -> Result<()> {
    linkcurator_shared::init_rules(path)?;
    info!(path = %path.display(), "default rules written");
    println!("Wrote default rules to {}", path.display());
    Ok(())
}

fn cmd_rules_show(rules: &RuleSet) -> Result<()> {
    println!("{}", toml::to_string_pretty(rules)?);
    Ok(())
}

/// Print per-file reports followed by the aggregate summary.
fn print_summary(summary: &RunSummary) {
    for report in &summary.reports {
        println!("{report}");
    }
    println!("{summary}");
}

// ---------------------------------------------------------------------------
// Progress bar
// ---------------------------------------------------------------------------

/// Spinner-based progress for the online passes.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarProgress {
    fn file_started(&self, name: &str, current: usize, total: usize) {
        self.bar.set_message(format!("[{current}/{total}] {name}"));
    }

    fn link_checked(&self, url: &str, live: bool) {
        self.bar.tick();
        if !live {
            self.bar.println(format!("  dead: {url}"));
        }
    }
}
