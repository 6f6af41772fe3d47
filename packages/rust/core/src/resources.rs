//! Resource-file validation (`data/resources/*.json`).
//!
//! One sequential sweep: every resource URL is probed, and resources whose
//! URL is classified not-live are pruned. Retained resources keep their
//! position and every field; resources without a URL are kept and flagged.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use linkcurator_linkcheck::LinkChecker;
use linkcurator_shared::{Change, ChangeKind, Issue, ResourceFile, Result};

use crate::io::{file_name, list_json_files, read_json, write_json};
use crate::report::{FileReport, RunSummary};
use crate::terms::{CheckOptions, ProgressReporter};

/// Default delay between resource checks, in milliseconds. External hosts
/// are less tolerant than Wikipedia, so the sweep is slower here.
pub const RESOURCE_CHECK_DELAY_MS: u64 = 500;

/// Probe every resource URL in `dir` and remove the entries that are dead.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn validate_resources(
    dir: &Path,
    checker: &LinkChecker,
    opts: &CheckOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    let files = list_json_files(dir)?;
    let total = files.len();
    info!(files = total, "validating resource files");

    for (index, path) in files.iter().enumerate() {
        let name = file_name(path);
        progress.file_started(&name, index + 1, total);
        let mut report = FileReport::new(path.clone());

        let mut file: ResourceFile = match read_json(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable file, skipping");
                summary.skip();
                continue;
            }
        };
        let Some(sections) = file.sections.take() else {
            warn!(file = %name, "no 'sections' key found, skipping");
            summary.skip();
            continue;
        };

        let mut rebuilt_sections = Vec::with_capacity(sections.len());

        for mut section in sections {
            let Some(resources) = section.resources.take() else {
                rebuilt_sections.push(section);
                continue;
            };

            let mut kept = Vec::with_capacity(resources.len());

            for resource in resources {
                let title = resource.title.clone().unwrap_or_else(|| "Unknown".into());
                let Some(url) = resource.url.clone().filter(|u| !u.is_empty()) else {
                    report.issues.push(Issue {
                        term: title,
                        url: String::new(),
                        note: "resource has no URL, kept as-is".into(),
                    });
                    kept.push(resource);
                    continue;
                };

                let verdict = checker.check(&url).await;
                report.checked += 1;
                progress.link_checked(&url, verdict.is_live());

                if verdict.is_live() {
                    kept.push(resource);
                } else {
                    report.changes.push(Change {
                        kind: ChangeKind::Removal,
                        term: title,
                        old_url: url,
                        new_url: None,
                    });
                }

                if opts.courtesy_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(opts.courtesy_delay_ms)).await;
                }
            }

            section.resources = Some(kept);
            rebuilt_sections.push(section);
        }

        if report.changed() && !opts.dry_run {
            file.sections = Some(rebuilt_sections);
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
        links_removed = summary.total_removed,
        "validate-resources pass complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::SilentProgress;
    use linkcurator_shared::CheckerConfig;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_corpus(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("linkcurator-resources-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp dir");
        for (file, content) in files {
            std::fs::write(dir.join(file), content).expect("write fixture");
        }
        dir
    }

    fn test_checker() -> LinkChecker {
        LinkChecker::new(CheckerConfig {
            retry_delay_ms: 0,
            max_retries: 1,
            ..CheckerConfig::default()
        })
        .unwrap()
    }

    fn no_delay() -> CheckOptions {
        CheckOptions {
            dry_run: false,
            courtesy_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn removes_exactly_the_dead_resources_in_order() {
        let server = MockServer::start().await;
        for (p, status) in [("/a", 200), ("/b", 404), ("/c", 200)] {
            Mock::given(method("HEAD"))
                .and(url_path(p))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }

        let dir = temp_corpus(
            "prune",
            &[(
                "ballet.json",
                &format!(
                    r#"{{"sections": [{{"heading": "Video", "resources": [
                        {{"title": "A", "url": "{0}/a", "language": "cs"}},
                        {{"title": "B", "url": "{0}/b"}},
                        {{"title": "C", "url": "{0}/c"}}
                    ]}}]}}"#,
                    server.uri()
                ),
            )],
        );

        let summary = validate_resources(&dir, &test_checker(), &no_delay(), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.total_checked, 3);
        assert_eq!(summary.total_removed, 1);
        assert_eq!(summary.files_written, 1);

        let on_disk: ResourceFile = read_json(&dir.join("ballet.json")).unwrap();
        let sections = on_disk.sections.unwrap();
        let resources = sections[0].resources.as_ref().unwrap();
        let titles: Vec<&str> = resources.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        // Extra fields of retained resources survive.
        assert_eq!(
            resources[0].extra.get("language"),
            Some(&serde_json::Value::from("cs"))
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn forbidden_resources_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(url_path("/guarded"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = temp_corpus(
            "forbidden",
            &[(
                "archives.json",
                &format!(
                    r#"{{"sections": [{{"heading": "Archives", "resources": [
                        {{"title": "Guarded", "url": "{}/guarded"}}
                    ]}}]}}"#,
                    server.uri()
                ),
            )],
        );

        let summary = validate_resources(&dir, &test_checker(), &no_delay(), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.total_removed, 0);
        assert_eq!(summary.files_written, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn url_less_resources_are_kept_and_flagged() {
        let dir = temp_corpus(
            "nourl",
            &[(
                "books.json",
                r#"{"sections": [{"heading": "Books", "resources": [
                    {"title": "Print-only monograph"}
                ]}]}"#,
            )],
        );

        let summary = validate_resources(&dir, &test_checker(), &no_delay(), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.total_checked, 0);
        assert_eq!(summary.total_issues, 1);
        assert_eq!(summary.total_removed, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn files_without_sections_pass_through() {
        let original = r#"{"title": "not a resource file"}"#;
        let dir = temp_corpus("nosections", &[("odd.json", original)]);

        let summary = validate_resources(&dir, &test_checker(), &no_delay(), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.files_skipped, 1);
        let content = std::fs::read_to_string(dir.join("odd.json")).unwrap();
        assert_eq!(content, original);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unwritable_file_is_skipped_and_sweep_continues() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(url_path("/dead"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let body = format!(
            r#"{{"sections": [{{"heading": "X", "resources": [{{"title": "Dead", "url": "{}/dead"}}]}}]}}"#,
            server.uri()
        );
        let dir = temp_corpus("rofile", &[("a.json", &body), ("b.json", &body)]);

        let locked = dir.join("a.json");
        let mut perms = std::fs::metadata(&locked).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&locked, perms).unwrap();
        // Privileged users bypass permission bits; nothing to observe then.
        if std::fs::OpenOptions::new().write(true).open(&locked).is_ok() {
            let _ = std::fs::remove_dir_all(&dir);
            return;
        }

        let summary = validate_resources(&dir, &test_checker(), &no_delay(), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_written, 1);

        let on_disk: ResourceFile = read_json(&dir.join("b.json")).unwrap();
        let sections = on_disk.sections.unwrap();
        assert!(sections[0].resources.as_ref().unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn dry_run_reports_but_does_not_write() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(url_path("/dead"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let original = format!(
            r#"{{"sections": [{{"heading": "X", "resources": [{{"title": "Dead", "url": "{}/dead"}}]}}]}}"#,
            server.uri()
        );
        let dir = temp_corpus("dryrun", &[("x.json", &original)]);

        let opts = CheckOptions {
            dry_run: true,
            courtesy_delay_ms: 0,
        };
        let summary = validate_resources(&dir, &test_checker(), &opts, &SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.total_removed, 1);
        assert_eq!(summary.files_written, 0);
        let content = std::fs::read_to_string(dir.join("x.json")).unwrap();
        assert_eq!(content, original);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
