//! HTTP link liveness checking.
//!
//! A [`LinkChecker`] probes a URL with a lightweight HEAD request (falling
//! back to GET where HEAD is refused), follows redirects, and classifies
//! the outcome. Network failures are retried a bounded number of times
//! with a fixed delay before the URL is declared dead. The checker never
//! errors outward: every probe folds into a [`Verdict`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use linkcurator_shared::{CheckerConfig, LinkCuratorError, Result};

/// User-Agent string sent with every probe.
const USER_AGENT: &str = concat!("linkcurator/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Classification of a probed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// 2xx/3xx — the page is reachable.
    Live,
    /// 404 (or a recognized "article does not exist" body) — the page is gone.
    NotFound,
    /// 403, or a host on the skip list. Presumed live: removing entries on
    /// a rate-limited response would throw away good links.
    Indeterminate,
    /// Hard error status, unsupported scheme, or retries exhausted.
    Dead,
}

/// Liveness verdict with an optional diagnostic reason.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub status: LinkStatus,
    pub reason: Option<String>,
}

impl Verdict {
    /// Whether the entry should be kept. `Indeterminate` counts as live.
    pub fn is_live(&self) -> bool {
        matches!(self.status, LinkStatus::Live | LinkStatus::Indeterminate)
    }

    fn live() -> Self {
        Self {
            status: LinkStatus::Live,
            reason: None,
        }
    }

    fn not_found(reason: impl Into<String>) -> Self {
        Self {
            status: LinkStatus::NotFound,
            reason: Some(reason.into()),
        }
    }

    fn indeterminate(reason: impl Into<String>) -> Self {
        Self {
            status: LinkStatus::Indeterminate,
            reason: Some(reason.into()),
        }
    }

    fn dead(reason: impl Into<String>) -> Self {
        Self {
            status: LinkStatus::Dead,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// LinkChecker
// ---------------------------------------------------------------------------

/// Probes URLs and classifies their liveness.
pub struct LinkChecker {
    client: Client,
    config: CheckerConfig,
}

impl LinkChecker {
    /// Create a checker with the given configuration.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LinkCuratorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Probe a single URL and classify it.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn check(&self, url: &str) -> Verdict {
        let Ok(parsed) = Url::parse(url) else {
            return Verdict::dead("unparseable URL");
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Verdict::dead("unsupported URL scheme");
        }

        if let Some(host) = parsed.host_str() {
            if self.config.skip_hosts.iter().any(|h| h == host) {
                debug!(host, "host on skip list, presumed live");
                return Verdict::indeterminate(format!("host {host} on skip list"));
            }
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.probe(url).await {
                Ok(verdict) => {
                    debug!(status = ?verdict.status, attempt, "probe classified");
                    return verdict;
                }
                Err(e) => {
                    let reason = classify_error(&e);
                    if attempt < self.config.max_retries.max(1) {
                        debug!(error = %e, attempt, "probe failed, retrying");
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                        continue;
                    }
                    return Verdict::dead(format!("{reason} after {attempt} attempt(s)"));
                }
            }
        }
    }

    /// One HEAD probe, with a GET fallback for statuses HEAD cannot settle.
    async fn probe(&self, url: &str) -> reqwest::Result<Verdict> {
        let response = self.client.head(url).send().await?;
        let status = response.status();

        if status.is_success() || status.is_redirection() {
            return Ok(Verdict::live());
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(Verdict::not_found("404 Not Found"));
        }
        if status == StatusCode::FORBIDDEN {
            return Ok(Verdict::indeterminate("403 Forbidden (presumed live)"));
        }

        // Some hosts refuse HEAD (405) or misreport other statuses; settle
        // with a GET before declaring the link dead.
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() || status.is_redirection() {
            if !self.config.gone_markers.is_empty() {
                let body = response.text().await?.to_lowercase();
                for marker in &self.config.gone_markers {
                    if body.contains(&marker.to_lowercase()) {
                        return Ok(Verdict::not_found(format!("page body says: {marker}")));
                    }
                }
            }
            return Ok(Verdict::live());
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(Verdict::not_found("404 Not Found"));
        }
        if status == StatusCode::FORBIDDEN {
            return Ok(Verdict::indeterminate("403 Forbidden (presumed live)"));
        }

        Ok(Verdict::dead(format!("HTTP {status}")))
    }
}

/// Map a reqwest error to a short diagnostic category.
fn classify_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection error"
    } else if e.is_redirect() {
        "too many redirects"
    } else {
        "request error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> CheckerConfig {
        CheckerConfig {
            timeout_secs: 5,
            max_retries: 2,
            retry_delay_ms: 0,
            skip_hosts: Vec::new(),
            gone_markers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn ok_is_live() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/page", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::Live);
        assert!(verdict.is_live());
    }

    #[tokio::test]
    async fn not_found_is_dead_link() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/missing", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::NotFound);
        assert!(!verdict.is_live());
        assert_eq!(verdict.reason.as_deref(), Some("404 Not Found"));
    }

    #[tokio::test]
    async fn forbidden_is_presumed_live() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/guarded"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/guarded", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::Indeterminate);
        assert!(verdict.is_live());
    }

    #[tokio::test]
    async fn head_refused_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>fine</html>"))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/no-head", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::Live);
    }

    #[tokio::test]
    async fn gone_marker_in_body_means_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ghost"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ghost"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>Tento článek neexistuje.</html>"),
            )
            .mount(&server)
            .await;

        let mut config = test_config();
        config.gone_markers = vec!["tento článek neexistuje".into()];

        let checker = LinkChecker::new(config).unwrap();
        let verdict = checker.check(&format!("{}/ghost", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::NotFound);
    }

    #[tokio::test]
    async fn server_error_is_dead() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/broken", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::Dead);
        assert!(verdict.reason.as_deref().unwrap_or("").contains("500"));
    }

    #[tokio::test]
    async fn redirect_is_followed_to_live_target() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&format!("{}/old", server.uri())).await;
        assert_eq!(verdict.status, LinkStatus::Live);
    }

    #[tokio::test]
    async fn connection_failure_exhausts_retries() {
        // Bind a listener just to grab a free port, then shut it down.
        // (A dropped wiremock server returns to a pool and keeps listening,
        // so it cannot be used to produce a connection failure.)
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let dead_uri = format!("http://127.0.0.1:{port}/unreachable");
        drop(listener);

        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check(&dead_uri).await;
        assert_eq!(verdict.status, LinkStatus::Dead);
        assert!(verdict.reason.as_deref().unwrap_or("").contains("attempt"));
    }

    #[tokio::test]
    async fn skip_list_host_is_presumed_live() {
        let mut config = test_config();
        config.skip_hosts = vec!["en.wikipedia.org".into()];

        let checker = LinkChecker::new(config).unwrap();
        // No request is issued; an unroutable host on the list still passes.
        let verdict = checker.check("https://en.wikipedia.org/wiki/Ballet").await;
        assert_eq!(verdict.status, LinkStatus::Indeterminate);
        assert!(verdict.is_live());
    }

    #[tokio::test]
    async fn unsupported_scheme_is_dead() {
        let checker = LinkChecker::new(test_config()).unwrap();
        let verdict = checker.check("ftp://archive.example.com/file").await;
        assert_eq!(verdict.status, LinkStatus::Dead);
        assert_eq!(verdict.reason.as_deref(), Some("unsupported URL scheme"));
    }
}
