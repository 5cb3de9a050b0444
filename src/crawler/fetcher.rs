//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with timeouts
//! - Following redirects hop by hop, refusing hops off the crawl's host scope
//! - Politeness delays before every attempt
//! - Rotating browser identity headers across attempts
//! - Retry with exponential backoff for transient failures
//! - Error classification (transient, permanent, cancelled)
//!
//! A fetch never returns `Err`: exhausted or permanent failures come back as
//! `FetchOutcome::Failed` so the coordinator can store a placeholder record.

use crate::config::{CrawlerConfig, FetcherConfig};
use crate::crawler::backoff::{jittered_delay, ExponentialBackoff};
use crate::crawler::cancel::CancelSignal;
use crate::crawler::events::{CrawlEvent, EventBus};
use crate::url::same_host;
use crate::ConfigError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// How a failed fetch should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retries were exhausted on network/timeout/HTTP-status errors
    Transient,
    /// Retrying cannot help (bad URL, non-HTML body, undecodable body)
    Permanent,
    /// The run was cancelled before the page could be fetched
    Cancelled,
}

/// A page body retrieved from the network
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL the body was served from, after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

/// A failed fetch, carrying the URL and the last error seen
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
    pub kind: FailureKind,
    /// Number of requests actually sent
    pub attempts: u32,
    /// Status of the last response, if one was received
    pub status_code: Option<u16>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Transient => write!(
                f,
                "Failed to scrape after {} attempts: {}",
                self.attempts, self.error
            ),
            FailureKind::Permanent => write!(f, "Failed to scrape: {}", self.error),
            FailureKind::Cancelled => write!(f, "Crawl cancelled: {}", self.error),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(RawPage),
    Failed(FetchFailure),
}

/// Error from a single attempt
#[derive(Debug)]
enum AttemptError {
    Transient {
        error: String,
        status_code: Option<u16>,
    },
    Permanent {
        error: String,
        status_code: Option<u16>,
    },
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is set per request by the fetcher, so the client carries
/// none of its own. Redirects are not followed by the client; the fetcher
/// follows them itself so every hop can be checked.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves pages with politeness delays, identity rotation and retry
pub struct Fetcher {
    client: Client,
    user_agents: Vec<HeaderValue>,
    next_agent: AtomicUsize,
    politeness_min_ms: u64,
    politeness_max_ms: u64,
    per_domain_delay: Duration,
    retry_count: u32,
    backoff: ExponentialBackoff,
    events: EventBus,
    /// When set, redirects may only land on this URL's host
    host_scope: Option<Url>,
}

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

impl Fetcher {
    /// Creates a fetcher from the crawler and fetcher configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(ConfigError)` - A configured User-Agent is not a valid header value
    pub fn new(
        crawler: &CrawlerConfig,
        config: &FetcherConfig,
        client: Client,
        events: EventBus,
    ) -> Result<Self, ConfigError> {
        let user_agents = config
            .user_agents
            .iter()
            .map(|ua| {
                HeaderValue::from_str(ua).map_err(|_| {
                    ConfigError::Validation(format!("invalid user agent header value: {:?}", ua))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if user_agents.is_empty() {
            return Err(ConfigError::Validation(
                "user_agents must contain at least one entry".to_string(),
            ));
        }

        Ok(Self {
            client,
            user_agents,
            next_agent: AtomicUsize::new(0),
            politeness_min_ms: config.politeness_min_ms,
            politeness_max_ms: config.politeness_max_ms,
            per_domain_delay: Duration::from_millis(crawler.per_domain_delay),
            retry_count: crawler.retry_count,
            backoff: ExponentialBackoff::new(config.backoff_base_ms, config.backoff_max_ms),
            events,
            host_scope: None,
        })
    }

    /// Restricts redirect targets to the host of `start_url`
    pub fn with_host_scope(mut self, start_url: Url) -> Self {
        self.host_scope = Some(start_url);
        self
    }

    /// Total attempts made before giving up on a transient failure
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 4xx/5xx | Retry with backoff |
    /// | Timeout / connection error | Retry with backoff |
    /// | Unsupported scheme / request build error | Immediate failure |
    /// | Non-HTML Content-Type | Immediate failure |
    /// | Body cannot be decoded | Immediate failure |
    /// | Cancellation observed | Immediate failure (cancelled) |
    ///
    /// Before every attempt the fetcher waits a random politeness delay plus
    /// the configured per-domain delay and picks the next identity header.
    pub async fn fetch(&self, url: &Url, cancel: &CancelSignal) -> FetchOutcome {
        if url.scheme() != "http" && url.scheme() != "https" {
            return FetchOutcome::Failed(FetchFailure {
                url: url.to_string(),
                error: format!("unsupported scheme: {}", url.scheme()),
                kind: FailureKind::Permanent,
                attempts: 0,
                status_code: None,
            });
        }

        let max_attempts = self.max_attempts();
        let mut last_error = String::new();
        let mut last_status = None;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            let delay = self.politeness_delay();
            if !cancel.sleep(delay).await {
                return cancelled(url, attempts, last_status);
            }

            let user_agent = self.next_user_agent();
            attempts = attempt;

            match self.attempt(url, user_agent).await {
                Ok(page) => return FetchOutcome::Fetched(page),
                Err(AttemptError::Permanent { error, status_code }) => {
                    return FetchOutcome::Failed(FetchFailure {
                        url: url.to_string(),
                        error,
                        kind: FailureKind::Permanent,
                        attempts,
                        status_code,
                    });
                }
                Err(AttemptError::Transient { error, status_code }) => {
                    last_error = error;
                    last_status = status_code;

                    if attempt < max_attempts {
                        let wait = self.backoff.delay(attempt - 1);
                        self.events.emit(CrawlEvent::RetryScheduled {
                            url: url.to_string(),
                            attempt,
                            max_attempts,
                            error: last_error.clone(),
                            delay: wait,
                        });

                        if !cancel.sleep(wait).await {
                            return cancelled(url, attempts, last_status);
                        }
                    }
                }
            }
        }

        tracing::warn!("All {} attempts failed for {}", attempts, url);

        FetchOutcome::Failed(FetchFailure {
            url: url.to_string(),
            error: last_error,
            kind: FailureKind::Transient,
            attempts,
            status_code: last_status,
        })
    }

    /// Performs a single GET request
    async fn attempt(&self, url: &Url, user_agent: HeaderValue) -> Result<RawPage, AttemptError> {
        let response = self.follow_redirects(url, user_agent).await?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(AttemptError::Transient {
                error: format!("HTTP {}", status.as_u16()),
                status_code: Some(status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(AttemptError::Permanent {
                error: format!("expected HTML, got {}", content_type),
                status_code: Some(status.as_u16()),
            });
        }

        match response.text().await {
            Ok(body) => Ok(RawPage {
                final_url,
                status_code: status.as_u16(),
                body,
            }),
            Err(e) if e.is_decode() => Err(AttemptError::Permanent {
                error: format!("malformed response body: {}", e),
                status_code: Some(status.as_u16()),
            }),
            Err(e) => Err(AttemptError::Transient {
                error: e.to_string(),
                status_code: Some(status.as_u16()),
            }),
        }
    }

    /// Sends the request and follows redirects one hop at a time
    ///
    /// Every hop must stay on HTTP(S) and, when a host scope is set, on the
    /// scoped host. A hop that leaves the scope, a loop, or a chain longer
    /// than `MAX_REDIRECTS` is a permanent failure, and nothing is sent to
    /// the offending target.
    async fn follow_redirects(
        &self,
        url: &Url,
        user_agent: HeaderValue,
    ) -> Result<reqwest::Response, AttemptError> {
        let mut current = url.clone();
        let mut seen = vec![current.clone()];

        loop {
            let response = self
                .client
                .get(current.clone())
                .headers(identity_headers(user_agent.clone()))
                .send()
                .await
                .map_err(classify_request_error)?;

            let status = response.status();
            if !status.is_redirection() {
                return Ok(response);
            }

            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok());
            let Some(location) = location else {
                // A redirect without a target is served as-is
                return Ok(response);
            };

            let next = current.join(location.trim()).map_err(|e| AttemptError::Permanent {
                error: format!("invalid redirect target '{}': {}", location, e),
                status_code: Some(status.as_u16()),
            })?;

            if let Some(error) = self.check_redirect(&next, &seen) {
                return Err(AttemptError::Permanent {
                    error,
                    status_code: Some(status.as_u16()),
                });
            }

            tracing::debug!("Following redirect {} -> {}", current, next);
            seen.push(next.clone());
            current = next;
        }
    }

    /// Returns why a redirect to `next` must not be followed, if it must not
    fn check_redirect(&self, next: &Url, seen: &[Url]) -> Option<String> {
        if next.scheme() != "http" && next.scheme() != "https" {
            return Some(format!("redirected to unsupported scheme: {}", next));
        }
        if let Some(scope) = &self.host_scope {
            if !same_host(next, scope) {
                return Some(format!("redirected off-host to {}", next));
            }
        }
        if seen.contains(next) {
            return Some(format!("redirect loop at {}", next));
        }
        if seen.len() > MAX_REDIRECTS {
            return Some(format!("more than {} redirects", MAX_REDIRECTS));
        }
        None
    }

    /// Random politeness window plus the fixed per-domain delay
    fn politeness_delay(&self) -> Duration {
        jittered_delay(self.politeness_min_ms, self.politeness_max_ms) + self.per_domain_delay
    }

    /// Round-robin over the configured identities
    fn next_user_agent(&self) -> HeaderValue {
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        self.user_agents[index].clone()
    }
}

fn cancelled(url: &Url, attempts: u32, status_code: Option<u16>) -> FetchOutcome {
    FetchOutcome::Failed(FetchFailure {
        url: url.to_string(),
        error: "stopped before the page could be fetched".to_string(),
        kind: FailureKind::Cancelled,
        attempts,
        status_code,
    })
}

/// Maps a reqwest send error onto the retry taxonomy
fn classify_request_error(e: reqwest::Error) -> AttemptError {
    if e.is_builder() {
        AttemptError::Permanent {
            error: format!("invalid request: {}", e),
            status_code: None,
        }
    } else if e.is_timeout() {
        AttemptError::Transient {
            error: "Request timeout".to_string(),
            status_code: None,
        }
    } else if e.is_connect() {
        AttemptError::Transient {
            error: "Connection failed".to_string(),
            status_code: None,
        }
    } else {
        AttemptError::Transient {
            error: e.to_string(),
            status_code: e.status().map(|s| s.as_u16()),
        }
    }
}

/// Browser-like request headers around the given User-Agent
fn identity_headers(user_agent: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, user_agent);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://www.google.com/"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}
