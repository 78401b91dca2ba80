//! MediaWiki Action API client.
//!
//! Two read calls are used: the `categorymembers` listing (paginated through
//! opaque continuation parameters) and `parse` for rendered article HTML.
//! [`WikiApi`] is the seam the rest of the workspace programs against, so the
//! pipeline can run against [`MediaWikiClient`] or an in-memory fake.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use wikicorpus_shared::{CorpusError, HarvestConfig, Result};

use crate::retry::retry_with_backoff;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("wikicorpus/", env!("CARGO_PKG_VERSION"));

/// Maximum number of HTTP redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Namespace ids of the MediaWiki core namespaces we classify by.
const NS_ARTICLE: i64 = 0;
const NS_FILE: i64 = 6;
const NS_CATEGORY: i64 = 14;

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// What a category member is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A page in the main (article) namespace.
    Article,
    /// A nested category. Never recursed into.
    Subcategory,
    /// A media file description page.
    File,
    /// A page outside the article namespace (portal, template, user page, ...).
    OtherPage,
}

/// One entry of a membership listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Page title, the remote key.
    pub id: String,
    /// Member classification.
    pub kind: MemberKind,
}

impl Member {
    pub fn article(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MemberKind::Article,
        }
    }

    pub fn subcategory(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MemberKind::Subcategory,
        }
    }

    pub fn file(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MemberKind::File,
        }
    }
}

/// Opaque continuation token of a paginated listing.
///
/// Holds the continuation parameters exactly as the service returned them;
/// they are echoed back verbatim on the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationCursor {
    params: BTreeMap<String, String>,
}

impl ContinuationCursor {
    /// Build a cursor from raw continuation parameters.
    pub fn from_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a single continuation parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All continuation parameters, to be appended to the next request.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One page of a membership listing.
#[derive(Debug, Clone, Default)]
pub struct MemberPage {
    /// Members in listing order.
    pub members: Vec<Member>,
    /// Cursor for the next page, `None` at end of data.
    pub next: Option<ContinuationCursor>,
}

/// Rendered article as returned by the content call.
#[derive(Debug, Clone)]
pub struct ArticlePage {
    /// Canonical title after redirects.
    pub title: String,
    /// Rendered body HTML.
    pub html: String,
    /// The page is a disambiguation page.
    pub disambiguation: bool,
}

// ---------------------------------------------------------------------------
// WikiApi
// ---------------------------------------------------------------------------

/// The remote encyclopedia's read API.
pub trait WikiApi: Send + Sync {
    /// List one page of the direct members of `category`.
    fn list_members(
        &self,
        category: &str,
        cursor: Option<&ContinuationCursor>,
    ) -> impl Future<Output = Result<MemberPage>> + Send;

    /// Fetch the rendered body of one article.
    ///
    /// Fails with [`CorpusError::NotFound`] if the page does not exist.
    fn fetch_article(&self, title: &str) -> impl Future<Output = Result<ArticlePage>> + Send;
}

// ---------------------------------------------------------------------------
// MediaWikiClient
// ---------------------------------------------------------------------------

/// HTTP implementation of [`WikiApi`] against `api.php`.
pub struct MediaWikiClient {
    client: Client,
    api_url: Url,
    rate_limit: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    /// Earliest instant the next request may be sent.
    next_slot: Mutex<Instant>,
}

impl MediaWikiClient {
    /// Create a client for the endpoint and limits in `config`.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let api_url_str = config.api_url();
        let api_url = Url::parse(&api_url_str)
            .map_err(|e| CorpusError::config(format!("invalid API URL '{api_url_str}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CorpusError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url,
            rate_limit: Duration::from_millis(config.rate_limit_ms),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            next_slot: Mutex::new(Instant::now()),
        })
    }

    /// The resolved API endpoint.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Wait until the rate limit allows another request.
    async fn throttle(&self) {
        if self.rate_limit.is_zero() {
            return;
        }
        let wait = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let start = (*next).max(now);
            *next = start + self.rate_limit;
            start - now
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// GET `api.php` with the given parameters, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, unit: &str, params: &[(&str, &str)]) -> Result<T> {
        retry_with_backoff(unit, self.max_retries, self.retry_backoff, || {
            self.get_json_once(unit, params)
        })
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        unit: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.throttle().await;

        let response = self
            .client
            .get(self.api_url.clone())
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| transport_error(unit, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(unit, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(unit, &e))?;

        // API errors arrive with HTTP 200; classify them inside the retried attempt.
        let envelope: ErrorEnvelope = serde_json::from_str(&body)
            .map_err(|e| CorpusError::parse(format!("{unit}: malformed API response: {e}")))?;
        if let Some(err) = envelope.error {
            return Err(api_error(unit, err));
        }

        serde_json::from_str(&body)
            .map_err(|e| CorpusError::parse(format!("{unit}: malformed API response: {e}")))
    }
}

impl WikiApi for MediaWikiClient {
    #[instrument(skip(self, cursor), fields(continued = cursor.is_some()))]
    async fn list_members(
        &self,
        category: &str,
        cursor: Option<&ContinuationCursor>,
    ) -> Result<MemberPage> {
        let mut params: Vec<(&str, &str)> = vec![
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", category),
            ("cmprop", "ids|title|type"),
            ("cmlimit", "max"),
        ];
        if let Some(cursor) = cursor {
            params.extend(cursor.params());
        }

        let response: MembersResponse = self.get_json(category, &params).await?;

        let members: Vec<Member> = response
            .query
            .map(|q| q.categorymembers)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Member {
                kind: classify(raw.ns, raw.kind.as_deref()),
                id: raw.title,
            })
            .collect();

        let next = response
            .continuation
            .filter(|params| !params.is_empty())
            .map(ContinuationCursor::from_params);

        debug!(
            members = members.len(),
            has_next = next.is_some(),
            "membership page received"
        );

        Ok(MemberPage { members, next })
    }

    #[instrument(skip(self))]
    async fn fetch_article(&self, title: &str) -> Result<ArticlePage> {
        let params = [
            ("action", "parse"),
            ("page", title),
            ("prop", "text|properties"),
            ("redirects", "1"),
            ("disableeditsection", "1"),
            ("disablelimitreport", "1"),
        ];

        let response: ParseResponse = self.get_json(title, &params).await?;

        let parsed = response
            .parse
            .ok_or_else(|| CorpusError::parse(format!("{title}: response has no 'parse' object")))?;

        Ok(ArticlePage {
            disambiguation: is_disambiguation(&parsed.properties),
            title: parsed.title,
            html: parsed.text,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default, rename = "continue")]
    continuation: Option<BTreeMap<String, String>>,
    #[serde(default)]
    query: Option<MembersQuery>,
}

#[derive(Debug, Deserialize)]
struct MembersQuery {
    #[serde(default)]
    categorymembers: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    ns: i64,
    title: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    properties: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Classify a listing entry by its reported type, falling back to the namespace.
fn classify(ns: i64, kind: Option<&str>) -> MemberKind {
    match kind {
        Some("subcat") => MemberKind::Subcategory,
        Some("file") => MemberKind::File,
        Some("page") | None => match ns {
            NS_ARTICLE => MemberKind::Article,
            NS_CATEGORY => MemberKind::Subcategory,
            NS_FILE => MemberKind::File,
            _ => MemberKind::OtherPage,
        },
        Some(_) => MemberKind::OtherPage,
    }
}

/// `properties` is an object in formatversion 2 and a list of `{name, *}` in 1.
fn is_disambiguation(properties: &serde_json::Value) -> bool {
    match properties {
        serde_json::Value::Object(map) => map.contains_key("disambiguation"),
        serde_json::Value::Array(items) => items
            .iter()
            .any(|p| p.get("name").and_then(|n| n.as_str()) == Some("disambiguation")),
        _ => false,
    }
}

fn api_error(unit: &str, err: ApiError) -> CorpusError {
    match err.code.as_str() {
        "missingtitle" | "invalidtitle" | "nosuchpageid" | "pagecannotexist" => {
            CorpusError::not_found(unit)
        }
        "ratelimited" | "maxlag" | "readonly" => {
            CorpusError::Transient(format!("{unit}: {}: {}", err.code, err.info))
        }
        code if code.starts_with("internal_api_error") => {
            CorpusError::Transient(format!("{unit}: {}: {}", err.code, err.info))
        }
        _ => CorpusError::parse(format!("{unit}: API error {}: {}", err.code, err.info)),
    }
}

fn status_error(unit: &str, status: StatusCode) -> CorpusError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        CorpusError::Transient(format!("{unit}: HTTP {status}"))
    } else {
        CorpusError::parse(format!("{unit}: unexpected HTTP {status}"))
    }
}

fn transport_error(unit: &str, e: &reqwest::Error) -> CorpusError {
    if e.is_timeout() {
        CorpusError::Transient(format!("{unit}: request timed out"))
    } else {
        CorpusError::Transient(format!("{unit}: {e}"))
    }
}
