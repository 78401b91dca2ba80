//! In-memory [`WikiApi`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use wikicorpus_shared::{CorpusError, Result};

use crate::client::{ArticlePage, ContinuationCursor, Member, MemberPage, WikiApi};

const CURSOR_KEY: &str = "cmcontinue";

#[derive(Debug, Clone)]
enum FakeArticle {
    Html(String),
    Disambiguation,
}

/// Scripted encyclopedia.
///
/// Each category is a list of pages; the continuation cursor is the index of
/// the next page. Unknown categories list as empty, unknown articles are
/// [`CorpusError::NotFound`].
#[derive(Debug, Default)]
pub struct FakeWiki {
    categories: HashMap<String, Vec<Vec<Member>>>,
    articles: HashMap<String, FakeArticle>,
    redirects: HashMap<String, String>,
    failing_pages: HashMap<String, usize>,
    failing_articles: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category listed in the given pages.
    pub fn with_category(mut self, category: &str, pages: Vec<Vec<Member>>) -> Self {
        self.categories.insert(category.to_string(), pages);
        self
    }

    /// Register an article whose body is a single paragraph of `text`.
    pub fn with_article(self, title: &str, text: &str) -> Self {
        let html = format!(
            "<div class=\"mw-parser-output\"><p>{}</p></div>",
            escape_html(text)
        );
        self.with_article_html(title, &html)
    }

    /// Register an article with a raw HTML body.
    pub fn with_article_html(mut self, title: &str, html: &str) -> Self {
        self.articles
            .insert(title.to_string(), FakeArticle::Html(html.to_string()));
        self
    }

    /// Register a disambiguation page.
    pub fn with_disambiguation(mut self, title: &str) -> Self {
        self.articles
            .insert(title.to_string(), FakeArticle::Disambiguation);
        self
    }

    /// Fetching `from` follows a redirect and serves `to`.
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Listing page `page` of `category` fails with a transient error.
    pub fn failing_page(mut self, category: &str, page: usize) -> Self {
        self.failing_pages.insert(category.to_string(), page);
        self
    }

    /// Fetching `title` fails with a transient error.
    pub fn failing_article(mut self, title: &str) -> Self {
        self.failing_articles.insert(title.to_string());
        self
    }

    /// Requests served so far, as `members:<category>:<page>` or `article:<title>`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of article fetches served so far.
    pub fn article_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with("article:"))
            .count()
    }

    fn record(&self, request: String) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

impl WikiApi for FakeWiki {
    async fn list_members(
        &self,
        category: &str,
        cursor: Option<&ContinuationCursor>,
    ) -> Result<MemberPage> {
        let index = match cursor.and_then(|c| c.get(CURSOR_KEY)) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| CorpusError::parse(format!("bad cursor '{raw}'")))?,
            None => 0,
        };
        self.record(format!("members:{category}:{index}"));

        if self.failing_pages.get(category) == Some(&index) {
            return Err(CorpusError::Transient(format!(
                "{category}: listing page {index} unavailable"
            )));
        }

        let pages = self.categories.get(category);
        let members = pages
            .and_then(|p| p.get(index))
            .cloned()
            .unwrap_or_default();
        let next = pages
            .filter(|p| index + 1 < p.len())
            .map(|_| ContinuationCursor::from_params([(CURSOR_KEY, (index + 1).to_string())]));

        Ok(MemberPage { members, next })
    }

    async fn fetch_article(&self, title: &str) -> Result<ArticlePage> {
        self.record(format!("article:{title}"));

        if self.failing_articles.contains(title) {
            return Err(CorpusError::Transient(format!("{title}: HTTP 503")));
        }

        let resolved = self.redirects.get(title).map_or(title, String::as_str);
        match self.articles.get(resolved) {
            Some(FakeArticle::Html(html)) => Ok(ArticlePage {
                title: resolved.to_string(),
                html: html.clone(),
                disambiguation: false,
            }),
            Some(FakeArticle::Disambiguation) => Ok(ArticlePage {
                title: resolved.to_string(),
                html: "<div class=\"mw-parser-output\"><p>Begriffsklärung</p></div>".into(),
                disambiguation: true,
            }),
            None => Err(CorpusError::not_found(title)),
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
