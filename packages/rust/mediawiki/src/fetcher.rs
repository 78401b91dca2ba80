//! Article content fetching.

use tracing::{debug, instrument};

use wikicorpus_extract::{ExtractOptions, extract_text};
use wikicorpus_shared::{CorpusError, HarvestConfig, Result};

use crate::client::WikiApi;

/// Plain text of a fetched article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArticle {
    /// Title after redirects were followed.
    pub title: String,
    pub text: String,
}

impl FetchedArticle {
    /// The requested title was a redirect to `self.title`.
    pub fn is_redirect_from(&self, id: &str) -> bool {
        self.title != id
    }
}

/// Fetches articles and reduces them to plain text.
pub struct ArticleFetcher<'a, A> {
    api: &'a A,
    opts: ExtractOptions,
}

impl<'a, A: WikiApi> ArticleFetcher<'a, A> {
    pub fn new(api: &'a A, opts: ExtractOptions) -> Self {
        Self { api, opts }
    }

    /// Build a fetcher with the extraction settings of a run.
    pub fn from_config(api: &'a A, config: &HarvestConfig) -> Self {
        Self::new(
            api,
            ExtractOptions {
                skip_sections: config.skip_sections.clone(),
                include_headings: config.include_headings,
            },
        )
    }

    /// Fetch the plain-text body of the article `id`, following redirects.
    ///
    /// A disambiguation page is reported as [`CorpusError::NotFound`]; the
    /// text returned is never truncated or filtered.
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: &str) -> Result<FetchedArticle> {
        let page = self.api.fetch_article(id).await?;
        if page.disambiguation {
            debug!(resolved = %page.title, "disambiguation page");
            return Err(CorpusError::not_found(id));
        }

        let text = extract_text(&page.html, &self.opts);
        debug!(resolved = %page.title, chars = text.chars().count(), "article fetched");
        Ok(FetchedArticle {
            title: page.title,
            text,
        })
    }
}
