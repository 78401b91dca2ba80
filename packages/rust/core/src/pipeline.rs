//! End-to-end harvest pipeline: category groups → members → fetch → filter → corpus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use wikicorpus_mediawiki::{ArticleFetcher, WikiApi, enumerate};
use wikicorpus_shared::{ArticleRecord, CategoryGroups, CorpusError, HarvestConfig, Result};

use crate::assembler::CorpusAssembler;
use crate::dedup::{Admission, Deduplicator, SeenSet};
use crate::filter::{FilterOutcome, LengthBounds, filter, is_excluded_title};

/// Lifecycle of one category within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    Pending,
    Enumerating,
    /// Enumeration reached end of data or the cap.
    Done,
    /// Enumeration failed or the run was stopped. Accepted articles are kept.
    Aborted,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub started_at: DateTime<Utc>,
    pub categories_done: usize,
    pub categories_aborted: usize,
    /// Article fetches attempted.
    pub attempted: usize,
    pub accepted: usize,
    /// Fetched but empty or shorter than the minimum length.
    pub rejected: usize,
    /// Missing or disambiguation pages.
    pub not_found: usize,
    /// Fetches that failed with a transient or parse error.
    pub failed: usize,
    /// Members already seen, including redirects to an article already seen.
    pub duplicates_skipped: usize,
    /// Titles matching an exclusion pattern.
    pub excluded: usize,
    /// The run ended early on a stop request.
    pub stopped: bool,
    pub elapsed: Duration,
}

impl HarvestSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            categories_done: 0,
            categories_aborted: 0,
            attempted: 0,
            accepted: 0,
            rejected: 0,
            not_found: 0,
            failed: 0,
            duplicates_skipped: 0,
            excluded: 0,
            stopped: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of [`harvest`].
#[derive(Debug)]
pub struct HarvestOutcome {
    pub corpus: CorpusAssembler,
    pub summary: HarvestSummary,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a category starts enumerating. `index` is 1-based.
    fn category_started(&self, group: &str, category: &str, index: usize, total: usize);
    /// Called after each article fetch settles.
    fn article_processed(&self, id: &str, accepted: usize);
    /// Called when a category reaches a terminal state.
    fn category_finished(&self, category: &str, state: CategoryState);
    /// Called when the run completes.
    fn done(&self, summary: &HarvestSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn category_started(&self, _group: &str, _category: &str, _index: usize, _total: usize) {}
    fn article_processed(&self, _id: &str, _accepted: usize) {}
    fn category_finished(&self, _category: &str, _state: CategoryState) {}
    fn done(&self, _summary: &HarvestSummary) {}
}

/// Run the full harvest.
///
/// Categories are processed one at a time, in group order and then in the
/// order listed in each group. Admitted articles are fetched in batches of
/// `fetch_concurrency`; results are accumulated in admission order. Failures
/// on a single listing page or article are logged, counted and skipped.
///
/// When `stop` is set the run ends after the in-flight batch settles, and the
/// partial corpus is returned.
#[instrument(skip_all, fields(lang = %config.lang, groups = groups.len()))]
pub async fn harvest<A: WikiApi>(
    api: &A,
    groups: &CategoryGroups,
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
    stop: Option<&AtomicBool>,
) -> Result<HarvestOutcome> {
    config.validate()?;
    let start = Instant::now();

    info!(
        categories = groups.category_count(),
        max_articles = config.max_articles,
        concurrency = config.fetch_concurrency,
        "starting harvest"
    );

    let mut seen = SeenSet::new();
    let mut run = Run {
        api,
        fetcher: ArticleFetcher::from_config(api, config),
        config,
        bounds: LengthBounds::new(config.min_article_length, config.max_article_length),
        progress,
        stop,
        dedup: Deduplicator::new(&mut seen, config.max_articles),
        corpus: CorpusAssembler::new(),
        summary: HarvestSummary::new(),
    };

    let total = groups.category_count();
    let mut index = 0;

    'groups: for group in groups {
        for category in &group.categories {
            if run.stop_requested() {
                break 'groups;
            }
            index += 1;
            progress.category_started(&group.label, category, index, total);

            let state = run.harvest_category(&group.label, category).await?;
            match state {
                CategoryState::Aborted => run.summary.categories_aborted += 1,
                _ => run.summary.categories_done += 1,
            }
            progress.category_finished(category, state);
        }
    }

    let Run {
        corpus,
        mut summary,
        ..
    } = run;
    summary.elapsed = start.elapsed();
    progress.done(&summary);

    info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        not_found = summary.not_found,
        failed = summary.failed,
        duplicates = summary.duplicates_skipped,
        categories_aborted = summary.categories_aborted,
        stopped = summary.stopped,
        elapsed_ms = summary.elapsed.as_millis(),
        "harvest complete"
    );

    Ok(HarvestOutcome { corpus, summary })
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct Run<'a, A> {
    api: &'a A,
    fetcher: ArticleFetcher<'a, A>,
    config: &'a HarvestConfig,
    bounds: LengthBounds,
    progress: &'a dyn ProgressReporter,
    stop: Option<&'a AtomicBool>,
    dedup: Deduplicator<'a>,
    corpus: CorpusAssembler,
    summary: HarvestSummary,
}

impl<A: WikiApi> Run<'_, A> {
    fn stop_requested(&mut self) -> bool {
        if self.summary.stopped {
            return true;
        }
        if self.stop.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!("stop requested, finishing in-flight work");
            self.summary.stopped = true;
        }
        self.summary.stopped
    }

    #[instrument(skip(self, group))]
    async fn harvest_category(&mut self, group: &str, category: &str) -> Result<CategoryState> {
        debug!(state = ?CategoryState::Pending, "category queued");
        self.dedup.begin_category(category);

        let mut members = enumerate(self.api, category);
        let mut batch: Vec<String> = Vec::with_capacity(self.config.fetch_concurrency);
        let mut state = CategoryState::Enumerating;

        while state == CategoryState::Enumerating {
            if self.dedup.is_category_full() {
                debug!(max_articles = self.config.max_articles, "category cap reached");
                state = CategoryState::Done;
                break;
            }
            if self.stop_requested() {
                state = CategoryState::Aborted;
                break;
            }

            match members.next_article().await {
                Ok(Some(id)) => {
                    if is_excluded_title(&id, &self.config.exclude_title_patterns) {
                        debug!(%id, "title excluded");
                        self.summary.excluded += 1;
                        continue;
                    }
                    match self.dedup.try_admit(&id, category) {
                        Admission::Admitted => {
                            batch.push(id);
                            if batch.len() >= self.config.fetch_concurrency {
                                self.fetch_batch(group, &mut batch).await?;
                            }
                        }
                        Admission::AlreadySeen => self.summary.duplicates_skipped += 1,
                        Admission::CategoryFull => state = CategoryState::Done,
                    }
                }
                Ok(None) => state = CategoryState::Done,
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, pages = members.pages_fetched(), "enumeration aborted");
                    state = CategoryState::Aborted;
                }
                Err(e) => return Err(e),
            }
        }

        self.fetch_batch(group, &mut batch).await?;

        debug!(
            ?state,
            admitted = self.dedup.admitted_in_category(),
            pages = members.pages_fetched(),
            skipped_subcategories = members.skipped_subcategories(),
            "category finished"
        );
        Ok(state)
    }

    /// Fetch and filter the admitted ids in `batch`, draining it.
    async fn fetch_batch(&mut self, group: &str, batch: &mut Vec<String>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let ids = std::mem::take(batch);
        let results = join_all(ids.iter().map(|id| self.fetcher.fetch(id))).await;

        for (id, result) in ids.into_iter().zip(results) {
            self.summary.attempted += 1;
            match result {
                Ok(article)
                    if article.is_redirect_from(&id) && !self.dedup.mark_seen(&article.title) =>
                {
                    debug!(%id, resolved = %article.title, "redirect to an article already seen");
                    self.summary.duplicates_skipped += 1;
                }
                Ok(article) => match filter(article.text, &self.bounds) {
                    FilterOutcome::Accepted { text, length } => {
                        self.summary.accepted += 1;
                        self.corpus
                            .push(ArticleRecord::new(group, id.as_str(), text, length));
                    }
                    FilterOutcome::Rejected { length } => {
                        debug!(%id, length, min = self.bounds.min, "article empty or too short");
                        self.summary.rejected += 1;
                    }
                },
                Err(CorpusError::NotFound { .. }) => {
                    debug!(%id, "article not found");
                    self.summary.not_found += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(%id, error = %e, "article fetch failed, skipping");
                    self.summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
            self.progress.article_processed(&id, self.summary.accepted);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
