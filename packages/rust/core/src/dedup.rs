//! Cross-category deduplication and the per-category cap.

use std::collections::HashSet;

use tracing::trace;

/// Article ids already scheduled for fetch during one run.
///
/// Only grows. Owned by the harvest run and lent to the [`Deduplicator`].
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// Outcome of an admission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly seen and within the cap; the article should be fetched.
    Admitted,
    /// Already scheduled by an earlier category (or earlier in this one).
    AlreadySeen,
    /// The current category already admitted `max_articles` articles.
    CategoryFull,
}

/// Decides which article ids get fetched.
///
/// The identity check comes before the cap check, so a duplicate never
/// consumes a slot of the current category.
pub struct Deduplicator<'a> {
    seen: &'a mut SeenSet,
    max_articles: usize,
    category: Option<String>,
    admitted: usize,
}

impl<'a> Deduplicator<'a> {
    pub fn new(seen: &'a mut SeenSet, max_articles: usize) -> Self {
        Self {
            seen,
            max_articles,
            category: None,
            admitted: 0,
        }
    }

    /// Reset the per-category counter for `category`.
    pub fn begin_category(&mut self, category: &str) {
        self.category = Some(category.to_string());
        self.admitted = 0;
    }

    /// Admit `id` for `category`, reporting why it was refused.
    ///
    /// A category different from the current one starts a fresh cap.
    pub fn try_admit(&mut self, id: &str, category: &str) -> Admission {
        if self.category.as_deref() != Some(category) {
            self.begin_category(category);
        }

        if self.seen.contains(id) {
            trace!(id, category, "already seen");
            return Admission::AlreadySeen;
        }
        if self.admitted >= self.max_articles {
            return Admission::CategoryFull;
        }

        self.seen.ids.insert(id.to_string());
        self.admitted += 1;
        Admission::Admitted
    }

    /// Record `id` as seen without counting it against the cap.
    ///
    /// Used for redirect targets. Returns `false` if `id` was already seen.
    pub fn mark_seen(&mut self, id: &str) -> bool {
        self.seen.ids.insert(id.to_string())
    }

    /// Whether `id` should be fetched for `category`.
    pub fn admit(&mut self, id: &str, category: &str) -> bool {
        self.try_admit(id, category) == Admission::Admitted
    }

    /// The current category reached its cap.
    pub fn is_category_full(&self) -> bool {
        self.admitted >= self.max_articles
    }

    /// Articles admitted for the current category.
    pub fn admitted_in_category(&self) -> usize {
        self.admitted
    }
}
