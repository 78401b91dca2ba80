//! Lazy enumeration of a category's direct article members.

use std::collections::VecDeque;

use tracing::{debug, instrument, trace};

use wikicorpus_shared::{CorpusError, Result};

use crate::client::{ContinuationCursor, MemberKind, WikiApi};

/// Pull-based, finite sequence of the article ids in one category.
///
/// Listing pages are requested only when the buffered members run out, so a
/// consumer that stops early never pays for the remaining pages. Members that
/// are not articles (subcategories, files, other namespaces) are skipped and
/// counted. After the end of data or the first error the enumerator is
/// exhausted and yields nothing further.
pub struct MembershipEnumerator<'a, A> {
    api: &'a A,
    category: String,
    buffer: VecDeque<String>,
    cursor: Option<ContinuationCursor>,
    exhausted: bool,
    pages_fetched: usize,
    skipped_subcategories: usize,
    skipped_other: usize,
}

/// Start enumerating the direct article members of `category`.
///
/// No request is made until the first call to
/// [`MembershipEnumerator::next_article`].
pub fn enumerate<'a, A: WikiApi>(api: &'a A, category: &str) -> MembershipEnumerator<'a, A> {
    MembershipEnumerator {
        api,
        category: category.to_string(),
        buffer: VecDeque::new(),
        cursor: None,
        exhausted: false,
        pages_fetched: 0,
        skipped_subcategories: 0,
        skipped_other: 0,
    }
}

impl<A: WikiApi> MembershipEnumerator<'_, A> {
    /// The next article id, `Ok(None)` at end of data.
    ///
    /// A failed page request ends the enumeration: the error is returned once
    /// and every later call yields `Ok(None)`.
    #[instrument(skip(self), fields(category = %self.category))]
    pub async fn next_article(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(id) = self.buffer.pop_front() {
                return Ok(Some(id));
            }
            if self.exhausted {
                return Ok(None);
            }
            if let Err(e) = self.fetch_page().await {
                self.exhausted = true;
                self.buffer.clear();
                return Err(e);
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let page = self
            .api
            .list_members(&self.category, self.cursor.as_ref())
            .await?;
        self.pages_fetched += 1;

        if page.next.is_some() && page.next == self.cursor {
            return Err(CorpusError::parse(format!(
                "{}: continuation cursor did not advance",
                self.category
            )));
        }

        for member in page.members {
            match member.kind {
                MemberKind::Article => self.buffer.push_back(member.id),
                MemberKind::Subcategory => {
                    trace!(member = %member.id, "skipping subcategory");
                    self.skipped_subcategories += 1;
                }
                MemberKind::File | MemberKind::OtherPage => {
                    trace!(member = %member.id, "skipping non-article member");
                    self.skipped_other += 1;
                }
            }
        }

        match page.next {
            Some(next) => self.cursor = Some(next),
            None => {
                self.cursor = None;
                self.exhausted = true;
                debug!(
                    pages = self.pages_fetched,
                    skipped_subcategories = self.skipped_subcategories,
                    skipped_other = self.skipped_other,
                    "membership listing complete"
                );
            }
        }
        Ok(())
    }

    /// Listing pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Subcategory members skipped so far.
    pub fn skipped_subcategories(&self) -> usize {
        self.skipped_subcategories
    }

    /// File and other non-article members skipped so far.
    pub fn skipped_other(&self) -> usize {
        self.skipped_other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ArticlePage, Member, MemberPage};
    use crate::testing::FakeWiki;

    async fn collect_all<A: WikiApi>(e: &mut MembershipEnumerator<'_, A>) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(id) = e.next_article().await.unwrap() {
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn yields_articles_across_pages_in_order() {
        let wiki = FakeWiki::new().with_category(
            "Kategorie:Hethiter",
            vec![
                vec![Member::article("A"), Member::article("B")],
                vec![Member::article("C")],
            ],
        );

        let mut members = enumerate(&wiki, "Kategorie:Hethiter");
        assert_eq!(collect_all(&mut members).await, vec!["A", "B", "C"]);
        assert_eq!(members.pages_fetched(), 2);
        assert_eq!(members.next_article().await.unwrap(), None);
    }

    #[tokio::test]
    async fn skips_subcategories_and_files() {
        let wiki = FakeWiki::new().with_category(
            "Kategorie:Hethiter",
            vec![vec![
                Member::subcategory("Kategorie:Hethitischer König"),
                Member::article("Hattuša"),
                Member::file("Datei:Löwentor.jpg"),
            ]],
        );

        let mut members = enumerate(&wiki, "Kategorie:Hethiter");
        assert_eq!(collect_all(&mut members).await, vec!["Hattuša"]);
        assert_eq!(members.skipped_subcategories(), 1);
        assert_eq!(members.skipped_other(), 1);
    }

    #[tokio::test]
    async fn empty_category_yields_nothing() {
        let wiki = FakeWiki::new().with_category("Kategorie:Leer", vec![vec![]]);
        let mut members = enumerate(&wiki, "Kategorie:Leer");
        assert_eq!(members.next_article().await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetches_pages_lazily() {
        let wiki = FakeWiki::new().with_category(
            "Kategorie:X",
            vec![vec![Member::article("A")], vec![Member::article("B")]],
        );

        let mut members = enumerate(&wiki, "Kategorie:X");
        assert!(wiki.requests().is_empty());
        assert_eq!(members.next_article().await.unwrap().as_deref(), Some("A"));
        assert_eq!(wiki.requests(), vec!["members:Kategorie:X:0"]);
    }

    #[tokio::test]
    async fn page_failure_ends_enumeration() {
        let wiki = FakeWiki::new()
            .with_category(
                "Kategorie:X",
                vec![vec![Member::article("A")], vec![Member::article("B")]],
            )
            .failing_page("Kategorie:X", 1);

        let mut members = enumerate(&wiki, "Kategorie:X");
        assert_eq!(members.next_article().await.unwrap().as_deref(), Some("A"));
        assert!(matches!(
            members.next_article().await,
            Err(CorpusError::Transient(_))
        ));
        assert_eq!(members.next_article().await.unwrap(), None);
    }

    struct StuckWiki;

    impl WikiApi for StuckWiki {
        async fn list_members(
            &self,
            _category: &str,
            _cursor: Option<&ContinuationCursor>,
        ) -> Result<MemberPage> {
            Ok(MemberPage {
                members: vec![Member::article("A")],
                next: Some(ContinuationCursor::from_params([("cmcontinue", "same")])),
            })
        }

        async fn fetch_article(&self, title: &str) -> Result<ArticlePage> {
            Err(CorpusError::not_found(title))
        }
    }

    #[tokio::test]
    async fn non_advancing_cursor_is_an_error() {
        let mut members = enumerate(&StuckWiki, "Kategorie:X");
        assert_eq!(members.next_article().await.unwrap().as_deref(), Some("A"));
        assert!(matches!(
            members.next_article().await,
            Err(CorpusError::Parse { .. })
        ));
        assert_eq!(members.next_article().await.unwrap(), None);
    }
}
