//! Access to a MediaWiki encyclopedia.
//!
//! This crate provides:
//! - [`WikiApi`] and its HTTP implementation [`MediaWikiClient`]
//! - [`enumerate`] / [`MembershipEnumerator`] for lazy category listings
//! - [`ArticleFetcher`] for plain-text article bodies

mod client;
mod fetcher;
mod members;
mod retry;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{
    ArticlePage, ContinuationCursor, MediaWikiClient, Member, MemberKind, MemberPage, WikiApi,
};
pub use fetcher::{ArticleFetcher, FetchedArticle};
pub use members::{MembershipEnumerator, enumerate};
