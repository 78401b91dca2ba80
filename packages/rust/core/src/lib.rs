//! Harvest pipeline and domain logic for wikicorpus.
//!
//! This crate ties together membership enumeration, deduplication, article
//! fetching, length filtering and corpus assembly into one run ([`harvest`]).

pub mod assembler;
pub mod dedup;
pub mod filter;
pub mod pipeline;

pub use assembler::CorpusAssembler;
pub use dedup::{Admission, Deduplicator, SeenSet};
pub use filter::{FilterOutcome, LengthBounds, filter, is_excluded_title};
pub use pipeline::{
    CategoryState, HarvestOutcome, HarvestSummary, ProgressReporter, SilentProgress, harvest,
};
