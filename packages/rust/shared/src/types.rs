//! Core domain types for wikicorpus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

// ---------------------------------------------------------------------------
// ArticleRecord
// ---------------------------------------------------------------------------

/// One accepted article in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Group label the article was harvested under.
    #[serde(rename = "category")]
    pub group: String,
    /// Article title, the remote service's key.
    pub id: String,
    /// Plain text, possibly truncated to the configured maximum.
    pub text: String,
    /// Character count of the text before truncation.
    pub length: usize,
}

impl ArticleRecord {
    /// Create a new record.
    pub fn new(
        group: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
        length: usize,
    ) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
            text: text.into(),
            length,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Serialization format of the corpus file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Flat JSON array of `{category, id, text, length}` objects.
    #[default]
    Json,
    /// `category,id,text` rows with RFC 4180 quoting.
    Csv,
}

impl OutputFormat {
    /// File extension used for default output paths.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = CorpusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(CorpusError::Serialization(format!(
                "unsupported output format '{other}': expected 'csv' or 'json'"
            ))),
        }
    }
}
