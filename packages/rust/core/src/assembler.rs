//! Corpus assembler.
//!
//! Accumulates accepted articles in production order and serializes them as
//! a flat JSON array or as CSV.

use std::path::Path;

use tracing::{info, instrument};

use wikicorpus_shared::{ArticleRecord, CorpusError, OutputFormat, Result};

/// Accepted articles of one run, in the order they were produced.
#[derive(Debug, Default)]
pub struct CorpusAssembler {
    records: Vec<ArticleRecord>,
}

impl CorpusAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted article.
    pub fn push(&mut self, record: ArticleRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Serialize every record in production order.
    ///
    /// JSON is an array of `{category, id, text, length}` objects. CSV has the
    /// header `category,id,text` with RFC 4180 quoting.
    pub fn serialize(&self, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Json => serde_json::to_vec_pretty(&self.records)
                .map_err(|e| CorpusError::Serialization(format!("JSON encoding failed: {e}"))),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(Vec::new());

        writer
            .write_record(["category", "id", "text"])
            .map_err(csv_error)?;
        for record in &self.records {
            writer
                .write_record([
                    record.group.as_str(),
                    record.id.as_str(),
                    record.text.as_str(),
                ])
                .map_err(csv_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| CorpusError::Serialization(format!("CSV encoding failed: {e}")))
    }

    /// Serialize and write the corpus to `path`.
    ///
    /// The file is written to a temporary sibling first and renamed into place.
    #[instrument(skip(self), fields(records = self.records.len(), path = %path.display()))]
    pub fn write_to(&self, path: &Path, format: OutputFormat) -> Result<()> {
        let bytes = self.serialize(format)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "corpus".into());
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp, &bytes).map_err(|e| CorpusError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| CorpusError::io(path, e))?;

        info!(bytes = bytes.len(), %format, "corpus written");
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> CorpusError {
    CorpusError::Serialization(format!("CSV encoding failed: {e}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "wikicorpus-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> CorpusAssembler {
        let mut corpus = CorpusAssembler::new();
        corpus.push(ArticleRecord::new("Antike", "Hethiter", "Die Hethiter.", 13));
        corpus.push(ArticleRecord::new(
            "Antike",
            "Hattuša",
            "Hauptstadt, \"Ḫattuša\"\nin Anatolien.",
            33,
        ));
        corpus
    }

    #[test]
    fn json_is_flat_array_in_order() {
        let bytes = sample().serialize(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["category"], "Antike");
        assert_eq!(items[0]["id"], "Hethiter");
        assert_eq!(items[0]["text"], "Die Hethiter.");
        assert_eq!(items[0]["length"], 13);
        assert_eq!(items[1]["id"], "Hattuša");
    }

    #[test]
    fn json_parses_back_into_records() {
        let corpus = sample();
        let bytes = corpus.serialize(OutputFormat::Json).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, corpus.records());
    }

    #[test]
    fn csv_preserves_commas_quotes_and_newlines() {
        let corpus = sample();
        let bytes = corpus.serialize(OutputFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["category", "id", "text"])
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), corpus.len());
        for (row, record) in rows.iter().zip(corpus.records()) {
            assert_eq!(&row[0], record.group);
            assert_eq!(&row[1], record.id);
            assert_eq!(&row[2], record.text);
        }
    }

    #[test]
    fn empty_corpus_serializes() {
        let corpus = CorpusAssembler::new();
        assert_eq!(corpus.serialize(OutputFormat::Json).unwrap(), b"[]");
        assert_eq!(
            corpus.serialize(OutputFormat::Csv).unwrap(),
            b"category,id,text\n"
        );
    }

    #[test]
    fn writes_file() {
        let dir = temp_dir();
        let path = dir.join("out").join("articles.csv");

        sample().write_to(&path, OutputFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("category,id,text\n"));
        assert!(content.contains("\"Hauptstadt, \"\"Ḫattuša\"\"\nin Anatolien.\""));
        assert!(!dir.join("out").join(".articles.csv.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn write_error_carries_path() {
        let dir = temp_dir();
        let blocker = dir.join("file");
        std::fs::write(&blocker, "x").unwrap();

        let err = sample()
            .write_to(&blocker.join("articles.json"), OutputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
