use crate::text::clean_field;
use crate::DocId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One corpus record as it arrives on the wire. Any field may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct RawDoc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A cleaned document as stored. `doc_id` always equals the record's
/// ordinal position in the store; the column exists so a reordered or
/// truncated store is detected on load instead of silently shifting ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocRecord {
    pub doc_id: DocId,
    pub title: String,
    pub authors: String,
    pub tags: String,
    pub text: String,
    pub url: Option<String>,
}

impl DocRecord {
    pub fn from_raw(doc_id: DocId, raw: RawDoc) -> Self {
        Self {
            doc_id,
            title: clean_field(raw.title.as_deref().unwrap_or("")),
            authors: clean_field(raw.authors.as_deref().unwrap_or("")),
            tags: clean_field(raw.tags.as_deref().unwrap_or("")),
            text: clean_field(raw.text.as_deref().unwrap_or("")),
            url: raw.url,
        }
    }

    /// The four indexable fields, in the order the lexicon scans them.
    pub fn fields(&self) -> [&str; 4] {
        [&self.title, &self.authors, &self.tags, &self.text]
    }
}

/// Read-only document universe. Ids are dense ordinals.
#[derive(Debug, Default)]
pub struct DocStore {
    docs: Vec<DocRecord>,
}

impl DocStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean a raw record and append it under the next ordinal id.
    pub fn push_raw(&mut self, raw: RawDoc) -> DocId {
        let doc_id = self.docs.len() as DocId;
        self.docs.push(DocRecord::from_raw(doc_id, raw));
        doc_id
    }

    pub(crate) fn push_record(&mut self, record: DocRecord) {
        self.docs.push(record);
    }

    /// Ingest JSONL records until EOF or until the store holds `limit`
    /// documents. Malformed lines are skipped with a warning; I/O failures
    /// are fatal. Returns the number of documents added.
    pub fn ingest<R: BufRead>(&mut self, reader: R, limit: Option<usize>) -> Result<usize> {
        let before = self.docs.len();
        for (line_no, line) in reader.lines().enumerate() {
            if limit.is_some_and(|n| self.docs.len() >= n) {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawDoc>(&line) {
                Ok(raw) => {
                    self.push_raw(raw);
                }
                Err(err) => {
                    tracing::warn!(line = line_no + 1, %err, "skipping malformed corpus line");
                }
            }
        }
        Ok(self.docs.len() - before)
    }

    pub fn get(&self, doc_id: DocId) -> Option<&DocRecord> {
        self.docs.get(doc_id as usize)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn records(&self) -> &[DocRecord] {
        &self.docs
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocRecord> {
        self.docs.iter()
    }
}
