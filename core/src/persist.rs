use crate::forward::ForwardIndex;
use crate::inverted::InvertedIndex;
use crate::lexicon::Lexicon;
use crate::pipeline::IndexArtifacts;
use crate::query::QueryEngine;
use crate::store::{DocRecord, DocStore};
use crate::{DocId, TermId, Weight};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn lexicon(&self) -> PathBuf { self.root.join("lexicon.tsv") }
    fn forward(&self) -> PathBuf { self.root.join("forward.tsv") }
    fn inverted(&self) -> PathBuf { self.root.join("inverted.tsv") }
    fn docs(&self) -> PathBuf { self.root.join("docs.jsonl") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// A persisted table row that failed strict decoding. Loaders skip such
/// rows with a warning; they never abort a whole load.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected two tab-separated columns")]
    Columns,
    #[error("invalid integer: {0}")]
    Int(#[from] std::num::ParseIntError),
    #[error("malformed posting entry {0:?}")]
    Posting(String),
    #[error("term or id already bound")]
    Duplicate,
    #[error("doc id {found} does not match ordinal {expected}")]
    Ordinal { found: DocId, expected: DocId },
}

fn parse_lexicon_row(line: &str) -> Result<(String, TermId), RowError> {
    let (term, id) = line.split_once('\t').ok_or(RowError::Columns)?;
    if term.is_empty() {
        return Err(RowError::Columns);
    }
    Ok((term.to_string(), id.trim().parse()?))
}

fn parse_forward_row(line: &str) -> Result<(DocId, Vec<(TermId, Weight)>), RowError> {
    let (doc, details) = line.split_once('\t').ok_or(RowError::Columns)?;
    let doc_id = doc.trim().parse()?;
    let mut postings = Vec::new();
    if !details.is_empty() {
        for pair in details.split(',') {
            let (term, weight) = pair
                .split_once(':')
                .ok_or_else(|| RowError::Posting(pair.to_string()))?;
            postings.push((term.parse()?, weight.parse()?));
        }
    }
    Ok((doc_id, postings))
}

fn parse_inverted_row(line: &str) -> Result<(TermId, Vec<DocId>), RowError> {
    let (term, docs) = line.split_once('\t').ok_or(RowError::Columns)?;
    let term_id = term.trim().parse()?;
    let mut doc_ids = Vec::new();
    if !docs.is_empty() {
        for doc in docs.split(',') {
            doc_ids.push(doc.trim().parse()?);
        }
    }
    Ok((term_id, doc_ids))
}

pub fn save_lexicon(paths: &IndexPaths, lexicon: &Lexicon) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut rows: Vec<(&str, TermId)> = lexicon.iter().collect();
    rows.sort_unstable_by(|a, b| a.0.cmp(b.0));
    let mut out = BufWriter::new(File::create(paths.lexicon())?);
    for (term, id) in rows {
        writeln!(out, "{term}\t{id}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_lexicon(paths: &IndexPaths) -> Result<Lexicon> {
    let file = File::open(paths.lexicon())
        .with_context(|| format!("opening {}", paths.lexicon().display()))?;
    let mut lexicon = Lexicon::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let row = parse_lexicon_row(&line).and_then(|(term, id)| {
            if lexicon.insert_at(term, id) {
                Ok(())
            } else {
                Err(RowError::Duplicate)
            }
        });
        if let Err(err) = row {
            tracing::warn!(line = line_no + 1, %err, "skipping lexicon row");
        }
    }
    Ok(lexicon)
}

pub fn save_forward(paths: &IndexPaths, forward: &ForwardIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.forward())?);
    for (doc_id, postings) in forward.iter() {
        let details = postings
            .iter()
            .map(|(term, weight)| format!("{term}:{weight}"))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{doc_id}\t{details}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_forward(paths: &IndexPaths) -> Result<ForwardIndex> {
    let file = File::open(paths.forward())
        .with_context(|| format!("opening {}", paths.forward().display()))?;
    let mut rows = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match parse_forward_row(&line) {
            Ok(row) => rows.push(row),
            Err(err) => tracing::warn!(line = line_no + 1, %err, "skipping forward row"),
        }
    }
    Ok(ForwardIndex::from_rows(rows))
}

pub fn save_inverted(paths: &IndexPaths, inverted: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut rows: Vec<(TermId, &[DocId])> = inverted.iter().collect();
    rows.sort_unstable_by_key(|&(term, _)| term);
    let mut out = BufWriter::new(File::create(paths.inverted())?);
    for (term, docs) in rows {
        let list = docs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{term}\t{list}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_inverted(paths: &IndexPaths) -> Result<InvertedIndex> {
    let file = File::open(paths.inverted())
        .with_context(|| format!("opening {}", paths.inverted().display()))?;
    let mut rows = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match parse_inverted_row(&line) {
            Ok(row) => rows.push(row),
            Err(err) => tracing::warn!(line = line_no + 1, %err, "skipping inverted row"),
        }
    }
    Ok(InvertedIndex::from_rows(rows))
}

pub fn save_docs(paths: &IndexPaths, store: &DocStore) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.docs())?);
    for record in store.iter() {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    out.flush()?;
    Ok(())
}

/// Reload the document store. Each row carries an explicit `doc_id` that
/// must match the row's ordinal; a mismatch means the store was reordered
/// or corrupted since indexing, and the row is rejected rather than bound
/// to the wrong id.
pub fn load_docs(paths: &IndexPaths) -> Result<DocStore> {
    let file = File::open(paths.docs())
        .with_context(|| format!("opening {}", paths.docs().display()))?;
    let mut store = DocStore::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DocRecord>(&line) {
            Ok(record) => {
                let expected = store.len() as DocId;
                if record.doc_id == expected {
                    store.push_record(record);
                } else {
                    let err = RowError::Ordinal { found: record.doc_id, expected };
                    tracing::warn!(line = line_no + 1, %err, "skipping document row");
                }
            }
            Err(err) => {
                tracing::warn!(line = line_no + 1, %err, "skipping malformed document row");
            }
        }
    }
    Ok(store)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    out.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let file = File::open(paths.meta())
        .with_context(|| format!("opening {}", paths.meta().display()))?;
    let meta = serde_json::from_reader(BufReader::new(file))?;
    Ok(meta)
}

/// Persist one corpus snapshot's artifacts, store, and metadata.
pub fn save_artifacts(
    paths: &IndexPaths,
    artifacts: &IndexArtifacts,
    store: &DocStore,
    meta: &MetaFile,
) -> Result<()> {
    save_lexicon(paths, &artifacts.lexicon)?;
    save_forward(paths, &artifacts.forward)?;
    save_inverted(paths, &artifacts.inverted)?;
    save_docs(paths, store)?;
    save_meta(paths, meta)?;
    Ok(())
}

/// Load everything a search needs and assemble the engine.
pub fn load_query_engine(paths: &IndexPaths) -> Result<(QueryEngine, MetaFile)> {
    let lexicon = load_lexicon(paths)?;
    let forward = load_forward(paths)?;
    let inverted = load_inverted(paths)?;
    let store = load_docs(paths)?;
    let meta = load_meta(paths)?;
    Ok((QueryEngine::new(lexicon, forward, inverted, store), meta))
}
