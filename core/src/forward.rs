use crate::lexicon::Lexicon;
use crate::store::{DocRecord, DocStore};
use crate::text::plain_tokens;
use crate::{DocId, TermId, Weight};
use rayon::prelude::*;
use std::collections::HashMap;

/// Per-term occurrence counts for the four document fields. The field set
/// is closed, so the record is fixed-shape rather than a nested map.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldCounts {
    pub title: u32,
    pub authors: u32,
    pub tags: u32,
    pub text: u32,
}

impl FieldCounts {
    /// Field-weighted frequency: title 4, authors 3, tags 2, body 1.
    pub fn weight(&self) -> Weight {
        4 * self.title + 3 * self.authors + 2 * self.tags + self.text
    }
}

/// Document-major index: the vector ordinal is the doc id, each row the
/// sparse (term id, weight) pairs for that document, sorted by term id.
/// Keys are surface-form ids only; this side of the pipeline never
/// lemmatizes.
#[derive(Debug, Default)]
pub struct ForwardIndex {
    docs: Vec<Vec<(TermId, Weight)>>,
}

impl ForwardIndex {
    /// Index every document. Rows are independent, so the scan fans out
    /// per document; the ordered collect keeps row order identical to the
    /// sequential build.
    pub fn build(store: &DocStore, lexicon: &Lexicon) -> Self {
        let docs = store
            .records()
            .par_iter()
            .map(|doc| Self::index_document(doc, lexicon))
            .collect();
        Self { docs }
    }

    fn index_document(doc: &DocRecord, lexicon: &Lexicon) -> Vec<(TermId, Weight)> {
        let mut counts: HashMap<TermId, FieldCounts> = HashMap::new();
        for token in plain_tokens(&doc.title) {
            if let Some(id) = lexicon.id(&token) {
                counts.entry(id).or_default().title += 1;
            }
        }
        for token in plain_tokens(&doc.authors) {
            if let Some(id) = lexicon.id(&token) {
                counts.entry(id).or_default().authors += 1;
            }
        }
        for token in plain_tokens(&doc.tags) {
            if let Some(id) = lexicon.id(&token) {
                counts.entry(id).or_default().tags += 1;
            }
        }
        for token in plain_tokens(&doc.text) {
            if let Some(id) = lexicon.id(&token) {
                counts.entry(id).or_default().text += 1;
            }
        }
        let mut postings: Vec<(TermId, Weight)> = counts
            .into_iter()
            .filter_map(|(id, c)| {
                let weight = c.weight();
                (weight > 0).then_some((id, weight))
            })
            .collect();
        postings.sort_unstable_by_key(|&(id, _)| id);
        postings
    }

    /// Rebuild from persisted rows. Rows may arrive in any order; gaps
    /// become empty rows and zero-weight entries are discarded to restore
    /// the sparse invariant.
    pub(crate) fn from_rows(rows: Vec<(DocId, Vec<(TermId, Weight)>)>) -> Self {
        let len = rows
            .iter()
            .map(|&(doc_id, _)| doc_id as usize + 1)
            .max()
            .unwrap_or(0);
        let mut docs = vec![Vec::new(); len];
        for (doc_id, mut postings) in rows {
            postings.retain(|&(_, w)| w > 0);
            postings.sort_unstable_by_key(|&(id, _)| id);
            postings.dedup_by_key(|&mut (id, _)| id);
            docs[doc_id as usize] = postings;
        }
        Self { docs }
    }

    /// The scoring universe: every document the index has a row for.
    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// Weight of `term` in `doc`; zero when either is unknown.
    pub fn weight(&self, doc: DocId, term: TermId) -> Weight {
        let Some(postings) = self.docs.get(doc as usize) else {
            return 0;
        };
        postings
            .binary_search_by_key(&term, |&(id, _)| id)
            .map_or(0, |i| postings[i].1)
    }

    pub fn postings(&self, doc: DocId) -> Option<&[(TermId, Weight)]> {
        self.docs.get(doc as usize).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &[(TermId, Weight)])> {
        self.docs
            .iter()
            .enumerate()
            .map(|(doc_id, postings)| (doc_id as DocId, postings.as_slice()))
    }
}
