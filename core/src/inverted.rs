use crate::lexicon::Lexicon;
use crate::store::{DocRecord, DocStore};
use crate::text::alpha_token;
use crate::{DocId, TermId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Term-major index: each term id maps to the insertion-ordered,
/// duplicate-free list of documents containing it in any field.
///
/// Lookup keys are tokens reduced to their alphabetic characters, not
/// lemmas. The forward index keys on exact surface tokens instead; the two
/// sides intentionally disagree and must stay that way.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<TermId, Vec<DocId>>,
}

impl InvertedIndex {
    /// Index every document. Per-document term sets are computed in
    /// parallel; the posting lists themselves are appended by this single
    /// writer in ascending doc order, so list order matches the sequential
    /// build.
    pub fn build(store: &DocStore, lexicon: &Lexicon) -> Self {
        let per_doc: Vec<Vec<TermId>> = store
            .records()
            .par_iter()
            .map(|doc| Self::document_terms(doc, lexicon))
            .collect();
        let mut index = Self::default();
        for (doc_id, terms) in per_doc.into_iter().enumerate() {
            for term in terms {
                index.append(term, doc_id as DocId);
            }
        }
        index
    }

    /// Distinct term ids for one document: all four fields as a single
    /// token stream, each token alpha-reduced before dictionary lookup.
    fn document_terms(doc: &DocRecord, lexicon: &Lexicon) -> Vec<TermId> {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        for field in doc.fields() {
            for word in field.split_whitespace() {
                let Some(token) = alpha_token(word) else {
                    continue;
                };
                if let Some(id) = lexicon.id(&token) {
                    if seen.insert(id) {
                        terms.push(id);
                    }
                }
            }
        }
        terms
    }

    /// Documents are appended in ascending id order, so the tail is the
    /// only possible duplicate.
    fn append(&mut self, term: TermId, doc: DocId) {
        let list = self.postings.entry(term).or_default();
        if list.last() != Some(&doc) {
            list.push(doc);
        }
    }

    /// Rebuild from persisted rows, restoring the duplicate-free invariant
    /// while preserving list order.
    pub(crate) fn from_rows(rows: Vec<(TermId, Vec<DocId>)>) -> Self {
        let mut postings: HashMap<TermId, Vec<DocId>> = HashMap::new();
        for (term, docs) in rows {
            let list = postings.entry(term).or_default();
            let mut seen: HashSet<DocId> = list.iter().copied().collect();
            for doc in docs {
                if seen.insert(doc) {
                    list.push(doc);
                }
            }
        }
        Self { postings }
    }

    pub fn postings(&self, term: TermId) -> Option<&[DocId]> {
        self.postings.get(&term).map(Vec::as_slice)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[DocId])> {
        self.postings.iter().map(|(&term, docs)| (term, docs.as_slice()))
    }
}
