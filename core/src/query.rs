use crate::forward::ForwardIndex;
use crate::inverted::InvertedIndex;
use crate::lexicon::Lexicon;
use crate::store::DocStore;
use crate::DocId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub const DEFAULT_TOP_K: usize = 5;

/// Request-scoped cancellation handle. Share one between a caller and an
/// in-flight search to let the caller abandon a slow scoring pass.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query cancelled")]
    Cancelled,
}

/// One ranked hit, resolved against the document store.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub url: Option<String>,
}

/// Ranked hits plus any doc ids an index referenced but the store could
/// not resolve. A non-empty `inconsistencies` list means the index
/// artifacts are stale relative to the store; callers must surface it.
#[derive(Debug, Default)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub inconsistencies: Vec<DocId>,
}

/// TF-IDF scoring over the three immutable index artifacts and the
/// document store. Stateless per query; `&self` throughout, so any number
/// of searches may run concurrently over one engine.
pub struct QueryEngine {
    lexicon: Lexicon,
    forward: ForwardIndex,
    inverted: InvertedIndex,
    store: DocStore,
}

impl QueryEngine {
    pub fn new(
        lexicon: Lexicon,
        forward: ForwardIndex,
        inverted: InvertedIndex,
        store: DocStore,
    ) -> Self {
        Self {
            lexicon,
            forward,
            inverted,
            store,
        }
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    /// Score the corpus against a free-text query and return the `top_k`
    /// best documents.
    ///
    /// A query that is empty after stop-word removal yields an empty
    /// result. Terms missing from the lexicon or the inverted index are
    /// skipped; the rest of the query still scores. Per-term contribution
    /// is `forward_weight * log10(total_docs / posting_len)`, summed per
    /// document, ranked by score descending with ascending doc id breaking
    /// ties.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        cancel: Option<&CancelFlag>,
    ) -> Result<SearchResults, QueryError> {
        let tokens = crate::text::query_tokens(query);
        if tokens.is_empty() {
            tracing::debug!("query is empty after stop-word removal");
            return Ok(SearchResults::default());
        }

        let total_docs = self.forward.doc_count();
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for token in &tokens {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                return Err(QueryError::Cancelled);
            }
            let Some(term) = self.lexicon.id(token) else {
                tracing::debug!(token = %token, "query term not in lexicon, skipping");
                continue;
            };
            let postings = self.inverted.postings(term).unwrap_or(&[]);
            if postings.is_empty() {
                tracing::debug!(term, "term has no postings, skipping");
                continue;
            }
            let idf = (total_docs as f64 / postings.len() as f64).log10();
            for &doc in postings {
                // zero when the forward row lacks this term (inconsistent
                // artifacts); the document may still score on other terms
                let tf = self.forward.weight(doc, term);
                if tf > 0 {
                    *scores.entry(doc).or_insert(0.0) += f64::from(tf) * idf;
                }
            }
        }
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return Err(QueryError::Cancelled);
        }

        // only nonzero scores rank; a term present in every document has
        // idf zero and contributes nothing
        let mut ranked: Vec<(DocId, f64)> = scores
            .into_iter()
            .filter(|&(_, score)| score > 0.0)
            .collect();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut results = SearchResults::default();
        for (doc_id, score) in ranked.into_iter().take(top_k) {
            match self.store.get(doc_id) {
                Some(record) => results.hits.push(SearchHit {
                    doc_id,
                    score,
                    title: record.title.clone(),
                    url: record.url.clone(),
                }),
                None => {
                    tracing::warn!(
                        doc_id,
                        "ranked document missing from the store; index artifacts are stale"
                    );
                    results.inconsistencies.push(doc_id);
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::build_artifacts;
    use crate::store::RawDoc;

    fn engine() -> QueryEngine {
        let mut store = DocStore::new();
        store.push_raw(RawDoc {
            title: Some("ocean waves".into()),
            url: Some("http://docs/0".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            text: Some("ocean current".into()),
            url: Some("http://docs/1".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            title: Some("mountain peak".into()),
            url: Some("http://docs/2".into()),
            ..RawDoc::default()
        });
        let artifacts = build_artifacts(&store);
        QueryEngine::new(artifacts.lexicon, artifacts.forward, artifacts.inverted, store)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn single_term_scores_and_ranks() {
        let engine = engine();
        let results = engine.search("ocean", DEFAULT_TOP_K, None).unwrap();
        assert!(results.inconsistencies.is_empty());
        assert_eq!(results.hits.len(), 2);
        // idf = log10(3/2); title weight 4 vs body weight 1
        assert_eq!(results.hits[0].doc_id, 0);
        assert!(close(results.hits[0].score, 0.704));
        assert_eq!(results.hits[1].doc_id, 1);
        assert!(close(results.hits[1].score, 0.176));
        assert_eq!(results.hits[0].url.as_deref(), Some("http://docs/0"));
    }

    #[test]
    fn stopword_only_query_is_a_defined_empty_result() {
        let engine = engine();
        let results = engine.search("the a of", DEFAULT_TOP_K, None).unwrap();
        assert!(results.hits.is_empty());
        assert!(results.inconsistencies.is_empty());
    }

    #[test]
    fn unique_term_gets_maximum_idf() {
        let engine = engine();
        let results = engine.search("mountain", DEFAULT_TOP_K, None).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].doc_id, 2);
        // weight 4 * log10(3/1)
        assert!(close(results.hits[0].score, 4.0 * 3f64.log10()));
    }

    #[test]
    fn multi_term_contributions_sum_per_document() {
        let engine = engine();
        let results = engine.search("ocean mountain", DEFAULT_TOP_K, None).unwrap();
        assert_eq!(results.hits.len(), 3);
        let by_doc: HashMap<DocId, f64> =
            results.hits.iter().map(|h| (h.doc_id, h.score)).collect();
        assert!(close(by_doc[&0], 4.0 * 1.5f64.log10()));
        assert!(close(by_doc[&1], 1.5f64.log10()));
        assert!(close(by_doc[&2], 4.0 * 3f64.log10()));
    }

    #[test]
    fn unresolvable_terms_do_not_poison_the_query() {
        let engine = engine();
        let with_noise = engine.search("ocean zeppelin", DEFAULT_TOP_K, None).unwrap();
        let clean = engine.search("ocean", DEFAULT_TOP_K, None).unwrap();
        assert_eq!(with_noise.hits.len(), clean.hits.len());
        for (a, b) in with_noise.hits.iter().zip(clean.hits.iter()) {
            assert_eq!(a.doc_id, b.doc_id);
            assert!(close(a.score, b.score));
        }
    }

    #[test]
    fn top_k_truncates_after_ranking() {
        let engine = engine();
        let results = engine.search("ocean", 1, None).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].doc_id, 0);
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let mut store = DocStore::new();
        for _ in 0..2 {
            store.push_raw(RawDoc {
                title: Some("ocean".into()),
                ..RawDoc::default()
            });
        }
        store.push_raw(RawDoc {
            title: Some("desert".into()),
            ..RawDoc::default()
        });
        let artifacts = build_artifacts(&store);
        let engine =
            QueryEngine::new(artifacts.lexicon, artifacts.forward, artifacts.inverted, store);
        let results = engine.search("ocean", DEFAULT_TOP_K, None).unwrap();
        let ids: Vec<DocId> = results.hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn term_in_every_document_ranks_nothing() {
        let mut store = DocStore::new();
        store.push_raw(RawDoc {
            title: Some("ocean alpha".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            title: Some("ocean beta".into()),
            ..RawDoc::default()
        });
        let artifacts = build_artifacts(&store);
        let engine =
            QueryEngine::new(artifacts.lexicon, artifacts.forward, artifacts.inverted, store);
        // idf = log10(2/2) = 0, so every accumulated score is zero
        let results = engine.search("ocean", DEFAULT_TOP_K, None).unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn cancelled_flag_aborts_the_search() {
        let engine = engine();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = engine.search("ocean", DEFAULT_TOP_K, Some(&cancel)).unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
    }

    #[test]
    fn stale_doc_ids_are_reported_not_fabricated() {
        let mut store = DocStore::new();
        store.push_raw(RawDoc {
            title: Some("ocean waves".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            title: Some("ocean deep".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            title: Some("mountain peak".into()),
            ..RawDoc::default()
        });
        let artifacts = build_artifacts(&store);
        // a store truncated after indexing: doc 1 is gone
        let mut truncated = DocStore::new();
        truncated.push_raw(RawDoc {
            title: Some("ocean waves".into()),
            ..RawDoc::default()
        });
        let engine = QueryEngine::new(
            artifacts.lexicon,
            artifacts.forward,
            artifacts.inverted,
            truncated,
        );
        let results = engine.search("ocean", DEFAULT_TOP_K, None).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].doc_id, 0);
        assert_eq!(results.inconsistencies, vec![1]);
    }
}
