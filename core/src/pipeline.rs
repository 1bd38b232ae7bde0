//! Index construction pipeline.
//!
//! The lexicon scan is the single-threaded prerequisite stage: id
//! assignment depends on first-seen order, so it runs alone and acts as a
//! barrier. The two downstream builders only ever read the corpus and the
//! finished lexicon, so they run in parallel.

use crate::forward::ForwardIndex;
use crate::inverted::InvertedIndex;
use crate::lexicon::Lexicon;
use crate::store::DocStore;

/// The three index artifacts for one corpus snapshot. Published immutably;
/// the query engine and any number of concurrent readers share them as-is.
pub struct IndexArtifacts {
    pub lexicon: Lexicon,
    pub forward: ForwardIndex,
    pub inverted: InvertedIndex,
}

pub fn build_artifacts(store: &DocStore) -> IndexArtifacts {
    let lexicon = Lexicon::build(store);
    tracing::info!(docs = store.len(), terms = lexicon.len(), "lexicon built");

    let (forward, inverted) = rayon::join(
        || ForwardIndex::build(store, &lexicon),
        || InvertedIndex::build(store, &lexicon),
    );
    tracing::info!(
        forward_docs = forward.doc_count(),
        posting_terms = inverted.term_count(),
        "index build complete"
    );

    IndexArtifacts {
        lexicon,
        forward,
        inverted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RawDoc;

    #[test]
    fn artifacts_cover_the_whole_corpus() {
        let mut store = DocStore::new();
        store.push_raw(RawDoc {
            title: Some("ocean waves".into()),
            ..RawDoc::default()
        });
        store.push_raw(RawDoc {
            text: Some("ocean current".into()),
            ..RawDoc::default()
        });
        let artifacts = build_artifacts(&store);
        assert_eq!(artifacts.forward.doc_count(), 2);
        let ocean = artifacts.lexicon.id("ocean").unwrap();
        assert_eq!(artifacts.inverted.postings(ocean).unwrap(), &[0, 1]);
    }
}
