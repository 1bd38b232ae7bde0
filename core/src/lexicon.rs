use crate::store::DocStore;
use crate::text::{is_stopword, lemma, tokenize};
use crate::TermId;
use std::collections::HashMap;

/// Bidirectional term dictionary. Every distinct surface form and every
/// distinct lemma root that survives stop-word filtering holds exactly one
/// id, assigned in first-seen order and never renumbered. Immutable once a
/// corpus has been scanned.
#[derive(Debug, Default)]
pub struct Lexicon {
    ids: HashMap<String, TermId>,
    terms: Vec<Option<String>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the corpus: documents in order, fields in title, authors, tags,
    /// text order. For each surviving token the lemma root is interned
    /// first, then the surface form, so id assignment is reproducible for a
    /// fixed corpus.
    pub fn build(store: &DocStore) -> Self {
        let mut lexicon = Self::default();
        for doc in store.iter() {
            for field in doc.fields() {
                for token in tokenize(field) {
                    if is_stopword(&token) {
                        continue;
                    }
                    lexicon.intern(lemma(&token));
                    lexicon.intern(token);
                }
            }
        }
        lexicon
    }

    fn intern(&mut self, term: String) -> TermId {
        if let Some(&id) = self.ids.get(&term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.ids.insert(term.clone(), id);
        self.terms.push(Some(term));
        id
    }

    /// Bind `term` to `id` while reloading a persisted table. Rows may
    /// arrive in any order; a term or id that is already bound is rejected.
    pub(crate) fn insert_at(&mut self, term: String, id: TermId) -> bool {
        let idx = id as usize;
        if self.ids.contains_key(&term) || self.terms.get(idx).is_some_and(Option::is_some) {
            return false;
        }
        if idx >= self.terms.len() {
            self.terms.resize(idx + 1, None);
        }
        self.terms[idx] = Some(term.clone());
        self.ids.insert(term, id);
        true
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> {
        self.ids.iter().map(|(term, &id)| (term.as_str(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocStore, RawDoc};

    fn store_of(titles: &[&str]) -> DocStore {
        let mut store = DocStore::new();
        for title in titles {
            store.push_raw(RawDoc {
                title: Some((*title).to_string()),
                ..RawDoc::default()
            });
        }
        store
    }

    #[test]
    fn interns_lemma_before_surface_form() {
        let lexicon = Lexicon::build(&store_of(&["waves"]));
        // "wave" (root) is seen before "waves" (surface)
        assert_eq!(lexicon.id("wave"), Some(0));
        assert_eq!(lexicon.id("waves"), Some(1));
        assert_eq!(lexicon.len(), 2);
    }

    #[test]
    fn coinciding_lemma_and_surface_share_one_id() {
        let lexicon = Lexicon::build(&store_of(&["ocean"]));
        assert_eq!(lexicon.id("ocean"), Some(0));
        assert_eq!(lexicon.len(), 1);
    }

    #[test]
    fn stopwords_never_receive_ids() {
        let lexicon = Lexicon::build(&store_of(&["the ocean of it"]));
        assert_eq!(lexicon.id("the"), None);
        assert_eq!(lexicon.id("of"), None);
        assert_eq!(lexicon.id("it"), None);
        assert!(lexicon.id("ocean").is_some());
    }

    #[test]
    fn rebuild_yields_identical_ids() {
        let store = store_of(&["ocean waves", "mountain current waves"]);
        let a = Lexicon::build(&store);
        let b = Lexicon::build(&store);
        for (term, id) in a.iter() {
            assert_eq!(b.id(term), Some(id));
        }
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn reverse_lookup_round_trips() {
        let lexicon = Lexicon::build(&store_of(&["mountain peak"]));
        let id = lexicon.id("mountain").unwrap();
        assert_eq!(lexicon.term(id), Some("mountain"));
        assert_eq!(lexicon.term(999), None);
    }

    #[test]
    fn insert_at_rejects_double_bindings() {
        let mut lexicon = Lexicon::new();
        assert!(lexicon.insert_at("ocean".into(), 3));
        assert!(!lexicon.insert_at("ocean".into(), 7));
        assert!(!lexicon.insert_at("sea".into(), 3));
        assert_eq!(lexicon.term(3), Some("ocean"));
        assert_eq!(lexicon.len(), 1);
    }
}
