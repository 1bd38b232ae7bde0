pub mod forward;
pub mod inverted;
pub mod lexicon;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod text;

pub type TermId = u32;
pub type DocId = u32;
/// Field-weighted term frequency. Stored postings always carry weight > 0.
pub type Weight = u32;

pub use forward::ForwardIndex;
pub use inverted::InvertedIndex;
pub use lexicon::Lexicon;
pub use pipeline::{build_artifacts, IndexArtifacts};
pub use query::{CancelFlag, QueryEngine, QueryError, SearchHit, SearchResults};
pub use store::{DocRecord, DocStore, RawDoc};
