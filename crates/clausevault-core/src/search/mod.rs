//! Retrieval engines: semantic, keyword, and hybrid.
//!
//! All three operate over tenant-scoped chunk sets supplied by a
//! [`VectorIndexStore`](crate::store::VectorIndexStore) implementation; none
//! of them touch storage directly. Semantic search is an exact linear scan
//! over the candidate set, which is the documented scalability boundary of
//! this design: the store abstraction exists so an approximate index can be
//! substituted later without touching the ranking rules here.

pub mod hybrid;
pub mod keyword;
pub mod semantic;

pub use hybrid::merge;
pub use keyword::keyword_search;
pub use semantic::{semantic_search, SemanticOutcome};
