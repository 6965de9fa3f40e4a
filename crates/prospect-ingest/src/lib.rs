//! Prospect Ingest — text canonicalization and keyword extraction.
//!
//! Turns heterogeneous provider entities into stable embedding text and
//! searchable keyword sets.

pub mod canonical;
pub mod keywords;
pub mod summary;

pub use canonical::{canonicalize, truncate_chars};
pub use keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT, MAX_KEYWORD_LIMIT};
pub use summary::semantic_summary;
