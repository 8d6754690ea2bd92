//! Utility modules for CUI enrichment
//!
//! Contains shared functionality used across the resolvers and the pipeline:
//! - Row: positional field access and append-only row assembly
//! - Terms: pipe-separated term handling and text normalization

pub mod row;
pub mod terms;

// Re-export commonly used types
pub use row::{Row, RowBuilder};
pub use terms::{join_terms, normalize_text, split_terms, TERM_SEPARATOR};
