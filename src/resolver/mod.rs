//! Identifier resolvers
//!
//! - `exact`: dictionary lookup of MeSH condition/intervention terms
//! - `fuzzy`: ranked terminology search of the free-text column

pub mod exact;
pub mod fuzzy;

pub use exact::ExactMatchResolver;
pub use fuzzy::{select_codes, FuzzyResolver, Resolution};
