//! ClinicalTrials.gov CUI Mapper
//!
//! Adds controlled-vocabulary concept identifiers (CUIs) to tab-delimited
//! ClinicalTrials.gov exports.
//!
//! For every data row:
//! - MeSH condition and intervention terms are mapped through an exact-match
//!   MeSH dictionary (one CUI per pipe-separated term)
//! - the free-text column is searched in a terminology index and the best
//!   MedDRA, SNOMED CT and MeSH codes are kept
//!
//! Misses are counted per vocabulary and per MeSH field, logged line by line to
//! a diagnostics file, and summarised in a report at the end of the run.
//!
//! Module layout:
//! - `utils/`: row field access and term handling
//! - `resolver/`: exact-match and fuzzy identifier resolution
//! - `terminology/`: search engine trait, timeout wrapper, lexicon index
//! - `pipeline`: row streaming, header rewrite and report hand-off

pub mod config;
pub mod diagnostics;
pub mod dictionary;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod stats;
pub mod terminology;
pub mod utils;
pub mod vocabulary;

// Re-export commonly used types
pub use config::{ColumnLayout, EnrichConfig};
pub use diagnostics::DiagnosticsLog;
pub use dictionary::MeshDictionary;
pub use error::{EnrichError, SearchError};
pub use extract::extract_column;
pub use pipeline::{run_files, CuiEnricher, RunSummary};
pub use report::Report;
pub use resolver::{select_codes, ExactMatchResolver, FuzzyResolver, Resolution};
pub use stats::{ExactField, RunStatistics};
pub use terminology::{
    Candidate, LexiconConcept, LexiconIndex, SearchMethod, SearchOptions, TerminologySearch,
    TimeoutSearch,
};
pub use utils::{Row, RowBuilder};
pub use vocabulary::VocabularySource;
