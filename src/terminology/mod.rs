//! Terminology search capability
//!
//! The fuzzy resolver only needs something that turns free text into an
//! ordered list of concept candidates. `TerminologySearch` is that seam:
//! `LexiconIndex` is the file-backed engine used by the CLI, `TimeoutSearch`
//! bounds any engine's call time, and tests plug in fixed fixtures.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::vocabulary::VocabularySource;

pub mod lexicon;
pub mod timeout;

pub use lexicon::{LexiconConcept, LexiconIndex};
pub use timeout::TimeoutSearch;

/// One ranked concept returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub codes: FxHashMap<VocabularySource, String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codes: FxHashMap::default(),
        }
    }

    pub fn with_code(mut self, source: VocabularySource, code: impl Into<String>) -> Self {
        self.codes.insert(source, code.into());
        self
    }

    pub fn code_for(&self, source: &VocabularySource) -> Option<&str> {
        self.codes.get(source).map(String::as_str)
    }
}

/// How the engine matches query text against concept labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMethod {
    #[default]
    BestMatch,
    AllMatch,
    PreciseMatch,
    PartialMatch,
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchMethod::BestMatch => "best-match",
            SearchMethod::AllMatch => "all-match",
            SearchMethod::PreciseMatch => "precise-match",
            SearchMethod::PartialMatch => "partial-match",
        })
    }
}

/// Engine options applied once before streaming starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub ignore_acronyms: bool,
    pub overlap_mode: bool,
    pub select_best_candidate: bool,
    pub default_search_method: SearchMethod,
    pub subsumption_mode: bool,
    pub filter_sources: Vec<VocabularySource>,
    pub filter_semantic_types: Vec<String>,
}

/// Semantic types the clinical-trial text search is restricted to.
pub const DEFAULT_SEMANTIC_TYPES: [&str; 22] = [
    "Event",
    "Pathologic Function",
    "Body Substance",
    "Functional Concept",
    "Mental or Behavioral Concept",
    "Mental or Behavioral Dysfunction",
    "Finding",
    "Sign or Symptom",
    "Individual Behavior",
    "Disease or Syndrome",
    "Mental Process",
    "Body Part, Organ, or Organ Component",
    "Therapeutic or Preventive Procedure",
    "Laboratory Procedure",
    "Tissue",
    "Pharmacological Substance",
    "Amino Acid, Peptide, or Protein",
    "Organic Chemical",
    "Body System",
    "Injury or Poisoning",
    "Cell",
    "Acquired Abnormality",
];

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignore_acronyms: false,
            overlap_mode: false,
            select_best_candidate: false,
            default_search_method: SearchMethod::BestMatch,
            subsumption_mode: false,
            filter_sources: vec![
                VocabularySource::MDR,
                VocabularySource::MSH,
                VocabularySource::SNOMEDCT_US,
            ],
            filter_semantic_types: DEFAULT_SEMANTIC_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SearchOptions {
    /// Options rendered as the engine reports them.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let sources: Vec<&str> = self.filter_sources.iter().map(|s| s.code()).collect();
        let mut props = BTreeMap::new();
        props.insert("ignore.acronyms".to_string(), self.ignore_acronyms.to_string());
        props.insert("overlap.mode".to_string(), self.overlap_mode.to_string());
        props.insert(
            "select.best.candidate".to_string(),
            self.select_best_candidate.to_string(),
        );
        props.insert(
            "default.search.method".to_string(),
            self.default_search_method.to_string(),
        );
        props.insert("subsumption.mode".to_string(), self.subsumption_mode.to_string());
        props.insert("source.filter".to_string(), sources.join(";"));
        props.insert(
            "semantic.type.filter".to_string(),
            self.filter_semantic_types.join(";"),
        );
        props
    }
}

/// Free text → ranked concept candidates, highest confidence first.
pub trait TerminologySearch {
    fn configure(&mut self, options: &SearchOptions) -> Result<(), SearchError>;

    /// An empty list means "no match"; `Err` means the engine itself failed.
    fn search(&self, text: &str) -> Result<Vec<Candidate>, SearchError>;

    /// Active configuration, reported verbatim.
    fn active_configuration(&self) -> BTreeMap<String, String>;
}
