//! Vocabulary sources
//!
//! A source is identified by its string code alone, so two values built from
//! the same code compare and hash equal wherever they were created.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A controlled vocabulary, e.g. `MDR` or `SNOMEDCT_US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularySource(Cow<'static, str>);

impl VocabularySource {
    pub const MDR: VocabularySource = VocabularySource(Cow::Borrowed("MDR"));
    pub const SNOMEDCT_US: VocabularySource = VocabularySource(Cow::Borrowed("SNOMEDCT_US"));
    pub const MSH: VocabularySource = VocabularySource(Cow::Borrowed("MSH"));
    /// Pseudo source counting rows where every target vocabulary missed.
    pub const ALL_MISSING: VocabularySource = VocabularySource(Cow::Borrowed("All missing"));

    pub fn new(code: impl Into<String>) -> Self {
        VocabularySource(Cow::Owned(code.into()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Header label for the identifier column fed by this source.
    pub fn column_label(&self) -> String {
        match self.code() {
            "MDR" => "text_MedDRA_CUI".to_string(),
            "SNOMEDCT_US" => "text_SNOMED_CT_CUI".to_string(),
            "MSH" => "text_MeSH_CUI".to_string(),
            other => format!("text_{}_CUI", other),
        }
    }
}

impl fmt::Display for VocabularySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VocabularySource {
    fn from(code: &str) -> Self {
        VocabularySource::new(code)
    }
}

/// Vocabularies the fuzzy resolver fills, in output column order.
pub fn default_targets() -> Vec<VocabularySource> {
    vec![
        VocabularySource::MDR,
        VocabularySource::SNOMEDCT_US,
        VocabularySource::MSH,
    ]
}
