//! Fuzzy resolver for the free-text column
//!
//! Sends the text to the terminology engine and picks one code per target
//! vocabulary from the ranked candidates. Earlier candidates are trusted more,
//! so the first candidate carrying a code for a vocabulary wins, unless a
//! later candidate's name equals the query text (ignoring case), which always
//! takes over.
//!
//! Engine failures do not stop the run: the row gets the same empty cells as a
//! query with no candidates, and the failure is logged.

use std::io::Write;

use crate::diagnostics::DiagnosticsLog;
use crate::error::Result;
use crate::stats::RunStatistics;
use crate::terminology::{Candidate, TerminologySearch};
use crate::utils::terms::TERM_SEPARATOR;
use crate::vocabulary::VocabularySource;

/// Outcome for one target vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { code: String, name: String },
    Missing,
}

impl Resolution {
    /// Output cell: `code|name`, or empty when missing.
    pub fn to_cell(&self) -> String {
        match self {
            Resolution::Found { code, name } => format!("{}{}{}", code, TERM_SEPARATOR, name),
            Resolution::Missing => String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing)
    }
}

fn same_name(query: &str, name: &str) -> bool {
    query.to_lowercase() == name.to_lowercase()
}

/// Pick one code per target from ranked candidates.
///
/// Only candidates that actually carry a code for the vocabulary are
/// considered. Among those the first one is kept, and every candidate whose
/// name equals `query` replaces whatever was kept before it.
pub fn select_codes(
    query: &str,
    candidates: &[Candidate],
    targets: &[VocabularySource],
) -> Vec<Resolution> {
    targets
        .iter()
        .map(|source| {
            let mut kept: Option<(&str, &str)> = None;
            for candidate in candidates {
                if let Some(code) = candidate.code_for(source) {
                    if kept.is_none() || same_name(query, &candidate.name) {
                        kept = Some((code, candidate.name.as_str()));
                    }
                }
            }
            match kept {
                Some((code, name)) => Resolution::Found {
                    code: code.to_string(),
                    name: name.to_string(),
                },
                None => Resolution::Missing,
            }
        })
        .collect()
}

pub struct FuzzyResolver<'a, S: TerminologySearch + ?Sized> {
    search: &'a S,
    targets: &'a [VocabularySource],
}

impl<'a, S: TerminologySearch + ?Sized> FuzzyResolver<'a, S> {
    pub fn new(search: &'a S, targets: &'a [VocabularySource]) -> Self {
        Self { search, targets }
    }

    pub fn targets(&self) -> &[VocabularySource] {
        self.targets
    }

    /// Resolve the text into one cell per target vocabulary, in target order.
    pub fn resolve<W: Write>(
        &self,
        text: &str,
        stats: &mut RunStatistics,
        log: &mut DiagnosticsLog<W>,
    ) -> Result<Vec<String>> {
        let resolutions = match self.search.search(text) {
            Ok(candidates) if candidates.is_empty() => {
                log.no_concepts(text)?;
                vec![Resolution::Missing; self.targets.len()]
            }
            Ok(candidates) => select_codes(text, &candidates, self.targets),
            Err(error) => {
                tracing::warn!("Terminology lookup failed for {:?}: {}", text, error);
                stats.record_failed_lookup();
                log.lookup_failed(text, &error)?;
                vec![Resolution::Missing; self.targets.len()]
            }
        };

        let mut missing = 0;
        for (source, resolution) in self.targets.iter().zip(&resolutions) {
            if resolution.is_missing() {
                stats.record_missing_source(source);
                missing += 1;
            }
        }
        if !self.targets.is_empty() && missing == self.targets.len() {
            stats.record_all_missing();
        }

        Ok(resolutions.iter().map(Resolution::to_cell).collect())
    }
}
