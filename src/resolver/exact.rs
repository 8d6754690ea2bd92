//! Exact-match resolver for MeSH condition/intervention fields
//!
//! Each pipe-separated term is lowercased and looked up in the MeSH
//! dictionary. The output cell holds one identifier per input term, in input
//! order, with empty strings for terms the dictionary does not know.

use std::io::Write;

use smallvec::SmallVec;

use crate::diagnostics::DiagnosticsLog;
use crate::dictionary::MeshDictionary;
use crate::error::Result;
use crate::stats::{ExactField, RunStatistics};
use crate::utils::terms::{join_terms, split_terms};

pub struct ExactMatchResolver<'d> {
    dictionary: &'d MeshDictionary,
}

impl<'d> ExactMatchResolver<'d> {
    pub fn new(dictionary: &'d MeshDictionary) -> Self {
        Self { dictionary }
    }

    /// Per-term identifiers for a multi-term field; `None` where unknown.
    pub fn lookup_terms<'a>(&self, value: &'a str) -> SmallVec<[(&'a str, Option<&'d str>); 8]> {
        let dictionary = self.dictionary;
        split_terms(value)
            .into_iter()
            .map(|term| (term, dictionary.get(&term.to_lowercase())))
            .collect()
    }

    /// Resolve one field into its identifier cell.
    ///
    /// Every unknown non-blank term is logged and counted against `field`.
    /// Blank terms still occupy a slot in the output but are not misses.
    pub fn resolve<W: Write>(
        &self,
        value: &str,
        field: ExactField,
        stats: &mut RunStatistics,
        log: &mut DiagnosticsLog<W>,
    ) -> Result<String> {
        let mut cuis: SmallVec<[&str; 8]> = SmallVec::new();

        for (term, cui) in self.lookup_terms(value) {
            match cui {
                Some(cui) => cuis.push(cui),
                None => {
                    cuis.push("");
                    if !term.trim().is_empty() {
                        log.no_exact_match(term)?;
                        stats.record_missing_exact(field);
                    }
                }
            }
        }

        Ok(join_terms(&cuis))
    }
}
