//! File-backed terminology index
//!
//! A small in-memory concept index loaded from a JSON lexicon export. Each
//! concept carries a preferred name, synonyms, semantic types and its codes
//! per vocabulary. Matching works on normalized tokens:
//! - precise-match: a label equals the query
//! - best-match / all-match: every token of a label occurs in the query
//! - partial-match: at least one label token occurs in the query
//!
//! Every label token maps to the concepts carrying it, so a query only scores
//! concepts that share at least one token with it.
//!
//! Candidates are ranked by score (exact label first, then by how much of the
//! query the label covers) and ties are broken by name so runs are
//! reproducible. Overlap mode is accepted and reported but has no effect on
//! this index.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EnrichError, Result, SearchError};
use crate::terminology::{Candidate, SearchMethod, SearchOptions, TerminologySearch};
use crate::utils::terms::{looks_like_acronym, normalize_text, tokens};
use crate::vocabulary::VocabularySource;

const EXACT_SCORE: f64 = 2.0;

/// One concept as stored in the lexicon file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconConcept {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub semantic_types: Vec<String>,
    #[serde(default)]
    pub codes: BTreeMap<VocabularySource, String>,
}

#[derive(Debug)]
struct Label {
    raw: String,
    normalized: String,
}

#[derive(Debug)]
struct IndexedConcept {
    concept: LexiconConcept,
    labels: Vec<Label>,
}

#[derive(Debug)]
struct Scored<'a> {
    concept: &'a LexiconConcept,
    score: f64,
    matched: BTreeSet<String>,
}

pub struct LexiconIndex {
    /// All concepts (indexed by position)
    concepts: Vec<IndexedConcept>,
    /// Reverse lookup: label token -> concept indices, ascending
    token_to_indices: FxHashMap<String, SmallVec<[usize; 4]>>,
    options: SearchOptions,
}

impl LexiconIndex {
    pub fn new(concepts: Vec<LexiconConcept>) -> Self {
        let concepts: Vec<IndexedConcept> = concepts
            .into_iter()
            .map(|concept| {
                let labels = std::iter::once(&concept.name)
                    .chain(concept.synonyms.iter())
                    .map(|raw| Label {
                        raw: raw.clone(),
                        normalized: normalize_text(raw),
                    })
                    .filter(|label| !label.normalized.is_empty())
                    .collect();
                IndexedConcept { concept, labels }
            })
            .collect();

        let mut token_to_indices: FxHashMap<String, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (index, indexed) in concepts.iter().enumerate() {
            for label in &indexed.labels {
                for token in tokens(&label.normalized) {
                    let indices = token_to_indices.entry(token.to_string()).or_default();
                    // Concepts are visited in order, so a repeat is always last
                    if indices.last() != Some(&index) {
                        indices.push(index);
                    }
                }
            }
        }

        Self {
            concepts,
            token_to_indices,
            options: SearchOptions::default(),
        }
    }

    /// Load a lexicon from a JSON array of concepts.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EnrichError::io(path, e))?;
        let concepts: Vec<LexiconConcept> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EnrichError::Lexicon {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!("Loaded terminology lexicon: {} concepts from {:?}", concepts.len(), path);
        Ok(Self::new(concepts))
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Concepts sharing at least one token with the query, ascending.
    ///
    /// Every match method needs a shared token (an exact label shares all of
    /// them), so nothing outside this set can score.
    fn concepts_sharing_token(&self, query_tokens: &FxHashSet<&str>) -> Vec<usize> {
        let mut indices: Vec<usize> = query_tokens
            .iter()
            .filter_map(|token| self.token_to_indices.get(*token))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    fn passes_semantic_filter(&self, concept: &LexiconConcept) -> bool {
        let filter = &self.options.filter_semantic_types;
        filter.is_empty() || concept.semantic_types.iter().any(|t| filter.contains(t))
    }

    fn filtered_codes(&self, concept: &LexiconConcept) -> Vec<(VocabularySource, String)> {
        let filter = &self.options.filter_sources;
        concept
            .codes
            .iter()
            .filter(|(source, _)| filter.is_empty() || filter.contains(source))
            .map(|(source, code)| (source.clone(), code.clone()))
            .collect()
    }

    /// Best label score for one concept, with the query tokens it matched.
    fn score_concept(
        &self,
        indexed: &IndexedConcept,
        query: &str,
        query_tokens: &FxHashSet<&str>,
    ) -> Option<(f64, BTreeSet<String>)> {
        let mut best: Option<(f64, BTreeSet<String>)> = None;

        for label in &indexed.labels {
            if self.options.ignore_acronyms && looks_like_acronym(&label.raw) {
                continue;
            }

            let label_tokens = tokens(&label.normalized);
            let matched: BTreeSet<String> = label_tokens
                .iter()
                .filter(|t| query_tokens.contains(*t))
                .map(|t| t.to_string())
                .collect();

            let score = if label.normalized == query {
                EXACT_SCORE
            } else {
                let hit_ratio = matched.len() as f64 / label_tokens.len() as f64;
                let coverage = matched.len() as f64 / query_tokens.len().max(1) as f64;
                match self.options.default_search_method {
                    SearchMethod::PreciseMatch => continue,
                    SearchMethod::BestMatch | SearchMethod::AllMatch => {
                        if matched.len() < label_tokens.len() {
                            continue;
                        }
                        0.5 + 0.5 * coverage.min(1.0)
                    }
                    SearchMethod::PartialMatch => {
                        if matched.is_empty() {
                            continue;
                        }
                        0.5 * hit_ratio * coverage.min(1.0)
                    }
                }
            };

            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, matched));
            }
        }

        best
    }
}

impl TerminologySearch for LexiconIndex {
    fn configure(&mut self, options: &SearchOptions) -> std::result::Result<(), SearchError> {
        self.options = options.clone();
        Ok(())
    }

    fn search(&self, text: &str) -> std::result::Result<Vec<Candidate>, SearchError> {
        let query = normalize_text(text);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let query_tokens: FxHashSet<&str> = tokens(&query).into_iter().collect();

        let mut scored: Vec<Scored<'_>> = Vec::new();
        for index in self.concepts_sharing_token(&query_tokens) {
            let indexed = &self.concepts[index];
            if !self.passes_semantic_filter(&indexed.concept) {
                continue;
            }
            if let Some((score, matched)) = self.score_concept(indexed, &query, &query_tokens) {
                scored.push(Scored {
                    concept: &indexed.concept,
                    score,
                    matched,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.concept.name.cmp(&b.concept.name))
        });

        if self.options.default_search_method == SearchMethod::BestMatch {
            if let Some(top) = scored.first().map(|s| s.score) {
                scored.retain(|s| s.score * 2.0 >= top);
            }
        }

        if self.options.subsumption_mode {
            let matched_sets: Vec<BTreeSet<String>> =
                scored.iter().map(|s| s.matched.clone()).collect();
            scored.retain(|s| {
                !matched_sets
                    .iter()
                    .any(|other| s.matched.len() < other.len() && s.matched.is_subset(other))
            });
        }

        let mut candidates: Vec<Candidate> = scored
            .into_iter()
            .filter_map(|s| {
                let codes = self.filtered_codes(s.concept);
                if codes.is_empty() {
                    return None;
                }
                Some(Candidate {
                    name: s.concept.name.clone(),
                    codes: codes.into_iter().collect(),
                })
            })
            .collect();

        if self.options.select_best_candidate {
            candidates.truncate(1);
        }

        Ok(candidates)
    }

    fn active_configuration(&self) -> BTreeMap<String, String> {
        let mut props = self.options.to_properties();
        props.insert("concepts".to_string(), self.concepts.len().to_string());
        props
    }
}
