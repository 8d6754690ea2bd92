//! Run statistics
//!
//! Counters are owned by the pipeline and lent to the resolvers with `&mut`.
//! The report reads them once at the end of a run.

use rustc_hash::FxHashMap;

use crate::vocabulary::VocabularySource;

/// Which of the two exact-match MeSH fields a lookup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExactField {
    Condition,
    Intervention,
}

impl ExactField {
    pub fn column_label(self) -> &'static str {
        match self {
            ExactField::Condition => "msh_condition_CUI",
            ExactField::Intervention => "msh_intervention_CUI",
        }
    }
}

/// Miss counters and row totals for one run.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    rows: usize,
    padded_rows: usize,
    failed_lookups: usize,
    missing_by_source: FxHashMap<VocabularySource, usize>,
    missing_exact_condition: usize,
    missing_exact_intervention: usize,
}

impl RunStatistics {
    /// Counters start at zero for every target plus the "all missing" pseudo source.
    pub fn new(targets: &[VocabularySource]) -> Self {
        let mut missing_by_source = FxHashMap::default();
        for source in targets {
            missing_by_source.insert(source.clone(), 0);
        }
        missing_by_source.insert(VocabularySource::ALL_MISSING, 0);
        Self {
            missing_by_source,
            ..Self::default()
        }
    }

    pub fn record_row(&mut self) {
        self.rows += 1;
    }

    pub fn record_padded_row(&mut self) {
        self.padded_rows += 1;
    }

    pub fn record_failed_lookup(&mut self) {
        self.failed_lookups += 1;
    }

    pub fn record_missing_source(&mut self, source: &VocabularySource) {
        *self.missing_by_source.entry(source.clone()).or_insert(0) += 1;
    }

    pub fn record_all_missing(&mut self) {
        self.record_missing_source(&VocabularySource::ALL_MISSING);
    }

    pub fn record_missing_exact(&mut self, field: ExactField) {
        match field {
            ExactField::Condition => self.missing_exact_condition += 1,
            ExactField::Intervention => self.missing_exact_intervention += 1,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn padded_rows(&self) -> usize {
        self.padded_rows
    }

    pub fn failed_lookups(&self) -> usize {
        self.failed_lookups
    }

    pub fn missing_for(&self, source: &VocabularySource) -> usize {
        self.missing_by_source.get(source).copied().unwrap_or(0)
    }

    pub fn all_missing(&self) -> usize {
        self.missing_for(&VocabularySource::ALL_MISSING)
    }

    pub fn missing_exact(&self, field: ExactField) -> usize {
        match field {
            ExactField::Condition => self.missing_exact_condition,
            ExactField::Intervention => self.missing_exact_intervention,
        }
    }
}
