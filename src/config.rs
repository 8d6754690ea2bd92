//! Run configuration
//!
//! Column positions, delimiter, output naming and terminology options for an
//! enrichment run. Every field has a default matching the ClinicalTrials.gov
//! v3 export, so a config file only needs to name what differs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EnrichError, Result};
use crate::terminology::SearchOptions;
use crate::vocabulary::{default_targets, VocabularySource};

/// Zero-based positions of the columns the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub text: usize,
    pub condition: usize,
    pub intervention: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            text: 1,
            condition: 7,
            intervention: 8,
        }
    }
}

impl ColumnLayout {
    /// Highest column index the pipeline reads.
    pub fn max_index(&self) -> usize {
        self.text.max(self.condition).max(self.intervention)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub columns: ColumnLayout,
    pub delimiter: char,
    /// Suffix appended to the input path to name the output file.
    pub output_suffix: String,
    /// Diagnostics file; defaults to `missingCUIs.txt` beside the output.
    pub diagnostics_path: Option<PathBuf>,
    pub targets: Vec<VocabularySource>,
    pub search: SearchOptions,
    /// Per-row bound on a terminology search, in milliseconds.
    pub search_timeout_ms: Option<u64>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            columns: ColumnLayout::default(),
            delimiter: '\t',
            output_suffix: "_CUIs_v3.csv".to_string(),
            diagnostics_path: None,
            targets: default_targets(),
            search: SearchOptions::default(),
            search_timeout_ms: Some(30_000),
        }
    }
}

impl EnrichConfig {
    /// Load configuration from a JSON file, filling omitted fields with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| EnrichError::io(path, e))?;

        let config: EnrichConfig = serde_json::from_str(&contents)
            .map_err(|e| EnrichError::Config(format!("{:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.columns;
        if c.text == c.condition || c.text == c.intervention || c.condition == c.intervention {
            return Err(EnrichError::Config(format!(
                "text, condition and intervention columns must differ (got {}, {}, {})",
                c.text, c.condition, c.intervention
            )));
        }
        if self.targets.is_empty() {
            return Err(EnrichError::Config("at least one target vocabulary is required".into()));
        }
        if self.delimiter == '|' || self.delimiter == '\n' {
            return Err(EnrichError::Config(format!(
                "{:?} cannot be used as the field delimiter",
                self.delimiter
            )));
        }
        if self.output_suffix.is_empty() {
            return Err(EnrichError::Config("output suffix must not be empty".into()));
        }
        Ok(())
    }

    /// `<input><suffix>`, e.g. `trials.csv_CUIs_v3.csv`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut name = input.as_os_str().to_os_string();
        name.push(&self.output_suffix);
        PathBuf::from(name)
    }

    /// `<output>_report.txt`.
    pub fn report_path(&self, output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push("_report.txt");
        PathBuf::from(name)
    }

    pub fn diagnostics_path(&self, output: &Path) -> PathBuf {
        match &self.diagnostics_path {
            Some(path) => path.clone(),
            None => output
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("missingCUIs.txt"),
        }
    }
}
