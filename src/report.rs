//! End-of-run report
//!
//! Plain-text summary written once after the last row: row count, the
//! terminology engine's active configuration, missing text CUIs per
//! vocabulary, and missing exact MeSH matches per field.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{EnrichError, Result};
use crate::stats::{ExactField, RunStatistics};
use crate::vocabulary::VocabularySource;

pub struct Report<'a> {
    stats: &'a RunStatistics,
    targets: &'a [VocabularySource],
    search_properties: &'a BTreeMap<String, String>,
    generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(
        stats: &'a RunStatistics,
        targets: &'a [VocabularySource],
        search_properties: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            stats,
            targets,
            search_properties,
            generated_at: Utc::now(),
        }
    }

    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Rows: {}", self.stats.rows())?;
        writeln!(out)?;

        writeln!(out, "Terminology search properties....")?;
        for (key, value) in self.search_properties {
            writeln!(out, "\t{}: {}", key, value)?;
        }

        writeln!(out)?;
        writeln!(out, "Missing text CUIs....")?;
        for source in self.targets {
            writeln!(out, "{}: {}", source, self.stats.missing_for(source))?;
        }
        writeln!(out, "{}: {}", VocabularySource::ALL_MISSING, self.stats.all_missing())?;

        writeln!(out)?;
        writeln!(out, "Missing exact MSH matches....")?;
        writeln!(
            out,
            "Missing exact MSH Conditions: {}",
            self.stats.missing_exact(ExactField::Condition)
        )?;
        writeln!(
            out,
            "Missing exact MSH Interventions: {}",
            self.stats.missing_exact(ExactField::Intervention)
        )?;

        writeln!(out)?;
        writeln!(out, "Run notes....")?;
        writeln!(out, "Rows padded to header width: {}", self.stats.padded_rows())?;
        writeln!(out, "Failed terminology lookups: {}", self.stats.failed_lookups())?;
        writeln!(
            out,
            "Generated: {}",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|e| EnrichError::io(path, e))?;
        tracing::info!("Report written to {:?}", path);
        Ok(())
    }
}
