//! Diagnostics log of unresolved lookups
//!
//! Write-only sink. One line per event, in the order events happen, so exact
//! and fuzzy misses interleave exactly as the rows were processed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{EnrichError, Result, SearchError};

pub struct DiagnosticsLog<W: Write> {
    sink: W,
    events: usize,
}

impl DiagnosticsLog<BufWriter<File>> {
    /// Create (or truncate) the diagnostics file for a fresh run.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| EnrichError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DiagnosticsLog<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, events: 0 }
    }

    /// Header line recording how the terminology engine was configured.
    pub fn search_properties(&mut self, properties: &BTreeMap<String, String>) -> Result<()> {
        let rendered: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        writeln!(self.sink, "{{{}}}", rendered.join(", "))?;
        Ok(())
    }

    pub fn no_exact_match(&mut self, term: &str) -> Result<()> {
        tracing::debug!(term, "no exact MeSH match");
        self.event(format_args!("MESH: No exact match for \"{}\"", term))
    }

    pub fn no_concepts(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "no terminology candidates");
        self.event(format_args!("{} not found in terminology index.", text))
    }

    pub fn lookup_failed(&mut self, text: &str, error: &SearchError) -> Result<()> {
        tracing::debug!(text, %error, "terminology lookup failed");
        self.event(format_args!("{} lookup failed: {}", text, error))
    }

    /// Number of events written so far.
    pub fn events(&self) -> usize {
        self.events
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn event(&mut self, line: std::fmt::Arguments<'_>) -> Result<()> {
        self.sink.write_fmt(line)?;
        self.sink.write_all(b"\n")?;
        self.events += 1;
        Ok(())
    }
}
