//! CUI enrichment pipeline
//!
//! Streams a delimited clinical-trial table and adds five identifier columns:
//! - `msh_condition_CUI` right after the MeSH condition column
//! - `msh_intervention_CUI` right after the MeSH intervention column
//! - one `text_*_CUI` column per target vocabulary right after the text column
//!
//! The header and every data row go through the same `splice` so labels and
//! values can never drift apart. Rows are processed strictly one at a time and
//! written in input order; a fatal error stops the run before the current row
//! is written.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::EnrichConfig;
use crate::diagnostics::DiagnosticsLog;
use crate::dictionary::MeshDictionary;
use crate::error::{EnrichError, Result};
use crate::report::Report;
use crate::resolver::{ExactMatchResolver, FuzzyResolver};
use crate::stats::{ExactField, RunStatistics};
use crate::terminology::TerminologySearch;
use crate::utils::row::{Row, RowBuilder};

const PROGRESS_EVERY: usize = 10_000;

/// Cells added to one row, before they are spliced in.
struct AddedCells {
    text: Vec<String>,
    condition: String,
    intervention: String,
}

pub struct CuiEnricher<'a, S: TerminologySearch + ?Sized> {
    config: &'a EnrichConfig,
    exact: ExactMatchResolver<'a>,
    fuzzy: FuzzyResolver<'a, S>,
}

impl<'a, S: TerminologySearch + ?Sized> CuiEnricher<'a, S> {
    pub fn new(config: &'a EnrichConfig, dictionary: &'a MeshDictionary, search: &'a S) -> Self {
        Self {
            config,
            exact: ExactMatchResolver::new(dictionary),
            fuzzy: FuzzyResolver::new(search, &config.targets),
        }
    }

    /// Number of columns the pipeline adds to every row.
    pub fn added_columns(&self) -> usize {
        self.config.targets.len() + 2
    }

    /// Header with the new column labels in place.
    pub fn enrich_header(&self, header: &Row) -> Result<Row> {
        let needed = self.config.columns.max_index() + 1;
        if header.len() < needed {
            return Err(EnrichError::Column {
                index: self.config.columns.max_index(),
                len: header.len(),
            });
        }

        let cells = AddedCells {
            text: self
                .config
                .targets
                .iter()
                .map(|source| source.column_label())
                .collect(),
            condition: ExactField::Condition.column_label().to_string(),
            intervention: ExactField::Intervention.column_label().to_string(),
        };
        Ok(self.splice(header, cells))
    }

    /// Resolve and splice one data row.
    ///
    /// Rows shorter than the header are padded with empty fields first.
    /// Resolution order is intervention, condition, then text, which is also
    /// the order their diagnostics appear in.
    pub fn enrich_row<W: Write>(
        &self,
        mut row: Row,
        header_len: usize,
        stats: &mut RunStatistics,
        log: &mut DiagnosticsLog<W>,
    ) -> Result<Row> {
        let padded = row.pad_to(header_len);
        if padded > 0 {
            tracing::warn!(
                "Row {} has {} fields, padded to header width {}",
                stats.rows() + 1,
                header_len - padded,
                header_len
            );
            stats.record_padded_row();
        }

        let columns = self.config.columns;
        let intervention = self.exact.resolve(
            field(&row, columns.intervention)?,
            ExactField::Intervention,
            stats,
            log,
        )?;
        let condition = self.exact.resolve(
            field(&row, columns.condition)?,
            ExactField::Condition,
            stats,
            log,
        )?;
        let text = self.fuzzy.resolve(field(&row, columns.text)?, stats, log)?;

        Ok(self.splice(
            &row,
            AddedCells {
                text,
                condition,
                intervention,
            },
        ))
    }

    /// Rebuild `row` with the added cells after their source columns.
    fn splice(&self, row: &Row, cells: AddedCells) -> Row {
        let columns = self.config.columns;
        let mut builder = RowBuilder::with_capacity(row.len() + self.added_columns());
        let mut text = Some(cells.text);
        let mut condition = Some(cells.condition);
        let mut intervention = Some(cells.intervention);

        for (index, value) in row.fields().iter().enumerate() {
            builder.push(value.as_str());
            if index == columns.text {
                builder.extend(text.take().unwrap_or_default());
            }
            if index == columns.condition {
                builder.push(condition.take().unwrap_or_default());
            }
            if index == columns.intervention {
                builder.push(intervention.take().unwrap_or_default());
            }
        }

        builder.build()
    }

    /// Stream every row from `input` to `output`.
    ///
    /// Empty lines are skipped; a line of bare delimiters is a row of empty
    /// fields and is enriched like any other. Returns the run's counters; the caller decides
    /// where the report goes.
    pub fn run<R: BufRead, O: Write, W: Write>(
        &self,
        input: R,
        mut output: O,
        log: &mut DiagnosticsLog<W>,
    ) -> Result<RunStatistics> {
        let delimiter = self.config.delimiter;
        let mut stats = RunStatistics::new(&self.config.targets);
        let mut lines = input.lines();

        let header_line = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    if !is_blank(&line) {
                        break line;
                    }
                }
                None => return Err(EnrichError::EmptyInput),
            }
        };
        let header = Row::parse(&header_line, delimiter);
        let header_len = header.len();
        writeln!(output, "{}", self.enrich_header(&header)?.to_line(delimiter))?;

        for line in lines {
            let line = line?;
            if is_blank(&line) {
                continue;
            }
            let row = Row::parse(&line, delimiter);
            let enriched = self.enrich_row(row, header_len, &mut stats, log)?;
            writeln!(output, "{}", enriched.to_line(delimiter))?;
            stats.record_row();

            if stats.rows() % PROGRESS_EVERY == 0 {
                tracing::info!("Processed {} rows", stats.rows());
            }
        }

        output.flush()?;
        log.flush()?;
        Ok(stats)
    }
}

fn is_blank(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line).is_empty()
}

fn field(row: &Row, index: usize) -> Result<&str> {
    row.get(index).ok_or(EnrichError::Column {
        index,
        len: row.len(),
    })
}

/// Files produced by a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStatistics,
    pub output_path: PathBuf,
    pub report_path: PathBuf,
    pub diagnostics_path: PathBuf,
    pub diagnostics_events: usize,
}

/// Enrich `input` into `<input><suffix>` and write the report beside it.
///
/// The dictionary is loaded and the engine configured before any output file
/// is touched. On error the output may be left truncated and must be
/// discarded.
pub fn run_files<S: TerminologySearch + ?Sized>(
    input: &Path,
    dictionary_path: &Path,
    search: &mut S,
    config: &EnrichConfig,
) -> Result<RunSummary> {
    config.validate()?;

    let dictionary = MeshDictionary::load(dictionary_path)?;

    search
        .configure(&config.search)
        .map_err(EnrichError::Terminology)?;
    let search_properties: BTreeMap<String, String> = search.active_configuration();

    let output_path = config.output_path(input);
    let report_path = config.report_path(&output_path);
    let diagnostics_path = config.diagnostics_path(&output_path);

    let mut log = DiagnosticsLog::create(&diagnostics_path)?;
    log.search_properties(&search_properties)?;

    let reader = BufReader::new(File::open(input).map_err(|e| EnrichError::io(input, e))?);
    let writer = BufWriter::new(
        File::create(&output_path).map_err(|e| EnrichError::io(&output_path, e))?,
    );

    tracing::info!("Adding CUIs: {:?} -> {:?}", input, output_path);
    let enricher = CuiEnricher::new(config, &dictionary, &*search);
    let stats = enricher.run(reader, writer, &mut log)?;
    tracing::info!("Finished {} rows", stats.rows());

    Report::new(&stats, &config.targets, &search_properties).write_to(&report_path)?;

    Ok(RunSummary {
        stats,
        output_path,
        report_path,
        diagnostics_path,
        diagnostics_events: log.events(),
    })
}
