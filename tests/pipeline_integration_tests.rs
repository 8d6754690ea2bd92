// Pipeline Integration Tests
//
// Purpose: Drive the enrichment pipeline end to end with in-memory tables and a
// stub terminology engine, then check columns, counters and diagnostics.
// Run with: cargo test --test pipeline_integration_tests

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use ctgov_cui_mapper::{
    Candidate, CuiEnricher, DiagnosticsLog, EnrichConfig, ExactField, MeshDictionary,
    RunStatistics, SearchError, SearchOptions, TerminologySearch, TimeoutSearch,
    VocabularySource,
};

/// Stub engine answering from a fixed table; unknown queries get no candidates.
#[derive(Default)]
struct StubSearch {
    answers: HashMap<String, Result<Vec<Candidate>, SearchError>>,
    delay: Option<Duration>,
}

impl StubSearch {
    fn answer(mut self, query: &str, candidates: Vec<Candidate>) -> Self {
        self.answers.insert(query.to_string(), Ok(candidates));
        self
    }

    fn fail(mut self, query: &str, error: SearchError) -> Self {
        self.answers.insert(query.to_string(), Err(error));
        self
    }
}

impl TerminologySearch for StubSearch {
    fn configure(&mut self, _options: &SearchOptions) -> Result<(), SearchError> {
        Ok(())
    }

    fn search(&self, text: &str) -> Result<Vec<Candidate>, SearchError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.answers.get(text).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn active_configuration(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("engine".to_string(), "stub".to_string());
        props
    }
}

const HEADER: &str = "nct_id\ttext\tc2\tc3\tc4\tc5\tc6\tmsh_condition\tmsh_intervention\tc9";

fn dictionary() -> MeshDictionary {
    MeshDictionary::from_entries([("headache", "C001"), ("nausea", "C002"), ("pain", "C003")])
}

fn aspirin() -> Candidate {
    Candidate::new("Aspirin")
        .with_code(VocabularySource::MDR, "M1")
        .with_code(VocabularySource::SNOMEDCT_US, "S1")
        .with_code(VocabularySource::MSH, "X1")
}

struct Outcome {
    lines: Vec<Vec<String>>,
    stats: RunStatistics,
    diagnostics: Vec<String>,
}

fn run_table<S: TerminologySearch>(rows: &[&str], search: &S) -> Outcome {
    let config = EnrichConfig::default();
    let dict = dictionary();
    let enricher = CuiEnricher::new(&config, &dict, search);

    let mut input = String::from(HEADER);
    input.push('\n');
    for row in rows {
        input.push_str(row);
        input.push('\n');
    }

    let mut output = Vec::new();
    let mut log = DiagnosticsLog::new(Vec::new());
    let stats = enricher
        .run(input.as_bytes(), &mut output, &mut log)
        .expect("pipeline run failed");

    let lines = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();
    let diagnostics = String::from_utf8(log.into_inner())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();

    Outcome {
        lines,
        stats,
        diagnostics,
    }
}

// =========================================================================
// Section 1: Reference scenarios
// =========================================================================

#[test]
fn test_aspirin_row_fully_resolved() {
    let search = StubSearch::default().answer("aspirin", vec![aspirin()]);
    let out = run_table(
        &["id1\taspirin\tx\tx\tx\tx\tx\theadache|nausea\tpain\tx"],
        &search,
    );

    let row = &out.lines[1];
    assert_eq!(
        row,
        &[
            "id1",
            "aspirin",
            "M1|Aspirin",
            "S1|Aspirin",
            "X1|Aspirin",
            "x",
            "x",
            "x",
            "x",
            "x",
            "headache|nausea",
            "C001|C002",
            "pain",
            "C003",
            "x",
        ]
    );

    assert_eq!(out.stats.rows(), 1);
    assert_eq!(out.stats.all_missing(), 0);
    for source in [VocabularySource::MDR, VocabularySource::SNOMEDCT_US, VocabularySource::MSH] {
        assert_eq!(out.stats.missing_for(&source), 0);
    }
    assert_eq!(out.stats.missing_exact(ExactField::Condition), 0);
    assert_eq!(out.stats.missing_exact(ExactField::Intervention), 0);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_unknown_intervention_term() {
    let search = StubSearch::default().answer("aspirin", vec![aspirin()]);
    let out = run_table(
        &["id1\taspirin\tx\tx\tx\tx\tx\theadache\tunlisted_drug\tx"],
        &search,
    );

    assert_eq!(out.lines[1][13], "");
    assert_eq!(out.stats.missing_exact(ExactField::Intervention), 1);
    assert_eq!(out.stats.missing_exact(ExactField::Condition), 0);
    assert_eq!(out.diagnostics, ["MESH: No exact match for \"unlisted_drug\""]);
}

// =========================================================================
// Section 2: Header and shape
// =========================================================================

#[test]
fn test_header_and_rows_stay_aligned() {
    let search = StubSearch::default().answer("aspirin", vec![aspirin()]);
    let out = run_table(
        &[
            "id1\taspirin\tx\tx\tx\tx\tx\theadache|nausea\tpain\tx",
            "id2\t\tx\tx\tx\tx\tx\t\t\tx",
            "id3\tsomething else\tx\tx\tx\tx\tx\ta|b|c|d\tpain|\tx\textra",
        ],
        &search,
    );

    let header = &out.lines[0];
    assert_eq!(header.len(), 15);
    assert_eq!(header[2], "text_MedDRA_CUI");
    assert_eq!(header[11], "msh_condition_CUI");
    assert_eq!(header[13], "msh_intervention_CUI");

    // Every row gains exactly five columns
    assert_eq!(out.lines[1].len(), 10 + 5);
    assert_eq!(out.lines[2].len(), 10 + 5);
    assert_eq!(out.lines[3].len(), 11 + 5);

    // n terms in, n identifiers out
    assert_eq!(out.lines[3][11].split('|').count(), 4);
    assert_eq!(out.lines[3][13], "C003|");
}

#[test]
fn test_short_rows_are_padded_to_header_width() {
    let search = StubSearch::default();
    let out = run_table(&["id1\tqwerty\tx"], &search);

    assert_eq!(out.lines[1].len(), 15);
    assert_eq!(out.stats.padded_rows(), 1);
    assert_eq!(out.stats.rows(), 1);
}

#[test]
fn test_row_of_empty_fields_is_kept_and_counted() {
    let search = StubSearch::default().answer("aspirin", vec![aspirin()]);
    let out = run_table(
        &[
            "id1\taspirin\tx\tx\tx\tx\tx\theadache\tpain\tx",
            "\t\t\t\t\t\t\t\t\t",
            "id3\taspirin\tx\tx\tx\tx\tx\tnausea\t\tx",
        ],
        &search,
    );

    assert_eq!(out.stats.rows(), 3);
    assert_eq!(out.lines.len(), 4);
    assert_eq!(out.lines[2].len(), 15);
    assert!(out.lines[2].iter().all(String::is_empty));
    assert_eq!(out.lines[3][0], "id3");
    assert_eq!(out.stats.padded_rows(), 0);
    assert_eq!(out.stats.missing_exact(ExactField::Condition), 0);
}

// =========================================================================
// Section 3: Fuzzy resolution policy and counters
// =========================================================================

#[test]
fn test_no_candidates_counts_every_vocabulary_once() {
    let search = StubSearch::default();
    let out = run_table(&["id1\tqwerty\tx\tx\tx\tx\tx\theadache\tpain\tx"], &search);

    assert_eq!(&out.lines[1][2..5], &["", "", ""]);
    assert_eq!(out.stats.missing_for(&VocabularySource::MDR), 1);
    assert_eq!(out.stats.missing_for(&VocabularySource::SNOMEDCT_US), 1);
    assert_eq!(out.stats.missing_for(&VocabularySource::MSH), 1);
    assert_eq!(out.stats.all_missing(), 1);
    assert_eq!(out.diagnostics, ["qwerty not found in terminology index."]);
}

#[test]
fn test_exact_name_candidate_overrides_higher_ranked_one() {
    let search = StubSearch::default().answer(
        "Migraine",
        vec![
            Candidate::new("Migraine with aura").with_code(VocabularySource::MSH, "X_AURA"),
            Candidate::new("migraine")
                .with_code(VocabularySource::MSH, "X_MIGRAINE")
                .with_code(VocabularySource::MDR, "M_MIGRAINE"),
        ],
    );
    let out = run_table(&["id1\tMigraine\tx\tx\tx\tx\tx\t\t\tx"], &search);

    assert_eq!(out.lines[1][2], "M_MIGRAINE|migraine");
    assert_eq!(out.lines[1][3], "");
    assert_eq!(out.lines[1][4], "X_MIGRAINE|migraine");
    assert_eq!(out.stats.missing_for(&VocabularySource::SNOMEDCT_US), 1);
    assert_eq!(out.stats.all_missing(), 0);
}

#[test]
fn test_candidates_without_target_codes() {
    let search = StubSearch::default().answer(
        "thing",
        vec![Candidate::new("Thing").with_code(VocabularySource::new("RXNORM"), "R1")],
    );
    let out = run_table(&["id1\tthing\tx\tx\tx\tx\tx\t\t\tx"], &search);

    assert_eq!(out.stats.missing_for(&VocabularySource::MSH), 1);
    assert_eq!(out.stats.all_missing(), 1);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_engine_failure_does_not_abort_run() {
    let search = StubSearch::default()
        .answer("aspirin", vec![aspirin()])
        .fail("broken", SearchError::Engine("index corrupted".into()));
    let out = run_table(
        &[
            "id1\tbroken\tx\tx\tx\tx\tx\t\t\tx",
            "id2\taspirin\tx\tx\tx\tx\tx\t\t\tx",
        ],
        &search,
    );

    assert_eq!(out.stats.rows(), 2);
    assert_eq!(&out.lines[1][2..5], &["", "", ""]);
    assert_eq!(out.lines[2][2], "M1|Aspirin");
    assert_eq!(out.stats.failed_lookups(), 1);
    assert_eq!(out.stats.all_missing(), 1);
    assert_eq!(
        out.diagnostics,
        ["broken lookup failed: terminology engine error: index corrupted"]
    );
}

#[test]
fn test_timeout_is_a_row_level_failure() {
    let slow = StubSearch {
        delay: Some(Duration::from_millis(300)),
        ..StubSearch::default()
    }
    .answer("aspirin", vec![aspirin()]);
    let search = TimeoutSearch::new(slow, Duration::from_millis(10)).unwrap();

    let out = run_table(&["id1\taspirin\tx\tx\tx\tx\tx\tpain\t\tx"], &search);

    assert_eq!(out.stats.rows(), 1);
    assert_eq!(out.stats.failed_lookups(), 1);
    assert_eq!(&out.lines[1][2..5], &["", "", ""]);
    assert_eq!(out.lines[1][11], "C003");
    assert!(out.diagnostics[0].starts_with("aspirin lookup failed: search timed out"));
}

// =========================================================================
// Section 4: Totals
// =========================================================================

#[test]
fn test_totals_across_rows() {
    let search = StubSearch::default().answer("aspirin", vec![aspirin()]);
    let out = run_table(
        &[
            "id1\taspirin\tx\tx\tx\tx\tx\theadache|bogus one\tpain\tx",
            "id2\tunknown\tx\tx\tx\tx\tx\t|nausea|\tbogus two|bogus three\tx",
            "id3\taspirin\tx\tx\tx\tx\tx\t\t\tx",
        ],
        &search,
    );

    assert_eq!(out.stats.rows(), 3);
    assert_eq!(out.stats.missing_exact(ExactField::Condition), 1);
    assert_eq!(out.stats.missing_exact(ExactField::Intervention), 2);
    assert_eq!(out.stats.all_missing(), 1);

    // Diagnostics follow row order, intervention before condition before text
    assert_eq!(
        out.diagnostics,
        [
            "MESH: No exact match for \"bogus one\"",
            "MESH: No exact match for \"bogus two\"",
            "MESH: No exact match for \"bogus three\"",
            "unknown not found in terminology index.",
        ]
    );
}
