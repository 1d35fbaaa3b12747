//! Python extension module, built with `--features python`.

use std::collections::HashMap;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::match_info::{self, MedalCategory, MedalTally};
use crate::{
    EngineConfig, Error, ExtractionReport, PlayerMatchRecord, RejectedRow, Role, ScoreboardEngine,
};

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::Io { .. } => PyIOError::new_err(err.to_string()),
        Error::Config { .. } => PyValueError::new_err(err.to_string()),
    }
}

/// One validated player row
#[pyclass(name = "PlayerRecord")]
#[derive(Clone)]
struct PyPlayerRecord {
    #[pyo3(get)]
    rank: u32,
    #[pyo3(get)]
    role: String,
    #[pyo3(get)]
    name: String,
    #[pyo3(get)]
    score: u32,
    #[pyo3(get)]
    kills: u32,
    #[pyo3(get)]
    deaths: u32,
    #[pyo3(get)]
    assists: u32,
    #[pyo3(get)]
    revives: u32,
    #[pyo3(get)]
    captures: u32,
}

impl From<PlayerMatchRecord> for PyPlayerRecord {
    fn from(record: PlayerMatchRecord) -> Self {
        Self {
            rank: record.rank,
            role: record.role.to_string(),
            name: record.name,
            score: record.score,
            kills: record.kills,
            deaths: record.deaths,
            assists: record.assists,
            revives: record.revives,
            captures: record.captures,
        }
    }
}

/// A row that did not become a record
#[pyclass(name = "RejectedRow")]
#[derive(Clone)]
struct PyRejectedRow {
    #[pyo3(get)]
    text: String,
    #[pyo3(get)]
    line_index: usize,
    #[pyo3(get)]
    reason: String,
}

impl From<RejectedRow> for PyRejectedRow {
    fn from(row: RejectedRow) -> Self {
        Self {
            text: row.text,
            line_index: row.line_index,
            reason: row.reason.code().to_string(),
        }
    }
}

type PyReport = (Vec<PyPlayerRecord>, Vec<PyRejectedRow>);

fn to_py_report(report: ExtractionReport) -> PyReport {
    (
        report.records.into_iter().map(PyPlayerRecord::from).collect(),
        report.rejected.into_iter().map(PyRejectedRow::from).collect(),
    )
}

/// Reusable engine; load the config once and process many blocks
#[pyclass(name = "Engine")]
struct PyEngine {
    inner: ScoreboardEngine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<String>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => EngineConfig::from_path(path).map_err(to_py_err)?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            inner: ScoreboardEngine::new(config),
        })
    }

    /// Returns: (records, rejected_rows)
    fn process_block(&self, lines: Vec<String>) -> PyReport {
        to_py_report(self.inner.process_block(&lines))
    }

    /// Returns: (records, rejected_rows)
    fn process_file(&self, file_path: String) -> PyResult<PyReport> {
        let report = self.inner.process_file(&file_path).map_err(to_py_err)?;
        Ok(to_py_report(report))
    }

    /// Process files in parallel. Returns one (records, rejected_rows) per file
    fn process_batch(&self, file_paths: Vec<String>) -> PyResult<Vec<PyReport>> {
        self.inner
            .process_files(&file_paths)
            .into_iter()
            .map(|result| result.map(to_py_report).map_err(to_py_err))
            .collect()
    }

    /// Write one CSV table per match found in `dir`. Returns the written paths
    fn export_matches(&self, dir: String, fallback_year: u32) -> PyResult<Vec<String>> {
        let written = self.inner.export_matches(&dir, fallback_year).map_err(to_py_err)?;
        Ok(written
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect())
    }

    /// The record rendered back into scoreboard text
    fn render_record(&self, record: &PyPlayerRecord) -> String {
        let role = Role::ALL
            .into_iter()
            .find(|r| r.as_str() == record.role)
            .unwrap_or(Role::Unknown);
        self.inner.render_record(&PlayerMatchRecord {
            rank: record.rank,
            role,
            name: record.name.clone(),
            score: record.score,
            kills: record.kills,
            deaths: record.deaths,
            assists: record.assists,
            revives: record.revives,
            captures: record.captures,
        })
    }
}

/// Process one block with the default configuration
/// Returns: (records, rejected_rows)
#[pyfunction]
fn process_block(lines: Vec<String>) -> PyReport {
    to_py_report(ScoreboardEngine::default().process_block(&lines))
}

/// Returns: (outcome, map_name, date)
#[pyfunction]
fn parse_match_info(lines: Vec<String>, fallback_year: u32) -> (String, String, String) {
    let info = match_info::parse_general_info(&lines, fallback_year);
    (info.outcome, info.map_name, info.date)
}

#[pyfunction]
fn parse_team_name(lines: Vec<String>) -> String {
    match_info::parse_team_name(&lines)
}

/// Returns: HashMap<category, "Gold" | "Silver" | "Bronze" | "None">
#[pyfunction]
fn highest_medals(lines: Vec<String>) -> HashMap<String, String> {
    let tally = MedalTally::from_lines(&lines);
    MedalCategory::ALL
        .into_iter()
        .map(|category| {
            let rank = tally
                .highest(category)
                .map_or_else(|| "None".to_string(), |r| r.to_string());
            (category.to_string(), rank)
        })
        .collect()
}

#[pymodule]
fn scoreboard_ocr(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(process_block, m)?)?;
    m.add_function(wrap_pyfunction!(parse_match_info, m)?)?;
    m.add_function(wrap_pyfunction!(parse_team_name, m)?)?;
    m.add_function(wrap_pyfunction!(highest_medals, m)?)?;
    m.add_class::<PyEngine>()?;
    m.add_class::<PyPlayerRecord>()?;
    m.add_class::<PyRejectedRow>()?;
    Ok(())
}
