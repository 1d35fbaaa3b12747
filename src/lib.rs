//! Turns recognized scoreboard text into validated per-player match records.
//!
//! ```
//! use scoreboard_ocr::{EngineConfig, Role, ScoreboardEngine};
//!
//! let engine = ScoreboardEngine::new(EngineConfig::default());
//! let report = engine.process_block(&["3  +  J0hn_Do3  1520  8  3  2  1  0"]);
//! assert_eq!(report.records[0].role, Role::Medic);
//! assert_eq!(report.records[0].score, 1520);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

mod assembler;
pub mod config;
pub mod correction;
pub mod error;
mod lexicon;
pub mod match_info;
pub mod match_report;
pub mod model;
mod segmenter;
pub mod symbols;
mod tokenizer;
mod validator;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use correction::CorrectionTables;
pub use error::{Error, Result};
pub use match_info::{MatchInfo, MedalTally};
pub use match_report::{MatchFiles, MatchReport, MatchRow};
pub use model::{
    CandidateRow, Confidence, CorrectedField, ExtractionReport, FieldKind, FieldSlot, FieldValue,
    PlayerMatchRecord, RejectReason, RejectedRow, Role, RowFlag,
};
pub use symbols::SymbolTable;

use assembler::Assembler;
use lexicon::Lexicon;
use segmenter::Segmenter;
use tokenizer::{Tokenized, Tokenizer};
use validator::{Validator, Verdict};

/// Read a recognizer output file as a block of lines.
pub fn read_block(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Like [`read_block`], but a file that does not exist is an empty block.
fn read_optional_block(path: &Path) -> Result<Vec<String>> {
    if path.is_file() {
        read_block(path)
    } else {
        Ok(Vec::new())
    }
}

/// The extraction pipeline with its tables. Build once and share; it holds no
/// mutable state, so blocks can be processed from any number of threads.
#[derive(Debug, Clone)]
pub struct ScoreboardEngine {
    config: EngineConfig,
    tables: CorrectionTables,
    symbols: SymbolTable,
}

impl Default for ScoreboardEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ScoreboardEngine {
    pub fn new(config: EngineConfig) -> Self {
        let tables = CorrectionTables::new(&config.extra_numeric_confusions);
        let symbols = SymbolTable::new(&config.extra_symbol_variants, config.missing_symbol_role);
        Self {
            config,
            tables,
            symbols,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn lexicon(&self) -> Lexicon<'_> {
        Lexicon {
            tables: &self.tables,
            symbols: &self.symbols,
            max_rank: self.config.max_rank,
        }
    }

    /// Process one block of recognized lines. Never fails: anything that
    /// cannot become a record comes back as a rejected row.
    pub fn process_block<S: AsRef<str>>(&self, block: &[S]) -> ExtractionReport {
        let tokenizer = Tokenizer {
            lexicon: self.lexicon(),
            min_row_tokens: self.config.min_row_tokens,
        };

        let rows = match tokenizer.tokenize(block) {
            Tokenized::Rows(rows) => rows,
            Tokenized::Unparseable(rejected) => {
                warn!(lines = block.len(), "no header or rank found in block");
                return ExtractionReport {
                    rejected: vec![rejected],
                    ..ExtractionReport::default()
                };
            }
        };

        let segmenter = Segmenter {
            lexicon: self.lexicon(),
        };
        let mut validator = Validator::new(&self.config);
        let mut assembler = Assembler::new();

        for row in &rows {
            let fields: Vec<CorrectedField> = segmenter
                .segment(row)
                .iter()
                .map(|slot| self.tables.correct(slot, &self.symbols))
                .collect();
            let role = fields
                .iter()
                .find(|f| f.kind == FieldKind::ClassSymbol)
                .map_or(self.config.missing_symbol_role, |f| self.symbols.map_role(f));

            match validator.validate(row, &fields, role) {
                Verdict::Accepted(record) => {
                    let flags = row_flags(row, &fields, &record);
                    assembler.push_record(row.line_index, record, flags);
                }
                Verdict::Rejected(rejected) => assembler.push_rejected(rejected),
            }
        }

        let report = assembler.finish();
        info!(
            rows = rows.len(),
            records = report.records.len(),
            rejected = report.rejected.len(),
            "processed scoreboard block"
        );
        report
    }

    /// Split `text` into lines and process it as one block.
    pub fn process_text(&self, text: &str) -> ExtractionReport {
        let lines: Vec<&str> = text.lines().collect();
        self.process_block(&lines)
    }

    /// Process independent blocks in parallel. Output order follows input.
    pub fn process_batch<S: AsRef<str> + Sync>(&self, blocks: &[Vec<S>]) -> Vec<ExtractionReport> {
        blocks
            .par_iter()
            .map(|block| self.process_block(block))
            .collect()
    }

    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<ExtractionReport> {
        let block = read_block(path)?;
        Ok(self.process_block(&block))
    }

    /// Read and process files in parallel; a file that cannot be read fails
    /// alone.
    pub fn process_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<ExtractionReport>> {
        paths
            .par_iter()
            .map(|path| self.process_file(path))
            .collect()
    }

    /// Read one match's files. The team and medal files may be absent.
    pub fn process_match(&self, files: &MatchFiles, fallback_year: u32) -> Result<MatchReport> {
        let scoreboard = self.process_file(&files.scoreboard)?;
        let info = match_info::parse_general_info(&read_block(&files.general_info)?, fallback_year);
        let team = match_info::parse_team_name(&read_optional_block(&files.team)?);
        let medals = MedalTally::from_lines(&read_optional_block(&files.medals)?);
        Ok(MatchReport::new(scoreboard, info, team, &medals))
    }

    /// Write `match_<ts>_processed.csv` for every match found in `dir`,
    /// in parallel. Returns the written paths in timestamp order.
    pub fn export_matches(&self, dir: impl AsRef<Path>, fallback_year: u32) -> Result<Vec<PathBuf>> {
        MatchFiles::discover(dir)?
            .par_iter()
            .map(|files| -> Result<PathBuf> {
                let output = files.output_path();
                let report = self.process_match(files, fallback_year)?;
                report.write_csv(&output)?;
                info!(
                    path = %output.display(),
                    players = report.scoreboard.records.len(),
                    "wrote match table"
                );
                Ok(output)
            })
            .collect()
    }

    /// The record as a scoreboard line, in the layout the engine reads.
    pub fn render_record(&self, record: &PlayerMatchRecord) -> String {
        record.to_scoreboard_line_with(self.symbols.symbol_for(record.role))
    }
}

/// Flags for every field that was not read exactly, and for an unknown role.
fn row_flags(row: &CandidateRow, fields: &[CorrectedField], record: &PlayerMatchRecord) -> Vec<RowFlag> {
    let mut flags: Vec<RowFlag> = fields
        .iter()
        .filter(|f| f.confidence != Confidence::Exact)
        // A glyph the recognizer dropped is expected, not suspicious.
        .filter(|f| !(f.kind == FieldKind::ClassSymbol && f.is_missing() && record.role != Role::Unknown))
        .map(|f| RowFlag {
            line_index: row.line_index,
            rank: record.rank,
            field: f.kind,
            confidence: f.confidence,
        })
        .collect();

    if record.role == Role::Unknown && !flags.iter().any(|f| f.field == FieldKind::ClassSymbol) {
        flags.push(RowFlag {
            line_index: row.line_index,
            rank: record.rank,
            field: FieldKind::ClassSymbol,
            confidence: Confidence::Unresolved,
        });
    }
    flags
}
