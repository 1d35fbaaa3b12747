//! Types shared by every stage of the extraction pipeline.
//!
//! Raw text enters as a block of lines, becomes [`CandidateRow`]s, then nine
//! [`FieldSlot`]s per row, then [`CorrectedField`]s, and finally either a
//! [`PlayerMatchRecord`] or a [`RejectedRow`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of stat columns that follow the name on a scoreboard row.
pub const STAT_COUNT: usize = 6;

/// Scoreboard columns, in the order they appear on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Rank,
    ClassSymbol,
    Name,
    Score,
    Kills,
    Deaths,
    Assists,
    Revives,
    Captures,
}

impl FieldKind {
    /// Fixed schema order of a scoreboard row.
    pub const SCHEMA: [FieldKind; 9] = [
        FieldKind::Rank,
        FieldKind::ClassSymbol,
        FieldKind::Name,
        FieldKind::Score,
        FieldKind::Kills,
        FieldKind::Deaths,
        FieldKind::Assists,
        FieldKind::Revives,
        FieldKind::Captures,
    ];

    /// The six stat columns, left to right.
    pub const STATS: [FieldKind; STAT_COUNT] = [
        FieldKind::Score,
        FieldKind::Kills,
        FieldKind::Deaths,
        FieldKind::Assists,
        FieldKind::Revives,
        FieldKind::Captures,
    ];

    pub fn is_numeric(self) -> bool {
        !matches!(self, FieldKind::ClassSymbol | FieldKind::Name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Rank => "rank",
            FieldKind::ClassSymbol => "class",
            FieldKind::Name => "name",
            FieldKind::Score => "score",
            FieldKind::Kills => "kills",
            FieldKind::Deaths => "deaths",
            FieldKind::Assists => "assists",
            FieldKind::Revives => "revives",
            FieldKind::Captures => "captures",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a field's value had to be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    Corrected,
    Unresolved,
}

/// Closed set of player classes. `Unknown` is a valid terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Assault,
    Engineer,
    Support,
    Recon,
    Medic,
    Unknown,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Assault,
        Role::Engineer,
        Role::Support,
        Role::Recon,
        Role::Medic,
        Role::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Assault => "Assault",
            Role::Engineer => "Engineer",
            Role::Support => "Support",
            Role::Recon => "Recon",
            Role::Medic => "Medic",
            Role::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line, or several re-joined lines, believed to describe one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub text: String,
    /// Index of the first source line in the block.
    pub line_index: usize,
}

/// A column value as cut out of the row. `raw` is `None` when the segmenter
/// found no token for this column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub kind: FieldKind,
    pub raw: Option<String>,
}

impl FieldSlot {
    pub fn new(kind: FieldKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: Some(raw.into()),
        }
    }

    pub fn missing(kind: FieldKind) -> Self {
        Self { kind, raw: None }
    }
}

/// Typed value produced by the correction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(u32),
    Symbol(String),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedField {
    pub kind: FieldKind,
    pub raw: Option<String>,
    pub value: FieldValue,
    pub confidence: Confidence,
}

impl CorrectedField {
    pub fn integer(&self) -> Option<u32> {
        match self.value {
            FieldValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.raw.is_none()
    }
}

/// Validated stats for one player in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchRecord {
    pub rank: u32,
    pub role: Role,
    pub name: String,
    pub score: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub revives: u32,
    pub captures: u32,
}

impl PlayerMatchRecord {
    pub fn stats(&self) -> [u32; STAT_COUNT] {
        [
            self.score,
            self.kills,
            self.deaths,
            self.assists,
            self.revives,
            self.captures,
        ]
    }

    /// Renders the record in the scoreboard's own column layout, using
    /// `symbol` as the class glyph.
    pub fn to_scoreboard_line_with(&self, symbol: &str) -> String {
        let stats = self
            .stats()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} {} {} {}", self.rank, symbol, self.name, stats)
    }
}

/// Reason a row did not become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    MissingName,
    NonNumericStat,
    DuplicateRankInBlock,
    TooManyUnresolvedFields,
    UnparseableBlock,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::MissingName => "missing-name",
            RejectReason::NonNumericStat => "non-numeric-stat",
            RejectReason::DuplicateRankInBlock => "duplicate-rank-in-block",
            RejectReason::TooManyUnresolvedFields => "too-many-unresolved-fields",
            RejectReason::UnparseableBlock => "unparseable-block",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub text: String,
    pub line_index: usize,
    pub reason: RejectReason,
}

/// A field that was repaired or could not be resolved in an accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFlag {
    pub line_index: usize,
    pub rank: u32,
    pub field: FieldKind,
    pub confidence: Confidence,
}

/// Everything produced from one block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub records: Vec<PlayerMatchRecord>,
    pub rejected: Vec<RejectedRow>,
    pub flags: Vec<RowFlag>,
    /// Line indices of rows dropped as exact duplicates of an earlier record.
    pub merged_duplicates: Vec<usize>,
}

impl ExtractionReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected.is_empty()
    }
}
