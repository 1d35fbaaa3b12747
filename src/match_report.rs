//! One match: the scoreboard together with the general-information, team and
//! medal blocks captured alongside it, flattened into one row per player.
//!
//! The capture step names a match's files after a shared timestamp:
//! `scoreboard_<ts>_ocr.txt`, `general_information_<ts>_ocr.txt`,
//! `team_<ts>_ocr.txt` and `medals_<ts>.txt`. The table is written next to
//! them as `match_<ts>_processed.csv`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::match_info::{MatchInfo, MedalCategory, MedalRank, MedalTally};
use crate::model::{ExtractionReport, Role};

/// Header row of the match table. "Data" is the date column.
pub const CSV_HEADERS: [&str; 17] = [
    "Outcome",
    "Map",
    "Data",
    "Team",
    "Rank",
    "Class",
    "Name",
    "Score",
    "Kills",
    "Deaths",
    "Assists",
    "Revives",
    "Captures",
    "Combat Medal",
    "Capture Medal",
    "Logistics Medal",
    "Intelligence Medal",
];

/// Paths of the files that make up one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFiles {
    pub timestamp: String,
    pub scoreboard: PathBuf,
    pub general_info: PathBuf,
    pub team: PathBuf,
    pub medals: PathBuf,
}

impl MatchFiles {
    pub fn for_timestamp(dir: impl AsRef<Path>, timestamp: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            timestamp: timestamp.to_string(),
            scoreboard: dir.join(format!("scoreboard_{timestamp}_ocr.txt")),
            general_info: dir.join(format!("general_information_{timestamp}_ocr.txt")),
            team: dir.join(format!("team_{timestamp}_ocr.txt")),
            medals: dir.join(format!("medals_{timestamp}.txt")),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.scoreboard
            .with_file_name(format!("match_{}_processed.csv", self.timestamp))
    }

    /// Every scoreboard in `dir` that has a general-information file, ordered
    /// by timestamp. Scoreboards without one are skipped with a warning.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<Self>> {
        let dir = dir.as_ref();
        let io_err = |source: io::Error| Error::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut matches = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let file_name = entry.map_err(io_err)?.file_name();
            let Some(timestamp) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix("scoreboard_"))
                .and_then(|name| name.strip_suffix("_ocr.txt"))
            else {
                continue;
            };

            let files = Self::for_timestamp(dir, timestamp);
            if files.general_info.is_file() {
                matches.push(files);
            } else {
                warn!(timestamp = %timestamp, "no general information file for scoreboard");
            }
        }
        matches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(matches)
    }
}

/// One exported player row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub outcome: String,
    pub map_name: String,
    pub date: String,
    pub team: String,
    pub rank: u32,
    pub role: Role,
    pub name: String,
    pub score: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub revives: u32,
    pub captures: u32,
    pub combat_medal: Option<MedalRank>,
    pub capture_medal: Option<MedalRank>,
    pub logistics_medal: Option<MedalRank>,
    pub intelligence_medal: Option<MedalRank>,
}

impl MatchRow {
    /// Cells in [`CSV_HEADERS`] order. A category without a medal reads "None".
    pub fn cells(&self) -> Vec<String> {
        let medal = |rank: Option<MedalRank>| rank.map_or_else(|| "None".to_string(), |r| r.to_string());
        vec![
            self.outcome.clone(),
            self.map_name.clone(),
            self.date.clone(),
            self.team.clone(),
            self.rank.to_string(),
            self.role.to_string(),
            self.name.clone(),
            self.score.to_string(),
            self.kills.to_string(),
            self.deaths.to_string(),
            self.assists.to_string(),
            self.revives.to_string(),
            self.captures.to_string(),
            medal(self.combat_medal),
            medal(self.capture_medal),
            medal(self.logistics_medal),
            medal(self.intelligence_medal),
        ]
    }
}

/// The scoreboard of one match with its match-level context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub info: MatchInfo,
    pub team: String,
    /// Best medal per category; `None` when the category has none.
    pub highest_medals: BTreeMap<MedalCategory, Option<MedalRank>>,
    pub scoreboard: ExtractionReport,
}

impl MatchReport {
    pub fn new(scoreboard: ExtractionReport, info: MatchInfo, team: String, medals: &MedalTally) -> Self {
        let highest_medals = MedalCategory::ALL
            .into_iter()
            .map(|category| (category, medals.highest(category)))
            .collect();
        Self {
            info,
            team,
            highest_medals,
            scoreboard,
        }
    }

    fn highest_medal(&self, category: MedalCategory) -> Option<MedalRank> {
        self.highest_medals.get(&category).copied().flatten()
    }

    /// One row per accepted record, in rank order.
    pub fn rows(&self) -> Vec<MatchRow> {
        self.scoreboard
            .records
            .iter()
            .map(|record| MatchRow {
                outcome: self.info.outcome.clone(),
                map_name: self.info.map_name.clone(),
                date: self.info.date.clone(),
                team: self.team.clone(),
                rank: record.rank,
                role: record.role,
                name: record.name.clone(),
                score: record.score,
                kills: record.kills,
                deaths: record.deaths,
                assists: record.assists,
                revives: record.revives,
                captures: record.captures,
                combat_medal: self.highest_medal(MedalCategory::Combat),
                capture_medal: self.highest_medal(MedalCategory::Capture),
                logistics_medal: self.highest_medal(MedalCategory::Logistics),
                intelligence_medal: self.highest_medal(MedalCategory::Intelligence),
            })
            .collect()
    }

    /// The match table as CSV text, header first.
    pub fn to_csv(&self) -> String {
        let mut out = CSV_HEADERS.join(",");
        out.push('\n');
        for row in self.rows() {
            let cells: Vec<String> = row.cells().iter().map(|cell| csv_field(cell)).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_csv()).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Quote a cell holding a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerMatchRecord;

    fn record(rank: u32, role: Role, name: &str) -> PlayerMatchRecord {
        PlayerMatchRecord {
            rank,
            role,
            name: name.to_string(),
            score: 1000 + rank,
            kills: 5,
            deaths: 2,
            assists: 1,
            revives: 0,
            captures: 3,
        }
    }

    fn report() -> MatchReport {
        let scoreboard = ExtractionReport {
            records: vec![record(1, Role::Assault, "Alpha"), record(2, Role::Medic, "Bravo, Jr")],
            ..ExtractionReport::default()
        };
        let info = MatchInfo {
            outcome: "VICTORY".to_string(),
            map_name: "Cracked - Attack and Defend".to_string(),
            date: "07 March 2025 21:04:09".to_string(),
        };
        let medals = MedalTally::from_lines(&["Combat Silver Medal", "Capture Gold Medal"]);
        MatchReport::new(scoreboard, info, "ATTACK".to_string(), &medals)
    }

    #[test]
    fn test_rows_carry_match_context() {
        let rows = report().rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team, "ATTACK");
        assert_eq!(rows[0].outcome, "VICTORY");
        assert_eq!(rows[1].name, "Bravo, Jr");
        assert_eq!(rows[1].score, 1002);
        assert_eq!(rows[1].combat_medal, Some(MedalRank::Silver));
        assert_eq!(rows[1].capture_medal, Some(MedalRank::Gold));
        assert_eq!(rows[1].logistics_medal, None);
    }

    #[test]
    fn test_csv_layout() {
        let csv = report().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Outcome,Map,Data,Team,Rank,Class,Name,Score,Kills,Deaths,Assists,Revives,Captures,\
             Combat Medal,Capture Medal,Logistics Medal,Intelligence Medal"
        );
        assert_eq!(
            lines[1],
            "VICTORY,Cracked - Attack and Defend,07 March 2025 21:04:09,ATTACK,1,Assault,Alpha,\
             1001,5,2,1,0,3,Silver,Gold,None,None"
        );
        assert!(lines[2].contains(",Medic,\"Bravo, Jr\",1002,"));
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["team"], "ATTACK");
        assert_eq!(json["highest_medals"]["Combat"], "Silver");
        assert!(json["highest_medals"]["Intelligence"].is_null());
        assert_eq!(json["scoreboard"]["records"][0]["name"], "Alpha");
    }

    #[test]
    fn test_discover_needs_general_info() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "scoreboard_0002_ocr.txt",
            "general_information_0002_ocr.txt",
            "scoreboard_0001_ocr.txt",
            "general_information_0001_ocr.txt",
            "scoreboard_0003_ocr.txt",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let matches = MatchFiles::discover(dir.path()).unwrap();
        let stamps: Vec<&str> = matches.iter().map(|m| m.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["0001", "0002"]);
        assert_eq!(matches[0].medals, dir.path().join("medals_0001.txt"));
        assert_eq!(matches[0].output_path(), dir.path().join("match_0001_processed.csv"));
    }

    #[test]
    fn test_discover_missing_dir() {
        let result = MatchFiles::discover("/nonexistent/scoreboard_ocr_matches");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
