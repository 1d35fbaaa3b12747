//! Match-level text around the scoreboard: outcome, map, date, team name and
//! the medal list.
//!
//! Like the scoreboard, these blocks come from the recognizer, and the same
//! words are misread the same ways, so repairs are lookup tables.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "Unknown";

lazy_static! {
    static ref OUTCOME_CORRECTIONS: Vec<(&'static str, &'static str)> = vec![
        ("SULLESS", "SUCCESS"),
        ("SUCCFSS", "SUCCESS"),
        ("FAILIRE", "FAILURE"),
        ("FAILUPE", "FAILURE"),
        ("VILIORY", "VICTORY"),
    ];

    static ref MAP_NAME_CORRECTIONS: Vec<(&'static str, &'static str)> = vec![
        ("Ihreshold-Attac: and Defend", "Threshold - Attack and Defend"),
        ("Threshold-Attack and Defend", "Threshold - Attack and Defend"),
        ("Shatted - Attack and Defend", "Shafted - Attack and Defend"),
        ("hatted - Attack and Defend", "Shafted - Attack and Defend"),
        ("Shafted-Attac: and Defend", "Shafted - Attack and Defend"),
        ("Ascension-Attac: and Defend", "Ascension - Attack and Defend"),
        ("Cracked-Attac: and Defend", "Cracked - Attack and Defend"),
        ("Cracked-Attack and Defend", "Cracked - Attack and Defend"),
        ("Trench ines - Attack and Defend", "Trench Lines - Attack and Defend"),
        ("Trench ines-Attack and Defend", "Trench Lines - Attack and Defend"),
    ];

    static ref TEAM_NAME_CORRECTIONS: Vec<(&'static str, &'static str)> = vec![
        ("GTI", "ATTACK"),
        ("HAAVK", "DEFENSE"),
    ];

    static ref CLOCK: Regex = Regex::new(r"^(\d{1,2}):(\d{1,2}):(\d{1,2})$").unwrap();
}

fn corrected<'a>(table: &[(&'static str, &'static str)], text: &'a str) -> &'a str {
    table
        .iter()
        .find(|(observed, _)| *observed == text)
        .map_or(text, |(_, fixed)| *fixed)
}

/// Outcome, map and date from the general-information block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub outcome: String,
    pub map_name: String,
    pub date: String,
}

impl MatchInfo {
    fn unknown() -> Self {
        Self {
            outcome: UNKNOWN.to_string(),
            map_name: UNKNOWN.to_string(),
            date: UNKNOWN.to_string(),
        }
    }
}

/// Parse the general-information block: outcome line, map line (possibly
/// preceded by a line of `?` noise), then date lines. `fallback_year` fills a
/// date that was read without one.
pub fn parse_general_info<S: AsRef<str>>(lines: &[S], fallback_year: u32) -> MatchInfo {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 3 {
        return MatchInfo::unknown();
    }

    let outcome = lines[0].replace('?', "");
    let mut outcome = corrected(&OUTCOME_CORRECTIONS, outcome.trim()).to_string();
    if outcome == "SUCCESS" {
        outcome = "VICTORY".to_string();
    }

    let (map_line, date_lines) = if lines[1].contains('?') {
        (lines.get(2).copied().unwrap_or(UNKNOWN), &lines[3.min(lines.len())..])
    } else {
        (lines[1], &lines[2..])
    };
    let map_name = corrected(&MAP_NAME_CORRECTIONS, map_line).to_string();

    MatchInfo {
        outcome,
        map_name,
        date: format_date(&date_lines.join(" "), fallback_year),
    }
}

/// `"7 - March - 2025 - 21:04:09"` → `"07 March 2025 21:04:09"`.
pub fn format_date(raw: &str, fallback_year: u32) -> String {
    let cleaned = raw.replace(" - ", " ").replace('-', " ");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    if parts.len() < 2 {
        return cleaned.trim().to_string();
    }

    let day = format!("{:0>2}", parts[0]);
    let year = parts
        .get(2)
        .map_or_else(|| fallback_year.to_string(), |y| y.to_string());
    let time = parts
        .get(3)
        .filter(|t| is_valid_time(t))
        .copied()
        .unwrap_or("00:00:00");
    format!("{} {} {} {}", day, parts[1], year, time)
}

fn is_valid_time(text: &str) -> bool {
    let Some(caps) = CLOCK.captures(text) else {
        return false;
    };
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or(u32::MAX);
    field(1) < 24 && field(2) < 60 && field(3) < 60
}

/// First non-empty line of the team block, corrected.
pub fn parse_team_name<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .find(|l| !l.is_empty())
        .map_or_else(|| UNKNOWN.to_string(), |team| corrected(&TEAM_NAME_CORRECTIONS, team).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MedalCategory {
    Combat,
    Capture,
    Logistics,
    Intelligence,
}

impl MedalCategory {
    pub const ALL: [MedalCategory; 4] = [
        MedalCategory::Combat,
        MedalCategory::Capture,
        MedalCategory::Logistics,
        MedalCategory::Intelligence,
    ];
}

impl fmt::Display for MedalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MedalCategory::Combat => "Combat",
            MedalCategory::Capture => "Capture",
            MedalCategory::Logistics => "Logistics",
            MedalCategory::Intelligence => "Intelligence",
        })
    }
}

/// Medal grades, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MedalRank {
    Gold,
    Silver,
    Bronze,
}

impl MedalRank {
    pub const ALL: [MedalRank; 3] = [MedalRank::Gold, MedalRank::Silver, MedalRank::Bronze];
}

impl fmt::Display for MedalRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MedalRank::Gold => "Gold",
            MedalRank::Silver => "Silver",
            MedalRank::Bronze => "Bronze",
        })
    }
}

/// Medal counts from the medal detector's text output, one medal per line
/// (`"Combat Gold Medal"`). Unrecognized lines are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedalTally {
    counts: BTreeMap<(MedalCategory, MedalRank), u32>,
}

impl MedalTally {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut tally = Self::default();
        for line in lines {
            let line = line.as_ref().trim();
            let medal = MedalCategory::ALL.iter().find_map(|category| {
                MedalRank::ALL
                    .iter()
                    .find(|rank| line == format!("{} {} Medal", category, rank))
                    .map(|rank| (*category, *rank))
            });
            if let Some(key) = medal {
                *tally.counts.entry(key).or_insert(0) += 1;
            }
        }
        tally
    }

    pub fn count(&self, category: MedalCategory, rank: MedalRank) -> u32 {
        self.counts.get(&(category, rank)).copied().unwrap_or(0)
    }

    /// Best medal earned in a category.
    pub fn highest(&self, category: MedalCategory) -> Option<MedalRank> {
        MedalRank::ALL
            .into_iter()
            .find(|rank| self.count(category, *rank) > 0)
    }
}
