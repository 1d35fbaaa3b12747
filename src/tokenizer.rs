//! Splits a block of recognized text into candidate player rows.
//!
//! The recognizer often breaks one scoreboard row over two lines (name on
//! one, stats on the next) and sometimes runs one player's stats into the
//! next player's name. Both are repaired here; every other line is passed on
//! as its own row so that nothing is dropped without a reason.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::lexicon::Lexicon;
use crate::model::{CandidateRow, RejectReason, RejectedRow, STAT_COUNT};

lazy_static! {
    static ref HEADER_WORD: Regex =
        Regex::new(r"(?i)\b(rank|class|name|score|kills|deaths|assists|revives|captures)\b").unwrap();
}

/// Minimum header words for a line to be taken as the column header.
const HEADER_MIN_WORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    Rows(Vec<CandidateRow>),
    /// No header and no rank anywhere in the block.
    Unparseable(RejectedRow),
}

/// NFKC-normalize and trim one recognized line.
pub fn normalize_line(line: &str) -> String {
    line.nfkc().collect::<String>().trim().to_string()
}

pub fn is_header(line: &str) -> bool {
    HEADER_WORD.find_iter(line).count() >= HEADER_MIN_WORDS
}

pub(crate) struct Tokenizer<'a> {
    pub lexicon: Lexicon<'a>,
    pub min_row_tokens: usize,
}

impl Tokenizer<'_> {
    pub fn tokenize<S: AsRef<str>>(&self, block: &[S]) -> Tokenized {
        let lines: Vec<(usize, String)> = block
            .iter()
            .enumerate()
            .map(|(i, line)| (i, normalize_line(line.as_ref())))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return Tokenized::Rows(Vec::new());
        }

        let mut rows: Vec<CandidateRow> = Vec::new();
        let mut header_seen = false;
        let mut anchored = false;

        for (index, line) in &lines {
            if is_header(line) {
                header_seen = true;
                anchored = true;
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let numeric_only = tokens.iter().all(|t| self.lexicon.is_stat_token(t));

            if let Some(previous) = rows.last_mut() {
                let need = self.missing_stats(&previous.text);
                let lead = tokens
                    .iter()
                    .take_while(|t| self.lexicon.is_stat_token(t))
                    .count();

                if need > 0 && lead > 0 {
                    // A complete stat line always belongs to the open row;
                    // any digits already on that row are part of the name.
                    if numeric_only && (tokens.len() <= need || tokens.len() == STAT_COUNT) {
                        debug!(line = index, into = previous.line_index, "joining stat fragment");
                        previous.text.push(' ');
                        previous.text.push_str(&tokens.join(" "));
                        continue;
                    }

                    if lead >= need && self.lexicon.is_row_start(&tokens[need..]) {
                        debug!(line = index, into = previous.line_index, "splitting merged rows");
                        previous.text.push(' ');
                        previous.text.push_str(&tokens[..need].join(" "));
                        rows.push(CandidateRow {
                            text: tokens[need..].join(" "),
                            line_index: *index,
                        });
                        anchored = true;
                        continue;
                    }
                }

                // Under a header, a short rankless line is a piece of the
                // open row (a name broken off its glyph, say), not a row.
                if need > 0
                    && header_seen
                    && !numeric_only
                    && tokens.len() < self.min_row_tokens
                    && !self.lexicon.is_row_start(&tokens)
                {
                    debug!(line = index, into = previous.line_index, "joining short line under header");
                    previous.text.push(' ');
                    previous.text.push_str(&tokens.join(" "));
                    continue;
                }
            }

            if self.lexicon.is_row_start(&tokens) {
                anchored = true;
            } else if header_seen {
                debug!(line = index, "row aligned under header without rank");
            } else {
                debug!(line = index, "line is not a row start");
            }

            rows.push(CandidateRow {
                text: tokens.join(" "),
                line_index: *index,
            });
        }

        if !anchored {
            let text = lines
                .iter()
                .map(|(_, line)| line.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Tokenized::Unparseable(RejectedRow {
                text,
                line_index: lines[0].0,
                reason: RejectReason::UnparseableBlock,
            });
        }

        Tokenized::Rows(rows)
    }

    /// Stat columns still missing from the end of a row.
    fn missing_stats(&self, text: &str) -> usize {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut present = tokens
            .iter()
            .skip(1)
            .rev()
            .take_while(|t| self.lexicon.is_stat_token(t))
            .count();

        // A word-like token right after the rank or glyph is the name.
        let first = tokens.len() - present;
        if present > 0 && self.lexicon.could_be_name(tokens[first]) {
            let before = tokens[first - 1];
            if first == 1 || self.lexicon.is_symbol_token(before, Some(tokens[first])) {
                present -= 1;
            }
        }
        STAT_COUNT.saturating_sub(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionTables;
    use crate::symbols::SymbolTable;

    fn tokenize_with(block: &[&str], min_row_tokens: usize) -> Tokenized {
        let tables = CorrectionTables::default();
        let symbols = SymbolTable::default();
        let tokenizer = Tokenizer {
            lexicon: Lexicon {
                tables: &tables,
                symbols: &symbols,
                max_rank: 64,
            },
            min_row_tokens,
        };
        tokenizer.tokenize(block)
    }

    fn tokenize(block: &[&str]) -> Tokenized {
        tokenize_with(block, 3)
    }

    fn rows(block: &[&str]) -> Vec<CandidateRow> {
        match tokenize(block) {
            Tokenized::Rows(rows) => rows,
            Tokenized::Unparseable(rejected) => panic!("unexpected rejection: {rejected:?}"),
        }
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(tokenize(&[]), Tokenized::Rows(Vec::new()));
        assert_eq!(tokenize(&["", "   "]), Tokenized::Rows(Vec::new()));
    }

    #[test]
    fn test_one_row_per_line() {
        let rows = rows(&["1 A Alpha 2000 10 2 3 0 1", "2 + Bravo 1800 6 4 1 5 0"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line_index, 0);
        assert_eq!(rows[1].text, "2 + Bravo 1800 6 4 1 5 0");
        assert_eq!(rows[1].line_index, 1);
    }

    #[test]
    fn test_rejoins_stat_line() {
        let rows = rows(&["1 A Alpha", "2000 10 2 3 0 1", "2 o Bravo", "1800 6 4 1 5 0"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "1 A Alpha 2000 10 2 3 0 1");
        assert_eq!(rows[1].text, "2 o Bravo 1800 6 4 1 5 0");
        assert_eq!(rows[1].line_index, 2);
    }

    #[test]
    fn test_rejoins_partial_stats() {
        let rows = rows(&["3 + Bob 1520 8 3", "2 1 0"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "3 + Bob 1520 8 3 2 1 0");
    }

    #[test]
    fn test_splits_merged_rows() {
        let rows = rows(&["1 A Alpha", "2000 10 2 3 0 1 2 + Bravo", "1800 6 4 1 5 0"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "1 A Alpha 2000 10 2 3 0 1");
        assert_eq!(rows[1].text, "2 + Bravo 1800 6 4 1 5 0");
        assert_eq!(rows[1].line_index, 1);
    }

    #[test]
    fn test_rejoins_stats_after_digit_name() {
        let word = rows(&["3 + l0l", "1520 8 3 2 1 0"]);
        assert_eq!(word.len(), 1);
        assert_eq!(word[0].text, "3 + l0l 1520 8 3 2 1 0");

        let trailing = rows(&["4 A Sniper 99", "900 1 1 1 1 1"]);
        assert_eq!(trailing.len(), 1);
        assert_eq!(trailing[0].text, "4 A Sniper 99 900 1 1 1 1 1");
    }

    #[test]
    fn test_small_score_fragment_is_not_a_rank() {
        let rows = rows(&["7 . Charlie", "12 3 0 1 0 0"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "7 . Charlie 12 3 0 1 0 0");
    }

    #[test]
    fn test_stray_lines_are_kept() {
        let rows = rows(&["1 A Alpha 2000 10 2 3 0 1", "garbage", "2 + Bravo 1800 6 4 1 5 0"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].text, "garbage");
        assert_eq!(rows[1].line_index, 1);
    }

    #[test]
    fn test_header_anchors_rankless_rows() {
        let rows = rows(&[
            "Rank Class Name Score Kills Deaths Assists Revives Captures",
            "A Alpha 2000 10 2 3 0 1",
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_index, 1);
    }

    #[test]
    fn test_short_lines_under_header_join_open_row() {
        let block = [
            "Rank Class Name Score Kills Deaths Assists Revives Captures",
            "3 +",
            "Bob",
            "1520 8 3 2 1 0",
        ];
        match tokenize_with(&block, 3) {
            Tokenized::Rows(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].text, "3 + Bob 1520 8 3 2 1 0");
                assert_eq!(rows[0].line_index, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match tokenize_with(&block, 1) {
            Tokenized::Rows(rows) => {
                let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
                assert_eq!(texts, vec!["3 +", "Bob 1520 8 3 2 1 0"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_short_lines_without_header_stay_rows() {
        let rows = rows(&["3 +", "Bob", "1520 8 3 2 1 0"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text, "Bob 1520 8 3 2 1 0");
    }

    #[test]
    fn test_unparseable_block() {
        match tokenize(&["Mission Complete", "Press any key"]) {
            Tokenized::Unparseable(rejected) => {
                assert_eq!(rejected.reason, RejectReason::UnparseableBlock);
                assert_eq!(rejected.text, "Mission Complete\nPress any key");
                assert_eq!(rejected.line_index, 0);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_full_width_digits_are_normalized() {
        assert_eq!(normalize_line("  ３ ＋ Bob  "), "3 + Bob");
    }
}
