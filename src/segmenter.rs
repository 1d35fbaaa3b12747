//! Cuts a candidate row into the nine scoreboard columns.
//!
//! Rank and class glyph are read from the left, the six stats from the right;
//! whatever lies between is the name. Missing trailing stats are left as
//! missing slots for the validator to judge.

use lazy_static::lazy_static;
use regex::Regex;

use crate::lexicon::Lexicon;
use crate::model::{CandidateRow, FieldKind, FieldSlot, STAT_COUNT};

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
}

/// Byte span of one whitespace-delimited token.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

pub(crate) struct Segmenter<'a> {
    pub lexicon: Lexicon<'a>,
}

impl Segmenter<'_> {
    /// Always returns one slot per column, in [`FieldKind::SCHEMA`] order.
    pub fn segment(&self, row: &CandidateRow) -> Vec<FieldSlot> {
        let text = row.text.as_str();
        let spans: Vec<Span> = TOKEN
            .find_iter(text)
            .map(|m| Span {
                start: m.start(),
                end: m.end(),
            })
            .collect();
        let token = |i: usize| &text[spans[i].start..spans[i].end];

        let mut rank: Option<&str> = None;
        let mut symbol: Option<&str> = None;
        // Start of the name when it begins inside a glued token.
        let mut name_start: Option<usize> = None;
        let mut next = 0;

        if !spans.is_empty() {
            let first = token(0);
            if let Some((digits, rest)) = self.lexicon.split_glued_rank(first) {
                rank = Some(digits);
                let (glyph, tail) = self
                    .lexicon
                    .split_glued_symbol(rest)
                    .unwrap_or((rest, ""));
                symbol = Some(glyph);
                if !tail.is_empty() {
                    name_start = Some(spans[0].end - tail.len());
                }
                next = 1;
            } else if self.lexicon.looks_numeric(first) {
                rank = Some(first);
                next = 1;
            }
        }

        if symbol.is_none() && next < spans.len() {
            let candidate = token(next);
            let following = (next + 1 < spans.len()).then(|| token(next + 1));
            if self.lexicon.is_symbol_token(candidate, following) {
                symbol = Some(candidate);
                next += 1;
            } else if let Some((glyph, tail)) = self.lexicon.split_glued_symbol(candidate) {
                if !tail.is_empty() && tail.chars().next().is_some_and(char::is_alphanumeric) {
                    symbol = Some(glyph);
                    name_start = Some(spans[next].end - tail.len());
                    next += 1;
                }
            }
        }

        // Stats: contiguous numeric tokens from the right. If that comes up
        // short, re-anchor on any six digit-bearing tokens that still leave a
        // name, so a garbled stat does not slide the window into the name.
        // A word-like token in the only place a name can sit stays the name.
        let holds_name =
            |i: usize| i == next && name_start.is_none() && self.lexicon.could_be_name(token(i));
        let scan = |accept: &dyn Fn(&str) -> bool| {
            let mut from = spans.len();
            while from > next
                && spans.len() - from < STAT_COUNT
                && !holds_name(from - 1)
                && accept(token(from - 1))
            {
                from -= 1;
            }
            from
        };
        let mut stats_from = scan(&|t| self.lexicon.is_stat_token(t));
        if spans.len() - stats_from < STAT_COUNT {
            let anchored = scan(&|t| t.bytes().any(|b| b.is_ascii_digit()));
            if spans.len() - anchored == STAT_COUNT && (anchored > next || name_start.is_some()) {
                stats_from = anchored;
            }
        }

        let name = match (name_start, stats_from > next) {
            (Some(start), true) => Some(&text[start..spans[stats_from - 1].end]),
            (Some(start), false) => Some(&text[start..spans[next - 1].end]),
            (None, true) => Some(&text[spans[next].start..spans[stats_from - 1].end]),
            (None, false) => None,
        };

        let mut slots = Vec::with_capacity(FieldKind::SCHEMA.len());
        slots.push(slot(FieldKind::Rank, rank));
        slots.push(slot(FieldKind::ClassSymbol, symbol));
        slots.push(slot(FieldKind::Name, name));
        for (i, kind) in FieldKind::STATS.iter().enumerate() {
            let raw = (stats_from + i < spans.len()).then(|| token(stats_from + i));
            slots.push(slot(*kind, raw));
        }
        slots
    }
}

fn slot(kind: FieldKind, raw: Option<&str>) -> FieldSlot {
    match raw {
        Some(raw) => FieldSlot::new(kind, raw),
        None => FieldSlot::missing(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::CorrectionTables;
    use crate::symbols::SymbolTable;

    fn segment(text: &str) -> Vec<Option<String>> {
        let tables = CorrectionTables::default();
        let symbols = SymbolTable::default();
        let segmenter = Segmenter {
            lexicon: Lexicon {
                tables: &tables,
                symbols: &symbols,
                max_rank: 64,
            },
        };
        let row = CandidateRow {
            text: text.to_string(),
            line_index: 0,
        };
        let slots = segmenter.segment(&row);
        assert_eq!(slots.len(), 9);
        for (slot, kind) in slots.iter().zip(FieldKind::SCHEMA) {
            assert_eq!(slot.kind, kind);
        }
        slots.into_iter().map(|s| s.raw).collect()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_full_row() {
        assert_eq!(
            segment("3  +  J0hn_Do3  1520  8  3  2  1  0"),
            some(&["3", "+", "J0hn_Do3", "1520", "8", "3", "2", "1", "0"])
        );
    }

    #[test]
    fn test_name_with_spaces_and_digits() {
        assert_eq!(
            segment("4 A Player 2 900 1 1 1 1 1"),
            some(&["4", "A", "Player 2", "900", "1", "1", "1", "1", "1"])
        );
    }

    #[test]
    fn test_missing_symbol() {
        let slots = segment("30 SeniorMoo 100 1 2 3 4 5");
        assert_eq!(slots[0].as_deref(), Some("30"));
        assert_eq!(slots[1], None);
        assert_eq!(slots[2].as_deref(), Some("SeniorMoo"));
        assert_eq!(slots[8].as_deref(), Some("5"));
    }

    #[test]
    fn test_missing_name() {
        let slots = segment("5 + 1520 8 3 2 1 0");
        assert_eq!(slots[1].as_deref(), Some("+"));
        assert_eq!(slots[2], None);
        assert_eq!(slots[3].as_deref(), Some("1520"));
    }

    #[test]
    fn test_missing_trailing_stats() {
        let slots = segment("2 o Bravo 1800 6 4 1");
        assert_eq!(slots[2].as_deref(), Some("Bravo"));
        assert_eq!(slots[6].as_deref(), Some("1"));
        assert_eq!(slots[7], None);
        assert_eq!(slots[8], None);
    }

    #[test]
    fn test_glued_rank_symbol_name() {
        assert_eq!(
            segment("3+Bob 1520 8 3 2 1 0"),
            some(&["3", "+", "Bob", "1520", "8", "3", "2", "1", "0"])
        );
        assert_eq!(
            segment("3 +Bob 1520 8 3 2 1 0"),
            some(&["3", "+", "Bob", "1520", "8", "3", "2", "1", "0"])
        );
        assert_eq!(
            segment("3+ Bob 1520 8 3 2 1 0"),
            some(&["3", "+", "Bob", "1520", "8", "3", "2", "1", "0"])
        );
    }

    #[test]
    fn test_confused_stat_tokens_stay_in_stat_columns() {
        assert_eq!(
            segment("1 A Alpha 2OOO l0 2 3 0 1"),
            some(&["1", "A", "Alpha", "2OOO", "l0", "2", "3", "0", "1"])
        );
    }

    #[test]
    fn test_garbled_stat_keeps_its_column() {
        assert_eq!(
            segment("1 A Alpha 2000 1x 2 3 0 1"),
            some(&["1", "A", "Alpha", "2000", "1x", "2", "3", "0", "1"])
        );
        // A digit-bearing name is not pulled into a short stat run.
        let slots = segment("3 + J0hn_Do3 1520 8 3 2 1");
        assert_eq!(slots[2].as_deref(), Some("J0hn_Do3"));
        assert_eq!(slots[3].as_deref(), Some("1520"));
        assert_eq!(slots[8], None);
    }

    #[test]
    fn test_stat_shaped_name_is_kept() {
        let slots = segment("3 + B0B 1520 8 3 2 1");
        assert_eq!(slots[2].as_deref(), Some("B0B"));
        assert_eq!(slots[3].as_deref(), Some("1520"));
        assert_eq!(slots[7].as_deref(), Some("1"));
        assert_eq!(slots[8], None);

        assert_eq!(
            segment("4 A Sniper 99 900 1 1 1 1 1"),
            some(&["4", "A", "Sniper 99", "900", "1", "1", "1", "1", "1"])
        );
        // Without a word-like token, the run still belongs to the stats.
        let slots = segment("5 + 1520 8 3 2 1 0");
        assert_eq!(slots[2], None);
    }

    #[test]
    fn test_rankless_row() {
        let slots = segment("A Alpha 2000 10 2 3 0 1");
        assert_eq!(slots[0], None);
        assert_eq!(slots[1].as_deref(), Some("A"));
        assert_eq!(slots[2].as_deref(), Some("Alpha"));
    }
}
