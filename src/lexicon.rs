//! Token-level predicates shared by the tokenizer and the segmenter.

use crate::correction::CorrectionTables;
use crate::symbols::SymbolTable;

pub(crate) struct Lexicon<'a> {
    pub tables: &'a CorrectionTables,
    pub symbols: &'a SymbolTable,
    pub max_rank: u32,
}

impl<'a> Lexicon<'a> {
    pub fn looks_numeric(&self, token: &str) -> bool {
        self.tables.looks_numeric(token)
    }

    /// Could this token fill a stat column.
    pub fn is_stat_token(&self, token: &str) -> bool {
        self.tables.is_numeric_alphabet(token)
    }

    /// A stat-shaped token that reads as a word, like `B0B` or `l0l`. Only
    /// used where the token is the last candidate for the name column.
    pub fn could_be_name(&self, token: &str) -> bool {
        token.chars().next().is_some_and(char::is_alphabetic)
    }

    fn is_glyph_char(&self, c: char) -> bool {
        self.symbols.glyph_chars().any(|g| g == c)
    }

    fn in_rank_range(&self, n: u32) -> bool {
        (1..=self.max_rank).contains(&n)
    }

    /// A rank followed directly by a glyph, as in `3+` or `3+Bob`. Returns
    /// the rank digits and the remainder. `1,520` is not split.
    pub fn split_glued_rank<'t>(&self, token: &'t str) -> Option<(&'t str, &'t str)> {
        let digits = token.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 3 || digits == token.len() {
            return None;
        }
        let (rank, rest) = token.split_at(digits);
        let mut chars = rest.chars();
        let first = chars.next()?;
        if !self.is_glyph_char(first) {
            return None;
        }
        if chars.next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        rank.parse().ok().filter(|n| self.in_rank_range(*n))?;
        Some((rank, rest))
    }

    /// A glyph glued to the start of a name, as in `+Bob`. Returns the glyph
    /// and the name part, which may be empty.
    pub fn split_glued_symbol<'t>(&self, token: &'t str) -> Option<(&'t str, &'t str)> {
        let first = token.chars().next()?;
        if !self.is_glyph_char(first) {
            return None;
        }
        let two = token.char_indices().nth(2).map_or(token.len(), |(i, _)| i);
        if two < token.len() || token.chars().count() == 2 {
            let pair = &token[..two];
            if self.symbols.is_known(pair) {
                return Some(token.split_at(two));
            }
        }
        Some(token.split_at(first.len_utf8()))
    }

    /// Rank value of a row's first token, glued forms included.
    pub fn leading_rank(&self, token: &str) -> Option<u32> {
        if let Some((rank, _)) = self.split_glued_rank(token) {
            return rank.parse().ok();
        }
        if !self.looks_numeric(token) {
            return None;
        }
        self.tables
            .parse_numeric(token)
            .filter(|n| self.in_rank_range(*n))
    }

    /// Whether `token` stands in the class column. A token that could also be
    /// a number only counts when a non-numeric token follows it.
    pub fn is_symbol_token(&self, token: &str, next: Option<&str>) -> bool {
        if token.chars().count() > 2 {
            return false;
        }
        let symbolic = self.symbols.is_known(token) || !token.chars().any(char::is_alphanumeric);
        if !symbolic {
            return false;
        }
        if self.looks_numeric(token) {
            return next.is_some_and(|n| !self.looks_numeric(n));
        }
        true
    }

    /// Does this token sequence open a player row.
    pub fn is_row_start(&self, tokens: &[&str]) -> bool {
        let Some(first) = tokens.first() else {
            return false;
        };
        if self.split_glued_rank(first).is_some() {
            return true;
        }
        if self.leading_rank(first).is_none() {
            return false;
        }
        match tokens.get(1) {
            Some(second) if !self.looks_numeric(second) => true,
            Some(second) => {
                self.is_symbol_token(second, tokens.get(2).copied())
                    || tokens.len() > crate::model::STAT_COUNT
                        && tokens.iter().all(|t| self.looks_numeric(t))
            }
            None => false,
        }
    }
}
