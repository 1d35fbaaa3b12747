//! Per-column OCR glyph repair.
//!
//! Numeric columns go through a character confusion table, the class column
//! through the glyph variant lists in [`SymbolTable`], and names only lose
//! stray punctuation at their edges.

use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use tracing::trace;

use crate::model::{Confidence, CorrectedField, FieldKind, FieldSlot, FieldValue};
use crate::symbols::SymbolTable;

/// What to do with a non-digit character in a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Replace(char),
    /// Thousands separators.
    Drop,
}

lazy_static! {
    // ==========================================================================
    // Numeric columns: letters and marks read in place of digits
    // ==========================================================================
    static ref NUMERIC_CONFUSIONS: Vec<(char, Correction)> = vec![
        // 0
        ('O', Correction::Replace('0')),
        ('o', Correction::Replace('0')),
        ('Q', Correction::Replace('0')),
        ('D', Correction::Replace('0')),
        // 1
        ('I', Correction::Replace('1')),
        ('l', Correction::Replace('1')),
        ('i', Correction::Replace('1')),
        ('|', Correction::Replace('1')),
        ('!', Correction::Replace('1')),
        // 2
        ('Z', Correction::Replace('2')),
        ('z', Correction::Replace('2')),
        // 4
        ('A', Correction::Replace('4')),
        // 5
        ('S', Correction::Replace('5')),
        ('s', Correction::Replace('5')),
        ('$', Correction::Replace('5')),
        // 6
        ('G', Correction::Replace('6')),
        ('b', Correction::Replace('6')),
        // 7
        ('T', Correction::Replace('7')),
        // 8
        ('B', Correction::Replace('8')),
        // 9
        ('g', Correction::Replace('9')),
        ('q', Correction::Replace('9')),
        // Separators
        (',', Correction::Drop),
        ('.', Correction::Drop),
    ];

    // ==========================================================================
    // Names: punctuation the recognizer leaves at either edge of a name
    // ==========================================================================
    static ref NAME_EDGE_NOISE: Vec<char> = vec![
        '|', '¦', '\'', '`', '"', ',', '.', ':', ';', '•', '·',
    ];
}

/// Confusion tables owned by one engine instance.
#[derive(Debug, Clone)]
pub struct CorrectionTables {
    numeric: HashMap<char, Correction>,
    name_edge_noise: HashSet<char>,
}

impl CorrectionTables {
    /// Built-in tables plus `extra` numeric confusions (observed → digit).
    pub fn new(extra: &BTreeMap<char, char>) -> Self {
        let mut numeric: HashMap<char, Correction> = NUMERIC_CONFUSIONS.iter().cloned().collect();
        for (observed, digit) in extra {
            numeric.insert(*observed, Correction::Replace(*digit));
        }

        Self {
            numeric,
            name_edge_noise: NAME_EDGE_NOISE.iter().cloned().collect(),
        }
    }

    pub fn numeric_correction(&self, c: char) -> Option<Correction> {
        self.numeric.get(&c).copied()
    }

    /// Would this token plausibly be a number once corrected. At least half
    /// of its characters must already be digits.
    pub fn looks_numeric(&self, token: &str) -> bool {
        let total = token.chars().count();
        let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
        digits > 0
            && digits * 2 >= total
            && token
                .chars()
                .all(|c| c.is_ascii_digit() || self.numeric.contains_key(&c))
    }

    /// Looser than [`looks_numeric`](Self::looks_numeric): any token made of
    /// digits and confusable characters with at least one real digit.
    pub fn is_numeric_alphabet(&self, token: &str) -> bool {
        token.chars().any(|c| c.is_ascii_digit())
            && token
                .chars()
                .all(|c| c.is_ascii_digit() || self.numeric.contains_key(&c))
    }

    /// Corrected integer value of a token, if it has one.
    pub fn parse_numeric(&self, token: &str) -> Option<u32> {
        self.repair_digits(token).and_then(|(digits, _)| digits.parse().ok())
    }

    /// Repair one column according to its kind.
    pub fn correct(&self, slot: &FieldSlot, symbols: &SymbolTable) -> CorrectedField {
        let field = match slot.kind {
            FieldKind::ClassSymbol => self.correct_symbol(slot, symbols),
            FieldKind::Name => self.correct_name(slot),
            _ => self.correct_numeric(slot),
        };
        if field.confidence != Confidence::Exact {
            trace!(
                kind = %field.kind,
                raw = ?field.raw,
                value = ?field.value,
                confidence = ?field.confidence,
                "field correction"
            );
        }
        field
    }

    pub fn correct_numeric(&self, slot: &FieldSlot) -> CorrectedField {
        let Some(raw) = slot.raw.as_deref() else {
            return unresolved(slot, FieldValue::Missing);
        };

        match self.repair_digits(raw) {
            Some((digits, changed)) => match digits.parse::<u32>() {
                Ok(n) => CorrectedField {
                    kind: slot.kind,
                    raw: slot.raw.clone(),
                    value: FieldValue::Integer(n),
                    confidence: if changed {
                        Confidence::Corrected
                    } else {
                        Confidence::Exact
                    },
                },
                // Overflow
                Err(_) => unresolved(slot, FieldValue::Text(raw.to_string())),
            },
            None => unresolved(slot, FieldValue::Text(raw.to_string())),
        }
    }

    /// Match the observed glyph against every glyph's variants. One match is
    /// a correction; none or several leave the field unresolved.
    pub fn correct_symbol(&self, slot: &FieldSlot, symbols: &SymbolTable) -> CorrectedField {
        let Some(raw) = slot.raw.as_deref() else {
            return unresolved(slot, FieldValue::Missing);
        };

        if symbols.role_for(raw).is_some() {
            return CorrectedField {
                kind: slot.kind,
                raw: slot.raw.clone(),
                value: FieldValue::Symbol(raw.to_string()),
                confidence: Confidence::Exact,
            };
        }

        match symbols.candidates(raw).as_slice() {
            [only] => CorrectedField {
                kind: slot.kind,
                raw: slot.raw.clone(),
                value: FieldValue::Symbol(only.to_string()),
                confidence: Confidence::Corrected,
            },
            _ => unresolved(slot, FieldValue::Symbol(raw.to_string())),
        }
    }

    /// Names are free text: only edge punctuation and isolated noise tokens
    /// at either end are removed.
    pub fn correct_name(&self, slot: &FieldSlot) -> CorrectedField {
        let Some(raw) = slot.raw.as_deref() else {
            return unresolved(slot, FieldValue::Missing);
        };

        let mut name = raw.trim();
        loop {
            let before = name;
            name = self.strip_noise_token(name);
            name = name
                .trim_matches(|c: char| self.name_edge_noise.contains(&c))
                .trim();
            if name == before {
                break;
            }
        }

        if name.is_empty() {
            return unresolved(slot, FieldValue::Missing);
        }

        CorrectedField {
            kind: slot.kind,
            raw: slot.raw.clone(),
            value: FieldValue::Text(name.to_string()),
            confidence: if name == raw {
                Confidence::Exact
            } else {
                Confidence::Corrected
            },
        }
    }

    /// Drop a leading or trailing token made only of punctuation, e.g. the
    /// "-" in "- Name".
    fn strip_noise_token<'a>(&self, name: &'a str) -> &'a str {
        let is_noise = |token: &str| !token.chars().any(char::is_alphanumeric);
        let mut name = name;
        if let Some((first, rest)) = name.split_once(char::is_whitespace) {
            if is_noise(first) {
                name = rest.trim_start();
            }
        }
        if let Some((rest, last)) = name.rsplit_once(char::is_whitespace) {
            if is_noise(last) {
                name = rest.trim_end();
            }
        }
        name
    }

    /// Digits of `raw` after the confusion table is applied, and whether any
    /// character changed. `None` if a non-digit survives or nothing is left.
    fn repair_digits(&self, raw: &str) -> Option<(String, bool)> {
        let mut digits = String::with_capacity(raw.len());
        let mut changed = false;
        for c in raw.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            match self.numeric.get(&c)? {
                Correction::Replace(d) => digits.push(*d),
                Correction::Drop => {}
            }
            changed = true;
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((digits, changed))
    }
}

impl Default for CorrectionTables {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

fn unresolved(slot: &FieldSlot, value: FieldValue) -> CorrectedField {
    CorrectedField {
        kind: slot.kind,
        raw: slot.raw.clone(),
        value,
        confidence: Confidence::Unresolved,
    }
}
