//! Accepts or rejects one row's corrected fields.
//!
//! Validation is per row: a bad field rejects only its own row. The one piece
//! of block-level state is the set of ranks already accepted.

use std::collections::HashMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::model::{
    CandidateRow, Confidence, CorrectedField, FieldKind, FieldValue, PlayerMatchRecord,
    RejectReason, RejectedRow, Role, STAT_COUNT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(PlayerMatchRecord),
    Rejected(RejectedRow),
}

pub struct Validator<'a> {
    config: &'a EngineConfig,
    /// Accepted rank → name.
    seen_ranks: HashMap<u32, String>,
}

impl<'a> Validator<'a> {
    /// One validator per block.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            seen_ranks: HashMap::new(),
        }
    }

    /// `fields` holds one corrected field per column in schema order; `role`
    /// is the mapped class.
    pub fn validate(&mut self, row: &CandidateRow, fields: &[CorrectedField], role: Role) -> Verdict {
        match self.check(fields, role) {
            Ok(record) => Verdict::Accepted(record),
            Err(reason) => {
                debug!(line = row.line_index, reason = %reason, text = %row.text, "row rejected");
                Verdict::Rejected(RejectedRow {
                    text: row.text.clone(),
                    line_index: row.line_index,
                    reason,
                })
            }
        }
    }

    fn check(&mut self, fields: &[CorrectedField], role: Role) -> Result<PlayerMatchRecord, RejectReason> {
        let field = |kind: FieldKind| fields.iter().find(|f| f.kind == kind);

        let name = match field(FieldKind::Name).map(|f| &f.value) {
            Some(FieldValue::Text(name)) if !name.is_empty() => name.clone(),
            _ => return Err(RejectReason::MissingName),
        };

        let unresolved = fields
            .iter()
            .filter(|f| f.kind.is_numeric() && f.confidence == Confidence::Unresolved)
            .count();
        if unresolved > self.config.max_unresolved_numeric {
            return Err(RejectReason::TooManyUnresolvedFields);
        }

        // Ranks are small positions on the board, never a stray score.
        let rank = field(FieldKind::Rank)
            .and_then(CorrectedField::integer)
            .filter(|rank| (1..=self.config.max_rank).contains(rank))
            .ok_or(RejectReason::NonNumericStat)?;

        let mut stats = [0u32; STAT_COUNT];
        for (slot, kind) in stats.iter_mut().zip(FieldKind::STATS) {
            *slot = match field(kind) {
                Some(f) => match f.integer() {
                    Some(n) => n,
                    None if f.is_missing() && self.config.missing_stats_as_zero => 0,
                    None => return Err(RejectReason::NonNumericStat),
                },
                None if self.config.missing_stats_as_zero => 0,
                None => return Err(RejectReason::NonNumericStat),
            };
        }

        match self.seen_ranks.get(&rank) {
            // Same player seen twice; the assembler keeps the first.
            Some(seen) if *seen == name => {}
            Some(_) => return Err(RejectReason::DuplicateRankInBlock),
            None => {
                self.seen_ranks.insert(rank, name.clone());
            }
        }

        let [score, kills, deaths, assists, revives, captures] = stats;
        Ok(PlayerMatchRecord {
            rank,
            role,
            name,
            score,
            kills,
            deaths,
            assists,
            revives,
            captures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(kind: FieldKind, value: u32) -> CorrectedField {
        CorrectedField {
            kind,
            raw: Some(value.to_string()),
            value: FieldValue::Integer(value),
            confidence: Confidence::Exact,
        }
    }

    fn name(value: &str) -> CorrectedField {
        CorrectedField {
            kind: FieldKind::Name,
            raw: Some(value.to_string()),
            value: FieldValue::Text(value.to_string()),
            confidence: Confidence::Exact,
        }
    }

    fn missing(kind: FieldKind) -> CorrectedField {
        CorrectedField {
            kind,
            raw: None,
            value: FieldValue::Missing,
            confidence: Confidence::Unresolved,
        }
    }

    fn garbled(kind: FieldKind, raw: &str) -> CorrectedField {
        CorrectedField {
            kind,
            raw: Some(raw.to_string()),
            value: FieldValue::Text(raw.to_string()),
            confidence: Confidence::Unresolved,
        }
    }

    fn fields(rank: u32, player: &str) -> Vec<CorrectedField> {
        let mut fields = vec![
            number(FieldKind::Rank, rank),
            CorrectedField {
                kind: FieldKind::ClassSymbol,
                raw: Some("+".to_string()),
                value: FieldValue::Symbol("+".to_string()),
                confidence: Confidence::Exact,
            },
            name(player),
        ];
        for (i, kind) in FieldKind::STATS.iter().enumerate() {
            fields.push(number(*kind, i as u32 * 10));
        }
        fields
    }

    fn row() -> CandidateRow {
        CandidateRow {
            text: "row".to_string(),
            line_index: 4,
        }
    }

    fn reason(verdict: Verdict) -> RejectReason {
        match verdict {
            Verdict::Rejected(rejected) => rejected.reason,
            Verdict::Accepted(record) => panic!("unexpected record: {record:?}"),
        }
    }

    #[test]
    fn test_accepts_complete_row() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        match validator.validate(&row(), &fields(3, "Bob"), Role::Medic) {
            Verdict::Accepted(record) => {
                assert_eq!(record.rank, 3);
                assert_eq!(record.role, Role::Medic);
                assert_eq!(record.name, "Bob");
                assert_eq!(record.stats(), [0, 10, 20, 30, 40, 50]);
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[2] = missing(FieldKind::Name);
        let verdict = validator.validate(&row(), &fields, Role::Medic);
        match verdict {
            Verdict::Rejected(rejected) => {
                assert_eq!(rejected.reason, RejectReason::MissingName);
                assert_eq!(rejected.line_index, 4);
                assert_eq!(rejected.text, "row");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_one_missing_stat_is_zero() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[8] = missing(FieldKind::Captures);
        match validator.validate(&row(), &fields, Role::Medic) {
            Verdict::Accepted(record) => assert_eq!(record.captures, 0),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_stat_without_zero_fill() {
        let config = EngineConfig {
            missing_stats_as_zero: false,
            ..EngineConfig::default()
        };
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[8] = missing(FieldKind::Captures);
        assert_eq!(
            reason(validator.validate(&row(), &fields, Role::Medic)),
            RejectReason::NonNumericStat
        );
    }

    #[test]
    fn test_garbled_stat_is_never_zeroed() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[4] = garbled(FieldKind::Kills, "8x");
        assert_eq!(
            reason(validator.validate(&row(), &fields, Role::Medic)),
            RejectReason::NonNumericStat
        );
    }

    #[test]
    fn test_too_many_unresolved() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[7] = missing(FieldKind::Revives);
        fields[8] = missing(FieldKind::Captures);
        assert_eq!(
            reason(validator.validate(&row(), &fields, Role::Medic)),
            RejectReason::TooManyUnresolvedFields
        );

        let relaxed = EngineConfig {
            max_unresolved_numeric: 2,
            ..EngineConfig::default()
        };
        let mut validator = Validator::new(&relaxed);
        assert!(matches!(
            validator.validate(&row(), &fields, Role::Medic),
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn test_missing_rank() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        let mut fields = fields(3, "Bob");
        fields[0] = missing(FieldKind::Rank);
        assert_eq!(
            reason(validator.validate(&row(), &fields, Role::Medic)),
            RejectReason::NonNumericStat
        );
    }

    #[test]
    fn test_rank_above_max_rank() {
        let config = EngineConfig {
            max_rank: 32,
            ..EngineConfig::default()
        };
        let mut validator = Validator::new(&config);
        assert_eq!(
            reason(validator.validate(&row(), &fields(1520, "Bob"), Role::Medic)),
            RejectReason::NonNumericStat
        );
        assert!(matches!(
            validator.validate(&row(), &fields(32, "Bob"), Role::Medic),
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn test_duplicate_rank() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        assert!(matches!(
            validator.validate(&row(), &fields(5, "First"), Role::Medic),
            Verdict::Accepted(_)
        ));
        assert_eq!(
            reason(validator.validate(&row(), &fields(5, "Second"), Role::Medic)),
            RejectReason::DuplicateRankInBlock
        );
        // An exact repeat is left to the assembler.
        assert!(matches!(
            validator.validate(&row(), &fields(5, "First"), Role::Medic),
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn test_unknown_role_is_accepted() {
        let config = EngineConfig::default();
        let mut validator = Validator::new(&config);
        match validator.validate(&row(), &fields(1, "Bob"), Role::Unknown) {
            Verdict::Accepted(record) => assert_eq!(record.role, Role::Unknown),
            other => panic!("expected record, got {other:?}"),
        }
    }
}
