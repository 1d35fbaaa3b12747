//! Collects one block's verdicts into an [`ExtractionReport`].

use std::collections::HashSet;

use tracing::debug;

use crate::model::{ExtractionReport, PlayerMatchRecord, RejectedRow, RowFlag};

struct Entry {
    line_index: usize,
    record: PlayerMatchRecord,
    flags: Vec<RowFlag>,
}

#[derive(Default)]
pub struct Assembler {
    entries: Vec<Entry>,
    rejected: Vec<RejectedRow>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_record(&mut self, line_index: usize, record: PlayerMatchRecord, flags: Vec<RowFlag>) {
        self.entries.push(Entry {
            line_index,
            record,
            flags,
        });
    }

    pub fn push_rejected(&mut self, rejected: RejectedRow) {
        self.rejected.push(rejected);
    }

    /// Drop exact repeats (same rank and name, first kept), order records by
    /// rank and rejections by source line.
    pub fn finish(self) -> ExtractionReport {
        let mut seen: HashSet<(u32, String)> = HashSet::new();
        let mut merged_duplicates = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            if seen.insert((entry.record.rank, entry.record.name.clone())) {
                kept.push(entry);
            } else {
                debug!(
                    line = entry.line_index,
                    rank = entry.record.rank,
                    "dropping duplicate row"
                );
                merged_duplicates.push(entry.line_index);
            }
        }

        kept.sort_by_key(|entry| entry.record.rank);

        let mut rejected = self.rejected;
        rejected.sort_by_key(|row| row.line_index);

        let mut records = Vec::with_capacity(kept.len());
        let mut flags = Vec::new();
        for entry in kept {
            records.push(entry.record);
            flags.extend(entry.flags);
        }

        ExtractionReport {
            records,
            rejected,
            flags,
            merged_duplicates,
        }
    }
}
