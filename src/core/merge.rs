//! Record set merging
//!
//! Records are keyed by their business number. Within a batch and across
//! batches the newest copy of a number wins.

use std::collections::HashMap;

use crate::entities::rnc::RncRecord;

/// Outcome of merging a batch into an existing set
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

impl MergeStats {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Drop unnumbered records and deduplicate by number (last occurrence wins,
/// first-seen position kept). Numbers and ids come out trimmed.
pub fn clean_batch(records: Vec<RncRecord>) -> Vec<RncRecord> {
    let mut out: Vec<RncRecord> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;

    for mut record in records {
        if !record.is_numbered() {
            dropped += 1;
            continue;
        }
        let key = record.number.trim().to_string();
        record.number = key.clone();
        record.id = key.clone();
        match index.get(&key) {
            Some(&pos) => out[pos] = record,
            None => {
                index.insert(key, out.len());
                out.push(record);
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped records without a number");
    }
    out
}

/// Merge `incoming` into `existing`, replacing by number
pub fn merge_records(existing: &mut Vec<RncRecord>, incoming: Vec<RncRecord>) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, r)| (r.number.trim().to_string(), i))
        .collect();

    for record in incoming {
        let key = record.number.trim().to_string();
        match index.get(&key) {
            Some(&pos) => {
                let created_at = existing[pos].created_at;
                existing[pos] = record;
                if existing[pos].created_at.is_none() {
                    existing[pos].created_at = created_at;
                }
                stats.updated += 1;
            }
            None => {
                index.insert(key, existing.len());
                existing.push(record);
                stats.inserted += 1;
            }
        }
    }

    stats
}
