// 🔀 Aggregation Policy - logical OR across detector outputs
// No detector can unflag a record set by another; merge order is irrelevant.

use crate::detectors::{DetectorKind, FlagSet};
use crate::record::{RecordId, TransactionRecord};
use std::collections::BTreeMap;

/// Final decision per record. Every surviving record has an entry.
pub type FlagMap = BTreeMap<RecordId, bool>;

/// OR-merge detector hits over the record set
pub fn combine(records: &[TransactionRecord], hits: &BTreeMap<DetectorKind, FlagSet>) -> FlagMap {
    let mut flags: FlagMap = records.iter().map(|r| (r.id, false)).collect();

    for ids in hits.values() {
        for id in ids {
            if let Some(flag) = flags.get_mut(id) {
                *flag = true;
            }
        }
    }

    flags
}

/// Detectors that flagged a given record, in kind order
pub fn reasons_for(id: RecordId, hits: &BTreeMap<DetectorKind, FlagSet>) -> Vec<DetectorKind> {
    hits.iter()
        .filter(|(_, ids)| ids.contains(&id))
        .map(|(kind, _)| *kind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<TransactionRecord> {
        (0..n)
            .map(|i| TransactionRecord::new(i, 1.0, "A", "debit"))
            .collect()
    }

    #[test]
    fn test_or_merge() {
        let mut hits = BTreeMap::new();
        hits.insert(DetectorKind::HighValue, FlagSet::from([1]));
        hits.insert(DetectorKind::Weekend, FlagSet::from([1, 3]));

        let flags = combine(&records(4), &hits);
        assert_eq!(
            flags.values().copied().collect::<Vec<_>>(),
            vec![false, true, false, true]
        );
        assert_eq!(
            reasons_for(1, &hits),
            vec![DetectorKind::HighValue, DetectorKind::Weekend]
        );
        assert!(reasons_for(0, &hits).is_empty());
    }

    #[test]
    fn test_adding_detector_output_is_monotone() {
        let mut hits = BTreeMap::new();
        hits.insert(DetectorKind::HighValue, FlagSet::from([0, 2]));
        let before = combine(&records(3), &hits);

        hits.insert(DetectorKind::RiskyMerchant, FlagSet::from([1]));
        let after = combine(&records(3), &hits);

        for (id, flagged) in &before {
            if *flagged {
                assert!(after[id], "record {} lost its flag", id);
            }
        }
        assert!(after[&1]);
    }

    #[test]
    fn test_ids_outside_batch_ignored() {
        let mut hits = BTreeMap::new();
        hits.insert(DetectorKind::HighValue, FlagSet::from([99]));

        let flags = combine(&records(2), &hits);
        assert_eq!(flags.len(), 2);
        assert!(flags.values().all(|f| !f));
    }
}
