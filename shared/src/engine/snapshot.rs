//! Picks the authoritative count per bin

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::add_or_saturate;
use crate::models::Count;
use crate::types::{BalanceKey, BinId, CountId, Quantity, StockItemId};

/// Starting quantities for one bin, taken from its latest count
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub count_id: CountId,
    pub count_date: DateTime<Utc>,
    pub quantities: HashMap<StockItemId, Quantity>,
}

impl Snapshot {
    pub fn quantity(&self, stock_item_id: StockItemId) -> Quantity {
        self.quantities
            .get(&stock_item_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotSelection {
    pub snapshots: HashMap<BinId, Snapshot>,
    /// Count lines without a resolvable stock item
    pub skipped: usize,
    /// Pairs whose summed count lines left the decimal range
    pub overflowed: BTreeSet<BalanceKey>,
}

/// Select the latest count per requested bin.
///
/// Counts sharing a `count_date` are ordered by id and the greatest id wins.
/// Lines repeating an item inside one count are summed.
pub fn select_snapshots(counts: &[Count], bin_ids: &BTreeSet<BinId>) -> SnapshotSelection {
    let mut latest: HashMap<BinId, &Count> = HashMap::new();

    for count in counts.iter().filter(|c| bin_ids.contains(&c.bin_id)) {
        let newer = match latest.get(&count.bin_id) {
            Some(current) => (count.count_date, count.id) > (current.count_date, current.id),
            None => true,
        };
        if newer {
            latest.insert(count.bin_id, count);
        }
    }

    let mut selection = SnapshotSelection::default();

    for (bin_id, count) in latest {
        let mut quantities: HashMap<StockItemId, Quantity> = HashMap::new();
        for line in &count.lines {
            match line.stock_item_id {
                Some(item_id) => {
                    let quantity = quantities.entry(item_id).or_insert(Decimal::ZERO);
                    *quantity = match add_or_saturate(*quantity, line.counted_quantity) {
                        Ok(sum) => sum,
                        Err(saturated) => {
                            tracing::warn!(
                                count_id = %count.id,
                                stock_item_id = %item_id,
                                bin_id = %bin_id,
                                "Counted quantity overflowed and was saturated"
                            );
                            selection.overflowed.insert(BalanceKey::new(item_id, bin_id));
                            saturated
                        }
                    };
                }
                None => {
                    tracing::warn!(
                        count_id = %count.id,
                        bin_id = %bin_id,
                        "Skipping count line without a stock item reference"
                    );
                    selection.skipped += 1;
                }
            }
        }

        selection.snapshots.insert(
            bin_id,
            Snapshot {
                count_id: count.id,
                count_date: count.count_date,
                quantities,
            },
        );
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CountLine;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap()
    }

    fn count(id: u128, bin: BinId, date: DateTime<Utc>, lines: Vec<CountLine>) -> Count {
        Count {
            id: CountId(Uuid::from_u128(id)),
            bin_id: bin,
            count_date: date,
            lines,
        }
    }

    fn bins(ids: &[BinId]) -> BTreeSet<BinId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_latest_count_wins() {
        let bin = BinId(Uuid::from_u128(100));
        let item = StockItemId(Uuid::from_u128(200));
        let counts = vec![
            count(1, bin, at(1), vec![CountLine::new(item, Decimal::from(4))]),
            count(2, bin, at(5), vec![CountLine::new(item, Decimal::from(9))]),
            count(3, bin, at(3), vec![CountLine::new(item, Decimal::from(6))]),
        ];

        let selection = select_snapshots(&counts, &bins(&[bin]));
        let snapshot = &selection.snapshots[&bin];
        assert_eq!(snapshot.count_id, CountId(Uuid::from_u128(2)));
        assert_eq!(snapshot.quantity(item), Decimal::from(9));
    }

    #[test]
    fn test_same_date_tie_breaks_on_greatest_id() {
        let bin = BinId(Uuid::from_u128(100));
        let item = StockItemId(Uuid::from_u128(200));
        let forward = vec![
            count(7, bin, at(2), vec![CountLine::new(item, Decimal::from(1))]),
            count(9, bin, at(2), vec![CountLine::new(item, Decimal::from(2))]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        for counts in [forward, reversed] {
            let selection = select_snapshots(&counts, &bins(&[bin]));
            assert_eq!(
                selection.snapshots[&bin].count_id,
                CountId(Uuid::from_u128(9))
            );
        }
    }

    #[test]
    fn test_counts_for_unrequested_bins_are_ignored() {
        let wanted = BinId(Uuid::from_u128(100));
        let other = BinId(Uuid::from_u128(101));
        let item = StockItemId(Uuid::from_u128(200));
        let counts = vec![count(1, other, at(1), vec![CountLine::new(item, Decimal::ONE)])];

        let selection = select_snapshots(&counts, &bins(&[wanted]));
        assert!(selection.snapshots.is_empty());
    }

    #[test]
    fn test_lines_without_item_are_skipped_and_duplicates_summed() {
        let bin = BinId(Uuid::from_u128(100));
        let item = StockItemId(Uuid::from_u128(200));
        let lines = vec![
            CountLine::new(item, Decimal::from(3)),
            CountLine {
                stock_item_id: None,
                counted_quantity: Decimal::from(50),
            },
            CountLine::new(item, Decimal::new(25, 1)),
        ];

        let selection = select_snapshots(&[count(1, bin, at(1), lines)], &bins(&[bin]));
        assert_eq!(selection.skipped, 1);
        assert_eq!(selection.snapshots[&bin].quantity(item), Decimal::new(55, 1));
    }

    #[test]
    fn test_duplicate_lines_saturate_instead_of_overflowing() {
        let bin = BinId(Uuid::from_u128(100));
        let item = StockItemId(Uuid::from_u128(200));
        let lines = vec![
            CountLine::new(item, Decimal::MAX),
            CountLine::new(item, Decimal::MAX),
        ];

        let selection = select_snapshots(&[count(1, bin, at(1), lines)], &bins(&[bin]));
        assert_eq!(selection.snapshots[&bin].quantity(item), Decimal::MAX);
        assert!(selection.overflowed.contains(&BalanceKey::new(item, bin)));
    }
}
