//! Clamps folded balances and projects them onto the requested pairs

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use super::Folded;
use crate::models::{Discrepancy, Reconstruction};
use crate::types::BalanceKey;

/// Build the final reconstruction from folded balances.
///
/// Only requested pairs are returned. A negative balance is reported as zero
/// and recorded as a [`Discrepancy`]; saturated pairs are listed in
/// `overflowed`.
pub fn finalize(
    folded: Folded,
    requested: &BTreeSet<BalanceKey>,
    skipped_references: usize,
) -> Reconstruction {
    let mut out = Reconstruction {
        skipped_references,
        overflowed: folded
            .overflowed
            .into_iter()
            .filter(|key| requested.contains(key))
            .collect(),
        ..Reconstruction::default()
    };

    for (key, quantity) in folded.balances {
        if !requested.contains(&key) {
            continue;
        }

        if quantity < Decimal::ZERO {
            tracing::warn!(
                stock_item_id = %key.stock_item_id,
                bin_id = %key.bin_id,
                computed = %quantity,
                "Negative stock balance clamped to zero"
            );
            out.discrepancies.push(Discrepancy {
                stock_item_id: key.stock_item_id,
                bin_id: key.bin_id,
                computed: quantity,
            });
            out.balances.insert(key, Decimal::ZERO);
        } else {
            out.balances.insert(key, quantity);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BinId, Quantity, StockItemId};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn folded(balances: &[(BalanceKey, Quantity)], overflowed: &[BalanceKey]) -> Folded {
        Folded {
            balances: balances.iter().copied().collect::<BTreeMap<_, _>>(),
            overflowed: overflowed.iter().copied().collect(),
        }
    }

    fn key(bin: u128) -> BalanceKey {
        BalanceKey::new(StockItemId(Uuid::from_u128(1)), BinId(Uuid::from_u128(bin)))
    }

    #[test]
    fn test_negative_balances_are_clamped_and_reported() {
        let requested: BTreeSet<_> = [key(1), key(2)].into_iter().collect();
        let input = folded(&[(key(1), Decimal::from(-3)), (key(2), Decimal::from(4))], &[]);

        let result = finalize(input, &requested, 0);
        assert_eq!(result.balances.get(key(1).stock_item_id, key(1).bin_id), Decimal::ZERO);
        assert_eq!(result.balances.get(key(2).stock_item_id, key(2).bin_id), Decimal::from(4));
        assert_eq!(result.discrepancies.len(), 1);
        assert_eq!(result.discrepancies[0].computed, Decimal::from(-3));
    }

    #[test]
    fn test_unrequested_pairs_are_dropped() {
        let requested: BTreeSet<_> = [key(1)].into_iter().collect();
        let input = folded(
            &[(key(1), Decimal::from(2)), (key(9), Decimal::from(-7))],
            &[key(9)],
        );

        let result = finalize(input, &requested, 2);
        assert_eq!(result.balances.len(), 1);
        assert!(!result.balances.contains(key(9).stock_item_id, key(9).bin_id));
        assert!(result.discrepancies.is_empty());
        assert!(result.overflowed.is_empty());
        assert_eq!(result.skipped_references, 2);
    }

    #[test]
    fn test_saturated_pairs_are_reported() {
        let requested: BTreeSet<_> = [key(1)].into_iter().collect();
        let input = folded(&[(key(1), Decimal::MAX)], &[key(1)]);

        let result = finalize(input, &requested, 0);
        assert_eq!(result.balances.get(key(1).stock_item_id, key(1).bin_id), Decimal::MAX);
        assert_eq!(result.overflowed, vec![key(1)]);
    }
}
