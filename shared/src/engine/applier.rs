//! Chronological fold of effects onto count baselines

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use super::normalizer::StockEffect;
use super::snapshot::Snapshot;
use super::{add_or_saturate, TransactionCutoff};
use crate::types::{BalanceKey, BinId, Quantity};

/// Balances after folding, before clamping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folded {
    pub balances: BTreeMap<BalanceKey, Quantity>,
    /// Pairs whose running total left the decimal range and was saturated
    pub overflowed: BTreeSet<BalanceKey>,
}

/// Fold `effects` in timestamp order onto the baselines of `requested`.
///
/// Every requested pair starts at its bin's counted quantity, or zero when the
/// bin has never been counted. Effects on pairs outside the request are still
/// accumulated from zero so both legs of a transfer are tracked.
pub fn apply(
    requested: &BTreeSet<BalanceKey>,
    snapshots: &HashMap<BinId, Snapshot>,
    mut effects: Vec<StockEffect>,
    cutoff: TransactionCutoff,
) -> Folded {
    let mut folded = Folded {
        balances: requested
            .iter()
            .map(|key| {
                let baseline = snapshots
                    .get(&key.bin_id)
                    .map(|s| s.quantity(key.stock_item_id))
                    .unwrap_or(Decimal::ZERO);
                (*key, baseline)
            })
            .collect(),
        overflowed: BTreeSet::new(),
    };

    effects.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
            .then_with(|| a.leg.cmp(&b.leg))
    });

    for effect in effects {
        if cutoff == TransactionCutoff::AfterLatestCount {
            if let Some(snapshot) = snapshots.get(&effect.key.bin_id) {
                if effect.timestamp < snapshot.count_date {
                    tracing::debug!(
                        transaction_id = %effect.transaction_id,
                        bin_id = %effect.key.bin_id,
                        "Effect predates the bin's latest count; not applied"
                    );
                    continue;
                }
            }
        }

        let balance = folded.balances.entry(effect.key).or_insert(Decimal::ZERO);
        *balance = match add_or_saturate(*balance, effect.delta) {
            Ok(sum) => sum,
            Err(saturated) => {
                tracing::warn!(
                    transaction_id = %effect.transaction_id,
                    stock_item_id = %effect.key.stock_item_id,
                    bin_id = %effect.key.bin_id,
                    "Stock balance overflowed and was saturated"
                );
                folded.overflowed.insert(effect.key);
                saturated
            }
        };
    }

    folded
}
