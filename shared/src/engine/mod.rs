//! Stock reconstruction engine
//!
//! Rebuilds current per-(item, bin) quantities from the latest physical count
//! of each bin plus every participating ledger transaction:
//!
//! 1. [`select_snapshots`] picks the baseline count per bin
//! 2. [`normalize`] maps transactions onto signed effects
//! 3. [`apply`] folds effects in chronological order
//! 4. [`finalize`] clamps negatives and keeps the requested pairs
//!
//! The engine performs no IO and keeps no state between calls.

mod applier;
mod finalizer;
mod normalizer;
mod snapshot;

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Count, Reconstruction, Transaction};
use crate::types::{BalanceKey, BinId, Quantity, StockItemId};

pub use applier::{apply, Folded};
pub use finalizer::finalize;
pub use normalizer::{normalize, Normalized, StockEffect};
pub use snapshot::{select_snapshots, Snapshot, SnapshotSelection};

/// Which transactions are folded onto a bin's count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCutoff {
    /// Apply every participating transaction regardless of the count date
    #[default]
    ApplyAll,
    /// Skip effects dated strictly before the bin's latest count
    AfterLatestCount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionOptions {
    pub cutoff: TransactionCutoff,
}

/// Reconstruct balances for every pair in `item_ids` x `bin_ids`.
///
/// `counts` and `transactions` are expected to be the repository records for
/// `bin_ids`; records for other bins are tolerated.
pub fn reconstruct(
    item_ids: &BTreeSet<StockItemId>,
    bin_ids: &BTreeSet<BinId>,
    counts: &[Count],
    transactions: &[Transaction],
    options: ReconstructionOptions,
) -> Reconstruction {
    if item_ids.is_empty() || bin_ids.is_empty() {
        return Reconstruction::empty();
    }

    let requested: BTreeSet<BalanceKey> = item_ids
        .iter()
        .flat_map(|item| bin_ids.iter().map(move |bin| BalanceKey::new(*item, *bin)))
        .collect();

    let selection = select_snapshots(counts, bin_ids);
    let normalized = normalize(transactions);
    let skipped = selection.skipped + normalized.skipped;

    let mut folded = apply(
        &requested,
        &selection.snapshots,
        normalized.effects,
        options.cutoff,
    );

    folded.overflowed.extend(selection.overflowed);

    let result = finalize(folded, &requested, skipped);

    tracing::debug!(
        items = item_ids.len(),
        bins = bin_ids.len(),
        counts = counts.len(),
        transactions = transactions.len(),
        discrepancies = result.discrepancies.len(),
        overflowed = result.overflowed.len(),
        skipped_references = skipped,
        "Stock reconstruction finished"
    );

    result
}

/// `current + delta`, or `Err` holding the bound the sum ran past.
pub(crate) fn add_or_saturate(current: Quantity, delta: Quantity) -> Result<Quantity, Quantity> {
    current.checked_add(delta).ok_or(if delta.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
