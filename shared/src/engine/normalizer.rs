//! Turns ledger transactions into signed per-bin effects

use chrono::{DateTime, Utc};

use crate::models::{Adjustment, Dispatch, Receipt, Transaction, TransactionLine, Transfer};
use crate::types::{BalanceKey, BinId, Quantity, TransactionId};

/// A signed change to one (item, bin) balance
#[derive(Debug, Clone, PartialEq)]
pub struct StockEffect {
    pub transaction_id: TransactionId,
    /// Position of the effect inside its transaction
    pub leg: usize,
    pub key: BalanceKey,
    pub delta: Quantity,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub effects: Vec<StockEffect>,
    /// Lines dropped for an unresolvable item or bin reference
    pub skipped: usize,
}

/// Map every participating transaction onto its effects.
///
/// Transactions that are not completed (legacy transfers aside) are ignored.
pub fn normalize(transactions: &[Transaction]) -> Normalized {
    let mut out = Normalized::default();

    for transaction in transactions {
        if !transaction.participates() {
            tracing::debug!(
                transaction_id = %transaction.id(),
                kind = transaction.kind().as_str(),
                status = ?transaction.status(),
                "Ignoring non-participating transaction"
            );
            continue;
        }

        match transaction {
            Transaction::Receipt(t) => normalize_receipt(t, &mut out),
            Transaction::Dispatch(t) => normalize_dispatch(t, &mut out),
            Transaction::Transfer(t) => normalize_transfer(t, &mut out),
            Transaction::Adjustment(t) => normalize_adjustment(t, &mut out),
        }
    }

    out
}

fn normalize_receipt(receipt: &Receipt, out: &mut Normalized) {
    single_bin_effects(
        receipt.id,
        receipt.receipt_date,
        receipt.receiving_bin_id,
        &receipt.lines,
        |qty| qty,
        out,
    );
}

fn normalize_dispatch(dispatch: &Dispatch, out: &mut Normalized) {
    single_bin_effects(
        dispatch.id,
        dispatch.dispatch_date,
        dispatch.source_bin_id,
        &dispatch.lines,
        |qty| -qty,
        out,
    );
}

fn normalize_adjustment(adjustment: &Adjustment, out: &mut Normalized) {
    let reduction = adjustment.adjustment_type.is_reduction();
    single_bin_effects(
        adjustment.id,
        adjustment.adjustment_date,
        adjustment.bin_id,
        &adjustment.lines,
        |qty| if reduction { -qty.abs() } else { qty.abs() },
        out,
    );
}

fn normalize_transfer(transfer: &Transfer, out: &mut Normalized) {
    let (from, to) = match (transfer.from_bin_id, transfer.to_bin_id) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            // Both legs or neither, so the move stays conserved.
            tracing::warn!(
                transaction_id = %transfer.id,
                from_bin = ?transfer.from_bin_id,
                to_bin = ?transfer.to_bin_id,
                "Skipping transfer without both bin references"
            );
            out.skipped += transfer.lines.len();
            return;
        }
    };

    for (idx, line) in transfer.lines.iter().enumerate() {
        let Some(item_id) = line.stock_item_id else {
            skip_line(transfer.id, out);
            continue;
        };

        out.effects.push(StockEffect {
            transaction_id: transfer.id,
            leg: idx * 2,
            key: BalanceKey::new(item_id, from),
            delta: -line.quantity,
            timestamp: transfer.transfer_date,
        });
        out.effects.push(StockEffect {
            transaction_id: transfer.id,
            leg: idx * 2 + 1,
            key: BalanceKey::new(item_id, to),
            delta: line.quantity,
            timestamp: transfer.transfer_date,
        });
    }
}

fn single_bin_effects(
    transaction_id: TransactionId,
    timestamp: DateTime<Utc>,
    bin_id: Option<BinId>,
    lines: &[TransactionLine],
    signed: impl Fn(Quantity) -> Quantity,
    out: &mut Normalized,
) {
    let Some(bin_id) = bin_id else {
        tracing::warn!(
            transaction_id = %transaction_id,
            "Skipping transaction without a bin reference"
        );
        out.skipped += lines.len();
        return;
    };

    for (idx, line) in lines.iter().enumerate() {
        let Some(item_id) = line.stock_item_id else {
            skip_line(transaction_id, out);
            continue;
        };

        out.effects.push(StockEffect {
            transaction_id,
            leg: idx,
            key: BalanceKey::new(item_id, bin_id),
            delta: signed(line.quantity),
            timestamp,
        });
    }
}

fn skip_line(transaction_id: TransactionId, out: &mut Normalized) {
    tracing::warn!(
        transaction_id = %transaction_id,
        "Skipping transaction line without a stock item reference"
    );
    out.skipped += 1;
}
