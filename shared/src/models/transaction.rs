//! Inventory-moving ledger transactions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BinId, StockItemId, TransactionId};

/// Transaction kinds understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Receipt,
    Dispatch,
    Transfer,
    Adjustment,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Receipt,
        TransactionKind::Dispatch,
        TransactionKind::Transfer,
        TransactionKind::Adjustment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Receipt => "receipt",
            TransactionKind::Dispatch => "dispatch",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Adjustment => "adjustment",
        }
    }

    /// Returns `None` for kinds the engine does not support
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "receipt" => Some(TransactionKind::Receipt),
            "dispatch" => Some(TransactionKind::Dispatch),
            "transfer" => Some(TransactionKind::Transfer),
            "adjustment" => Some(TransactionKind::Adjustment),
            _ => None,
        }
    }
}

/// Workflow status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Draft,
    Pending,
    Approved,
    Completed,
    Cancelled,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "draft",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "draft" => TransactionStatus::Draft,
            "pending" => TransactionStatus::Pending,
            "approved" => TransactionStatus::Approved,
            "completed" => TransactionStatus::Completed,
            "cancelled" => TransactionStatus::Cancelled,
            "rejected" => TransactionStatus::Rejected,
            _ => TransactionStatus::Unknown,
        }
    }
}

/// Reason recorded on an adjustment; decides its sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Loss,
    Wastage,
    Expiry,
    Damage,
    Theft,
    Found,
    Correction,
    Return,
    #[serde(other)]
    Other,
}

impl AdjustmentType {
    /// Loss, wastage, expiry, damage and theft take stock away; every other
    /// reason adds it.
    pub fn is_reduction(&self) -> bool {
        matches!(
            self,
            AdjustmentType::Loss
                | AdjustmentType::Wastage
                | AdjustmentType::Expiry
                | AdjustmentType::Damage
                | AdjustmentType::Theft
        )
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "loss" => AdjustmentType::Loss,
            "wastage" => AdjustmentType::Wastage,
            "expiry" => AdjustmentType::Expiry,
            "damage" => AdjustmentType::Damage,
            "theft" => AdjustmentType::Theft,
            "found" => AdjustmentType::Found,
            "correction" => AdjustmentType::Correction,
            "return" => AdjustmentType::Return,
            _ => AdjustmentType::Other,
        }
    }
}

/// One item line of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// `None` when the referenced stock item could not be resolved
    pub stock_item_id: Option<StockItemId>,
    pub quantity: Decimal,
}

impl TransactionLine {
    pub fn new(stock_item_id: StockItemId, quantity: Decimal) -> Self {
        Self {
            stock_item_id: Some(stock_item_id),
            quantity,
        }
    }
}

/// Goods received into a bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: TransactionId,
    pub status: Option<TransactionStatus>,
    pub receipt_date: DateTime<Utc>,
    pub receiving_bin_id: Option<BinId>,
    pub lines: Vec<TransactionLine>,
}

/// Goods sent out of a bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub id: TransactionId,
    pub status: Option<TransactionStatus>,
    pub dispatch_date: DateTime<Utc>,
    pub source_bin_id: Option<BinId>,
    pub lines: Vec<TransactionLine>,
}

/// Goods moved from one bin to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransactionId,
    pub status: Option<TransactionStatus>,
    pub transfer_date: DateTime<Utc>,
    pub from_bin_id: Option<BinId>,
    pub to_bin_id: Option<BinId>,
    pub lines: Vec<TransactionLine>,
}

/// Ad-hoc correction of one bin's stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: TransactionId,
    pub status: Option<TransactionStatus>,
    pub adjustment_date: DateTime<Utc>,
    pub bin_id: Option<BinId>,
    pub adjustment_type: AdjustmentType,
    pub lines: Vec<TransactionLine>,
}

/// A ledger entry that moves stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transaction {
    Receipt(Receipt),
    Dispatch(Dispatch),
    Transfer(Transfer),
    Adjustment(Adjustment),
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        match self {
            Transaction::Receipt(t) => t.id,
            Transaction::Dispatch(t) => t.id,
            Transaction::Transfer(t) => t.id,
            Transaction::Adjustment(t) => t.id,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Receipt(_) => TransactionKind::Receipt,
            Transaction::Dispatch(_) => TransactionKind::Dispatch,
            Transaction::Transfer(_) => TransactionKind::Transfer,
            Transaction::Adjustment(_) => TransactionKind::Adjustment,
        }
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        match self {
            Transaction::Receipt(t) => t.status,
            Transaction::Dispatch(t) => t.status,
            Transaction::Transfer(t) => t.status,
            Transaction::Adjustment(t) => t.status,
        }
    }

    /// Effective timestamp used to order the transaction in the fold
    pub fn effective_date(&self) -> DateTime<Utc> {
        match self {
            Transaction::Receipt(t) => t.receipt_date,
            Transaction::Dispatch(t) => t.dispatch_date,
            Transaction::Transfer(t) => t.transfer_date,
            Transaction::Adjustment(t) => t.adjustment_date,
        }
    }

    /// Every bin this transaction references
    pub fn bin_ids(&self) -> Vec<BinId> {
        match self {
            Transaction::Receipt(t) => t.receiving_bin_id.into_iter().collect(),
            Transaction::Dispatch(t) => t.source_bin_id.into_iter().collect(),
            Transaction::Transfer(t) => t.from_bin_id.into_iter().chain(t.to_bin_id).collect(),
            Transaction::Adjustment(t) => t.bin_id.into_iter().collect(),
        }
    }

    /// Completed transactions participate; transfers recorded before
    /// statuses existed carry no status and participate as well.
    pub fn participates(&self) -> bool {
        match self.status() {
            Some(TransactionStatus::Completed) => true,
            None => self.kind() == TransactionKind::Transfer,
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn transfer(status: Option<TransactionStatus>) -> Transaction {
        Transaction::Transfer(Transfer {
            id: TransactionId(Uuid::from_u128(1)),
            status,
            transfer_date: Utc::now(),
            from_bin_id: Some(BinId(Uuid::from_u128(10))),
            to_bin_id: Some(BinId(Uuid::from_u128(11))),
            lines: vec![],
        })
    }

    fn receipt(status: Option<TransactionStatus>) -> Transaction {
        Transaction::Receipt(Receipt {
            id: TransactionId(Uuid::from_u128(2)),
            status,
            receipt_date: Utc::now(),
            receiving_bin_id: Some(BinId(Uuid::from_u128(10))),
            lines: vec![],
        })
    }

    #[test]
    fn test_reducing_adjustment_types() {
        for t in [
            AdjustmentType::Loss,
            AdjustmentType::Wastage,
            AdjustmentType::Expiry,
            AdjustmentType::Damage,
            AdjustmentType::Theft,
        ] {
            assert!(t.is_reduction(), "{:?} should reduce stock", t);
        }
        for t in [
            AdjustmentType::Found,
            AdjustmentType::Correction,
            AdjustmentType::Return,
            AdjustmentType::Other,
        ] {
            assert!(!t.is_reduction(), "{:?} should add stock", t);
        }
    }

    #[test]
    fn test_unknown_adjustment_type_is_positive() {
        assert_eq!(AdjustmentType::parse("surplus"), AdjustmentType::Other);
        let parsed: AdjustmentType = serde_json::from_str("\"surplus\"").unwrap();
        assert_eq!(parsed, AdjustmentType::Other);
    }

    #[test]
    fn test_kind_parse_round_trips_known_kinds() {
        for kind in TransactionKind::ALL {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse("requisition"), None);
    }

    #[test]
    fn test_participation_rules() {
        assert!(receipt(Some(TransactionStatus::Completed)).participates());
        assert!(!receipt(Some(TransactionStatus::Pending)).participates());
        assert!(!receipt(None).participates());

        assert!(transfer(Some(TransactionStatus::Completed)).participates());
        assert!(transfer(None).participates());
        assert!(!transfer(Some(TransactionStatus::Cancelled)).participates());
    }

    #[test]
    fn test_transfer_references_both_bins() {
        let bins = transfer(None).bin_ids();
        assert_eq!(
            bins,
            vec![BinId(Uuid::from_u128(10)), BinId(Uuid::from_u128(11))]
        );
    }
}
