//! Common identifier and key types used across the stock engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quantity of a stock item, always exact decimal
pub type Quantity = Decimal;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(
    /// Stock item identifier
    StockItemId
);
id_type!(
    /// Storage bin identifier
    BinId
);
id_type!(
    /// Site identifier, used only to group bins for fetching
    SiteId
);
id_type!(
    /// Count (physical inventory snapshot) identifier
    CountId
);
id_type!(
    /// Ledger transaction identifier
    TransactionId
);

/// Composite key of a balance: one stock item in one bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub stock_item_id: StockItemId,
    pub bin_id: BinId,
}

impl BalanceKey {
    pub fn new(stock_item_id: StockItemId, bin_id: BinId) -> Self {
        Self {
            stock_item_id,
            bin_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_keys_distinguish_item_and_bin() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        let k1 = BalanceKey::new(StockItemId(a), BinId(b));
        let k2 = BalanceKey::new(StockItemId(b), BinId(a));
        assert_ne!(k1, k2);
        assert_eq!(k1, BalanceKey::new(StockItemId(a), BinId(b)));
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let id = BinId(Uuid::from_u128(7));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", Uuid::from_u128(7)));
    }
}
