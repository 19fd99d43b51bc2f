//! Derived stock balances

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BalanceKey, BinId, Quantity, StockItemId};

/// Non-negative quantities keyed by (stock item, bin)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockBalances {
    inner: BTreeMap<BalanceKey, Quantity>,
}

impl StockBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: BalanceKey, quantity: Quantity) {
        self.inner.insert(key, quantity);
    }

    /// Quantity for one pair; pairs never reconstructed read as zero
    pub fn get(&self, stock_item_id: StockItemId, bin_id: BinId) -> Quantity {
        self.inner
            .get(&BalanceKey::new(stock_item_id, bin_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, stock_item_id: StockItemId, bin_id: BinId) -> bool {
        self.inner
            .contains_key(&BalanceKey::new(stock_item_id, bin_id))
    }

    /// All item quantities held in one bin
    pub fn for_bin(&self, bin_id: BinId) -> BTreeMap<StockItemId, Quantity> {
        self.inner
            .iter()
            .filter(|(key, _)| key.bin_id == bin_id)
            .map(|(key, qty)| (key.stock_item_id, *qty))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BalanceKey, &Quantity)> {
        self.inner.iter()
    }

    /// Flattened form for serialization
    pub fn entries(&self) -> Vec<BalanceEntry> {
        self.inner
            .iter()
            .map(|(key, qty)| BalanceEntry {
                stock_item_id: key.stock_item_id,
                bin_id: key.bin_id,
                quantity: *qty,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// One balance as a flat record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub stock_item_id: StockItemId,
    pub bin_id: BinId,
    pub quantity: Quantity,
}

/// A balance that folded to below zero and was clamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub stock_item_id: StockItemId,
    pub bin_id: BinId,
    /// The negative value before clamping
    pub computed: Quantity,
}

/// Outcome of one reconstruction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub balances: StockBalances,
    pub discrepancies: Vec<Discrepancy>,
    /// Pairs whose total left the decimal range; their balance is saturated
    pub overflowed: Vec<BalanceKey>,
    /// Count and transaction lines dropped for unresolvable item or bin references
    pub skipped_references: usize,
}

impl Reconstruction {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Missing quantity for one line of a planned dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub stock_item_id: StockItemId,
    pub required: Quantity,
    pub available: Quantity,
}

impl Shortfall {
    pub fn missing(&self) -> Quantity {
        self.required - self.available
    }
}

/// Quantity of one item a caller intends to take from a bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredLine {
    pub stock_item_id: StockItemId,
    pub quantity: Quantity,
}
