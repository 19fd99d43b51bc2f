//! Physical inventory count models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BinId, CountId, StockItemId};

/// An audited physical count of one bin at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Count {
    pub id: CountId,
    pub bin_id: BinId,
    pub count_date: DateTime<Utc>,
    pub lines: Vec<CountLine>,
}

/// A counted quantity for one stock item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountLine {
    /// `None` when the referenced stock item could not be resolved
    pub stock_item_id: Option<StockItemId>,
    pub counted_quantity: Decimal,
}

impl CountLine {
    pub fn new(stock_item_id: StockItemId, counted_quantity: Decimal) -> Self {
        Self {
            stock_item_id: Some(stock_item_id),
            counted_quantity,
        }
    }
}
