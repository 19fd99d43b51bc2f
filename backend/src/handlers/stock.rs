//! HTTP handlers for stock balance endpoints
//!
//! All endpoints are read-only.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{
    BalanceEntry, BalanceKey, BinId, Discrepancy, Quantity, RequiredLine, Shortfall, SiteId,
    StockItemId,
};

use crate::error::AppResult;
use crate::AppState;

/// Input for bulk balance lookup
#[derive(Debug, Deserialize)]
pub struct BulkStockInput {
    pub item_ids: Vec<StockItemId>,
    pub bin_ids: Vec<BinId>,
}

/// Balances plus the pairs that had to be clamped or saturated
#[derive(Debug, Serialize)]
pub struct BulkStockResponse {
    pub balances: Vec<BalanceEntry>,
    pub discrepancies: Vec<Discrepancy>,
    pub overflowed: Vec<BalanceKey>,
}

/// Input naming the items of interest
#[derive(Debug, Deserialize)]
pub struct ItemsInput {
    pub item_ids: Vec<StockItemId>,
}

#[derive(Debug, Serialize)]
pub struct CurrentStockResponse {
    pub stock_item_id: StockItemId,
    pub bin_id: BinId,
    pub quantity: Quantity,
}

#[derive(Debug, Serialize)]
pub struct ItemQuantity {
    pub stock_item_id: StockItemId,
    pub quantity: Quantity,
}

#[derive(Debug, Serialize)]
pub struct BinStockResponse {
    pub bin_id: BinId,
    pub items: Vec<ItemQuantity>,
}

/// Input for a single sufficiency check
#[derive(Debug, Deserialize)]
pub struct SufficiencyInput {
    pub stock_item_id: StockItemId,
    pub bin_id: BinId,
    pub required: Quantity,
}

#[derive(Debug, Serialize)]
pub struct SufficiencyResponse {
    pub sufficient: bool,
}

/// Input for checking a whole planned dispatch
#[derive(Debug, Deserialize)]
pub struct DispatchCheckInput {
    pub bin_id: BinId,
    pub lines: Vec<RequiredLine>,
}

#[derive(Debug, Serialize)]
pub struct DispatchCheckResponse {
    pub can_dispatch: bool,
    pub shortfalls: Vec<Shortfall>,
}

/// Reconstruct balances for a set of items across a set of bins
pub async fn bulk_stock(
    State(state): State<AppState>,
    Json(input): Json<BulkStockInput>,
) -> AppResult<Json<BulkStockResponse>> {
    let result = state
        .stock
        .reconstruct(&input.item_ids, &input.bin_ids)
        .await?;
    Ok(Json(BulkStockResponse {
        balances: result.balances.entries(),
        discrepancies: result.discrepancies,
        overflowed: result.overflowed,
    }))
}

/// Get current stock of one item in one bin
pub async fn get_current_stock(
    State(state): State<AppState>,
    Path((item_id, bin_id)): Path<(StockItemId, BinId)>,
) -> AppResult<Json<CurrentStockResponse>> {
    let quantity = state.stock.current_stock(item_id, bin_id).await?;
    Ok(Json(CurrentStockResponse {
        stock_item_id: item_id,
        bin_id,
        quantity,
    }))
}

/// Get current stock of several items in one bin
pub async fn get_bin_stock(
    State(state): State<AppState>,
    Path(bin_id): Path<BinId>,
    Json(input): Json<ItemsInput>,
) -> AppResult<Json<BinStockResponse>> {
    let quantities = state.stock.bin_stock(&input.item_ids, bin_id).await?;
    Ok(Json(BinStockResponse {
        bin_id,
        items: quantities
            .into_iter()
            .map(|(stock_item_id, quantity)| ItemQuantity {
                stock_item_id,
                quantity,
            })
            .collect(),
    }))
}

/// Get current stock of several items across every bin of a site
pub async fn get_site_stock(
    State(state): State<AppState>,
    Path(site_id): Path<SiteId>,
    Json(input): Json<ItemsInput>,
) -> AppResult<Json<Vec<BalanceEntry>>> {
    let balances = state.stock.site_stock(&input.item_ids, site_id).await?;
    Ok(Json(balances.entries()))
}

/// Check whether one bin holds enough of one item
pub async fn check_sufficiency(
    State(state): State<AppState>,
    Json(input): Json<SufficiencyInput>,
) -> AppResult<Json<SufficiencyResponse>> {
    let sufficient = state
        .stock
        .has_sufficient_stock(input.stock_item_id, input.bin_id, input.required)
        .await?;
    Ok(Json(SufficiencyResponse { sufficient }))
}

/// Check every line of a planned dispatch against one bin
pub async fn check_dispatch(
    State(state): State<AppState>,
    Json(input): Json<DispatchCheckInput>,
) -> AppResult<Json<DispatchCheckResponse>> {
    let shortfalls = state.stock.check_dispatch(input.bin_id, &input.lines).await?;
    Ok(Json(DispatchCheckResponse {
        can_dispatch: shortfalls.is_empty(),
        shortfalls,
    }))
}
