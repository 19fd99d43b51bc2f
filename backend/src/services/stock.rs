//! Stock service: on-demand bin balances for the rest of the application
//!
//! Every call reads the ledger afresh and reconstructs balances from scratch;
//! nothing is cached between calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use shared::{
    reconstruct, validate_required_lines, validate_required_quantity, BinId, Count, Quantity,
    Reconstruction, ReconstructionOptions, RequiredLine, Shortfall, SiteId, StockBalances,
    StockItemId, Transaction, TransactionKind,
};

use crate::error::{AppError, AppResult};
use crate::repository::{LedgerRepository, StatusFilter};

/// Stock service for reconstructing balances from the ledger
#[derive(Clone)]
pub struct StockService {
    repo: Arc<dyn LedgerRepository>,
    options: ReconstructionOptions,
    fetch_timeout: Duration,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(
        repo: Arc<dyn LedgerRepository>,
        options: ReconstructionOptions,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            options,
            fetch_timeout,
        }
    }

    pub fn repository(&self) -> &Arc<dyn LedgerRepository> {
        &self.repo
    }

    /// Reconstruct balances, discrepancies included, for every item x bin pair
    pub async fn reconstruct(
        &self,
        item_ids: &[StockItemId],
        bin_ids: &[BinId],
    ) -> AppResult<Reconstruction> {
        let items: BTreeSet<StockItemId> = item_ids.iter().copied().collect();
        let bins: BTreeSet<BinId> = bin_ids.iter().copied().collect();

        if items.is_empty() || bins.is_empty() {
            return Ok(Reconstruction::empty());
        }

        let (counts, transactions) = self.fetch(&bins).await?;
        let result = reconstruct(&items, &bins, &counts, &transactions, self.options);

        if !result.overflowed.is_empty() {
            tracing::warn!(
                overflowed = result.overflowed.len(),
                "Stock reconstruction saturated out-of-range balances"
            );
        }

        if !result.discrepancies.is_empty() {
            tracing::warn!(
                discrepancies = result.discrepancies.len(),
                bins = bins.len(),
                "Stock reconstruction clamped negative balances"
            );
        }

        Ok(result)
    }

    /// Current quantity of every requested (item, bin) pair
    pub async fn bulk_stock(
        &self,
        item_ids: &[StockItemId],
        bin_ids: &[BinId],
    ) -> AppResult<StockBalances> {
        Ok(self.reconstruct(item_ids, bin_ids).await?.balances)
    }

    /// Current quantity of one item in one bin
    pub async fn current_stock(&self, item_id: StockItemId, bin_id: BinId) -> AppResult<Quantity> {
        let balances = self.bulk_stock(&[item_id], &[bin_id]).await?;
        Ok(balances.get(item_id, bin_id))
    }

    /// Current quantity of several items in one bin
    pub async fn bin_stock(
        &self,
        item_ids: &[StockItemId],
        bin_id: BinId,
    ) -> AppResult<BTreeMap<StockItemId, Quantity>> {
        let balances = self.bulk_stock(item_ids, &[bin_id]).await?;
        Ok(balances.for_bin(bin_id))
    }

    /// Whether a bin holds at least `required` of an item
    pub async fn has_sufficient_stock(
        &self,
        item_id: StockItemId,
        bin_id: BinId,
        required: Quantity,
    ) -> AppResult<bool> {
        validate_required_quantity(required)?;
        let available = self.current_stock(item_id, bin_id).await?;
        Ok(available >= required)
    }

    /// Lines of a planned dispatch that the bin cannot cover
    pub async fn check_dispatch(
        &self,
        bin_id: BinId,
        lines: &[RequiredLine],
    ) -> AppResult<Vec<Shortfall>> {
        validate_required_lines(lines)?;

        let item_ids: Vec<StockItemId> = lines.iter().map(|l| l.stock_item_id).collect();
        let balances = self.bulk_stock(&item_ids, &[bin_id]).await?;

        Ok(lines
            .iter()
            .filter_map(|line| {
                let available = balances.get(line.stock_item_id, bin_id);
                (available < line.quantity).then(|| Shortfall {
                    stock_item_id: line.stock_item_id,
                    required: line.quantity,
                    available,
                })
            })
            .collect())
    }

    /// Balances of the requested items across every bin of a site
    pub async fn site_stock(
        &self,
        item_ids: &[StockItemId],
        site_id: SiteId,
    ) -> AppResult<StockBalances> {
        let bin_ids = self.with_timeout(self.repo.list_site_bins(site_id)).await?;
        if bin_ids.is_empty() {
            return Err(AppError::NotFound(format!("Bins for site {}", site_id)));
        }
        self.bulk_stock(item_ids, &bin_ids).await
    }

    /// Read counts and transactions concurrently; both must succeed
    async fn fetch(&self, bins: &BTreeSet<BinId>) -> AppResult<(Vec<Count>, Vec<Transaction>)> {
        let reads = async {
            tokio::try_join!(
                self.repo.list_counts(bins),
                self.repo.list_transactions(
                    bins,
                    &TransactionKind::ALL,
                    StatusFilter::CompletedOrLegacyTransfer,
                ),
            )
        };

        self.with_timeout(reads).await
    }

    async fn with_timeout<T, E>(
        &self,
        fut: impl std::future::Future<Output = Result<T, E>>,
    ) -> AppResult<T>
    where
        AppError: From<E>,
    {
        match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::FetchTimeout(self.fetch_timeout)),
        }
    }
}
