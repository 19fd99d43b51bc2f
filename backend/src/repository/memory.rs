use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use shared::{BinId, Count, SiteId, Transaction, TransactionKind};

use super::{LedgerRepository, RepositoryError, StatusFilter};

/// In-memory ledger.
///
/// Intended for tests/dev. Applies the same filters as the PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    counts: RwLock<Vec<Count>>,
    transactions: RwLock<Vec<Transaction>>,
    sites: RwLock<HashMap<SiteId, Vec<BinId>>>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(counts: Vec<Count>, transactions: Vec<Transaction>) -> Self {
        Self {
            counts: RwLock::new(counts),
            transactions: RwLock::new(transactions),
            sites: RwLock::new(HashMap::new()),
        }
    }

    // Writers recover a poisoned lock: a push cannot leave the vectors torn.
    pub fn add_count(&self, count: Count) {
        self.counts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(count);
    }

    pub fn add_transaction(&self, transaction: Transaction) {
        self.transactions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transaction);
    }

    pub fn add_site_bin(&self, site_id: SiteId, bin_id: BinId) {
        self.sites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(site_id)
            .or_default()
            .push(bin_id);
    }
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::LockPoisoned
}

#[async_trait::async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn list_counts(&self, bin_ids: &BTreeSet<BinId>) -> Result<Vec<Count>, RepositoryError> {
        let counts = self.counts.read().map_err(poisoned)?;
        Ok(counts
            .iter()
            .filter(|c| bin_ids.contains(&c.bin_id))
            .cloned()
            .collect())
    }

    async fn list_transactions(
        &self,
        bin_ids: &BTreeSet<BinId>,
        kinds: &[TransactionKind],
        status: StatusFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = self.transactions.read().map_err(poisoned)?;
        Ok(transactions
            .iter()
            .filter(|t| kinds.contains(&t.kind()))
            .filter(|t| status.accepts(t))
            .filter(|t| t.bin_ids().iter().any(|b| bin_ids.contains(b)))
            .cloned()
            .collect())
    }

    async fn list_site_bins(&self, site_id: SiteId) -> Result<Vec<BinId>, RepositoryError> {
        let sites = self.sites.read().map_err(poisoned)?;
        Ok(sites.get(&site_id).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::{
        Receipt, StockItemId, TransactionId, TransactionLine, TransactionStatus, Transfer,
    };
    use uuid::Uuid;

    fn bin(n: u128) -> BinId {
        BinId(Uuid::from_u128(n))
    }

    fn transfer(id: u128, status: Option<TransactionStatus>, from: u128, to: u128) -> Transaction {
        Transaction::Transfer(Transfer {
            id: TransactionId(Uuid::from_u128(id)),
            status,
            transfer_date: Utc::now(),
            from_bin_id: Some(bin(from)),
            to_bin_id: Some(bin(to)),
            lines: vec![TransactionLine::new(StockItemId(Uuid::from_u128(1)), Decimal::ONE)],
        })
    }

    #[tokio::test]
    async fn test_transactions_match_on_either_transfer_leg() {
        let repo = InMemoryLedgerRepository::with_records(
            vec![],
            vec![
                transfer(1, Some(TransactionStatus::Completed), 1, 2),
                transfer(2, Some(TransactionStatus::Completed), 3, 1),
                transfer(3, Some(TransactionStatus::Completed), 3, 4),
            ],
        );

        let wanted: BTreeSet<_> = [bin(1)].into_iter().collect();
        let found = repo
            .list_transactions(&wanted, &TransactionKind::ALL, StatusFilter::Completed)
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.id()).collect();
        assert_eq!(
            ids,
            vec![
                TransactionId(Uuid::from_u128(1)),
                TransactionId(Uuid::from_u128(2))
            ]
        );
    }

    #[tokio::test]
    async fn test_status_filters() {
        let repo = InMemoryLedgerRepository::with_records(
            vec![],
            vec![
                transfer(1, None, 1, 2),
                transfer(2, Some(TransactionStatus::Pending), 1, 2),
                Transaction::Receipt(Receipt {
                    id: TransactionId(Uuid::from_u128(3)),
                    status: None,
                    receipt_date: Utc::now(),
                    receiving_bin_id: Some(bin(1)),
                    lines: vec![],
                }),
            ],
        );
        let wanted: BTreeSet<_> = [bin(1)].into_iter().collect();

        let strict = repo
            .list_transactions(&wanted, &TransactionKind::ALL, StatusFilter::Completed)
            .await
            .unwrap();
        assert!(strict.is_empty());

        let legacy = repo
            .list_transactions(
                &wanted,
                &TransactionKind::ALL,
                StatusFilter::CompletedOrLegacyTransfer,
            )
            .await
            .unwrap();
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0].id(), TransactionId(Uuid::from_u128(1)));
    }

    #[tokio::test]
    async fn test_kind_filter_and_site_bins() {
        let repo = InMemoryLedgerRepository::new();
        repo.add_transaction(transfer(1, None, 1, 2));
        let site = SiteId(Uuid::from_u128(50));
        repo.add_site_bin(site, bin(1));
        repo.add_site_bin(site, bin(2));

        let wanted: BTreeSet<_> = [bin(1)].into_iter().collect();
        let receipts_only = repo
            .list_transactions(
                &wanted,
                &[TransactionKind::Receipt],
                StatusFilter::CompletedOrLegacyTransfer,
            )
            .await
            .unwrap();
        assert!(receipts_only.is_empty());

        assert_eq!(repo.list_site_bins(site).await.unwrap(), vec![bin(1), bin(2)]);
        assert!(repo
            .list_site_bins(SiteId(Uuid::from_u128(51)))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_poisoned_lock_still_accepts_writes_and_reports_reads() {
        let repo = std::sync::Arc::new(InMemoryLedgerRepository::new());
        let site = SiteId(Uuid::from_u128(60));

        let poisoner = repo.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.sites.write().unwrap();
            panic!("poison the site map");
        })
        .join();

        repo.add_site_bin(site, bin(1));
        assert_eq!(
            repo.sites
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&site)
                .cloned(),
            Some(vec![bin(1)])
        );

        let result = repo.list_site_bins(site).await;
        assert!(matches!(result, Err(RepositoryError::LockPoisoned)));
    }
}
