//! Read-only access to counts and ledger transactions
//!
//! The reconstruction engine never talks to storage directly; it is fed by a
//! [`LedgerRepository`]. Adapters:
//! - [`PgLedgerRepository`] reads PostgreSQL via `sqlx`
//! - [`InMemoryLedgerRepository`] serves fixed records for tests/dev

mod memory;
mod postgres;

use std::collections::BTreeSet;

use shared::{BinId, Count, SiteId, Transaction, TransactionKind};
use thiserror::Error;

pub use memory::InMemoryLedgerRepository;
pub use postgres::PgLedgerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode ledger record: {0}")]
    Decode(String),

    #[error("in-memory ledger lock poisoned")]
    LockPoisoned,
}

/// Which transaction statuses a fetch returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Only `completed` transactions
    Completed,
    /// `completed` transactions plus transfers without any status
    CompletedOrLegacyTransfer,
}

impl StatusFilter {
    pub fn accepts(&self, transaction: &Transaction) -> bool {
        match self {
            StatusFilter::Completed => {
                transaction.status() == Some(shared::TransactionStatus::Completed)
            }
            StatusFilter::CompletedOrLegacyTransfer => transaction.participates(),
        }
    }
}

/// Source of counts and transactions, filtered by bin.
#[async_trait::async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Every count taken in one of `bin_ids`, with its lines.
    async fn list_counts(&self, bin_ids: &BTreeSet<BinId>) -> Result<Vec<Count>, RepositoryError>;

    /// Transactions of the given kinds that reference at least one of
    /// `bin_ids` on any side, restricted by `status`.
    async fn list_transactions(
        &self,
        bin_ids: &BTreeSet<BinId>,
        kinds: &[TransactionKind],
        status: StatusFilter,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// Bins belonging to a site.
    async fn list_site_bins(&self, site_id: SiteId) -> Result<Vec<BinId>, RepositoryError>;

    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
