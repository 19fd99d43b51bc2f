use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Adjustment, AdjustmentType, BinId, Count, CountId, CountLine, Dispatch, Receipt, SiteId,
    StockItemId, Transaction, TransactionId, TransactionKind, TransactionLine, TransactionStatus,
    Transfer,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{LedgerRepository, RepositoryError, StatusFilter};

/// PostgreSQL-backed ledger reader
#[derive(Clone)]
pub struct PgLedgerRepository {
    db: PgPool,
}

/// Row for count header query
#[derive(Debug, FromRow)]
struct CountRow {
    id: Uuid,
    bin_id: Uuid,
    count_date: DateTime<Utc>,
}

/// Row for count line query
#[derive(Debug, FromRow)]
struct CountLineRow {
    count_id: Uuid,
    stock_item_id: Option<Uuid>,
    counted_quantity: Decimal,
}

/// Row for transaction header query
#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    kind: String,
    status: Option<String>,
    effective_date: DateTime<Utc>,
    bin_id: Option<Uuid>,
    to_bin_id: Option<Uuid>,
    adjustment_type: Option<String>,
}

/// Row for transaction line query
#[derive(Debug, FromRow)]
struct TransactionLineRow {
    transaction_id: Uuid,
    stock_item_id: Option<Uuid>,
    quantity: Decimal,
}

impl TransactionRow {
    /// Build the typed transaction; `None` for kinds the engine does not know.
    fn into_transaction(self, lines: Vec<TransactionLine>) -> Option<Transaction> {
        let Some(kind) = TransactionKind::parse(&self.kind) else {
            tracing::debug!(
                transaction_id = %self.id,
                kind = %self.kind,
                "Ignoring transaction of unsupported kind"
            );
            return None;
        };

        let id = TransactionId(self.id);
        let status = self.status.as_deref().map(TransactionStatus::parse);
        let bin_id = self.bin_id.map(BinId);

        let transaction = match kind {
            TransactionKind::Receipt => Transaction::Receipt(Receipt {
                id,
                status,
                receipt_date: self.effective_date,
                receiving_bin_id: bin_id,
                lines,
            }),
            TransactionKind::Dispatch => Transaction::Dispatch(Dispatch {
                id,
                status,
                dispatch_date: self.effective_date,
                source_bin_id: bin_id,
                lines,
            }),
            TransactionKind::Transfer => Transaction::Transfer(Transfer {
                id,
                status,
                transfer_date: self.effective_date,
                from_bin_id: bin_id,
                to_bin_id: self.to_bin_id.map(BinId),
                lines,
            }),
            TransactionKind::Adjustment => Transaction::Adjustment(Adjustment {
                id,
                status,
                adjustment_date: self.effective_date,
                bin_id,
                adjustment_type: AdjustmentType::parse(
                    self.adjustment_type.as_deref().unwrap_or_default(),
                ),
                lines,
            }),
        };

        Some(transaction)
    }
}

impl PgLedgerRepository {
    /// Create a new PgLedgerRepository instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn uuids(bin_ids: &BTreeSet<BinId>) -> Vec<Uuid> {
    bin_ids.iter().map(|b| *b.as_uuid()).collect()
}

#[async_trait::async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn list_counts(&self, bin_ids: &BTreeSet<BinId>) -> Result<Vec<Count>, RepositoryError> {
        let headers = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT id, bin_id, count_date
            FROM stock_counts
            WHERE bin_id = ANY($1)
            "#,
        )
        .bind(uuids(bin_ids))
        .fetch_all(&self.db)
        .await?;

        if headers.is_empty() {
            return Ok(vec![]);
        }

        let count_ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let line_rows = sqlx::query_as::<_, CountLineRow>(
            r#"
            SELECT count_id, stock_item_id, counted_quantity
            FROM stock_count_lines
            WHERE count_id = ANY($1)
            ORDER BY count_id, line_no
            "#,
        )
        .bind(&count_ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines: HashMap<Uuid, Vec<CountLine>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.count_id).or_default().push(CountLine {
                stock_item_id: row.stock_item_id.map(StockItemId),
                counted_quantity: row.counted_quantity,
            });
        }

        Ok(headers
            .into_iter()
            .map(|h| Count {
                id: CountId(h.id),
                bin_id: BinId(h.bin_id),
                count_date: h.count_date,
                lines: lines.remove(&h.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn list_transactions(
        &self,
        bin_ids: &BTreeSet<BinId>,
        kinds: &[TransactionKind],
        status: StatusFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let kind_names: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
        let include_legacy = status == StatusFilter::CompletedOrLegacyTransfer;

        let headers = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, kind, status, effective_date, bin_id, to_bin_id, adjustment_type
            FROM stock_transactions
            WHERE (bin_id = ANY($1) OR to_bin_id = ANY($1))
              AND kind = ANY($2)
              AND (status = 'completed'
                   OR ($3 AND kind = 'transfer' AND status IS NULL))
            "#,
        )
        .bind(uuids(bin_ids))
        .bind(&kind_names)
        .bind(include_legacy)
        .fetch_all(&self.db)
        .await?;

        if headers.is_empty() {
            return Ok(vec![]);
        }

        let transaction_ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let line_rows = sqlx::query_as::<_, TransactionLineRow>(
            r#"
            SELECT transaction_id, stock_item_id, quantity
            FROM stock_transaction_lines
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, line_no
            "#,
        )
        .bind(&transaction_ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines: HashMap<Uuid, Vec<TransactionLine>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.transaction_id).or_default().push(TransactionLine {
                stock_item_id: row.stock_item_id.map(StockItemId),
                quantity: row.quantity,
            });
        }

        Ok(headers
            .into_iter()
            .filter_map(|h| {
                let tx_lines = lines.remove(&h.id).unwrap_or_default();
                h.into_transaction(tx_lines)
            })
            .collect())
    }

    async fn list_site_bins(&self, site_id: SiteId) -> Result<Vec<BinId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM bins WHERE site_id = $1 ORDER BY id",
        )
        .bind(site_id.as_uuid())
        .fetch_all(&self.db)
        .await?;

        Ok(ids.into_iter().map(BinId).collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
