//! Postgres implementation of the wallet store.
//!
//! Atomicity comes from a single database transaction per commit; the
//! per-account version column turns concurrent read-modify-write races
//! into `StoreError::Conflict` instead of lost updates.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Account, Direction, Holding, LedgerEntry, StockTrade, TradeSide};
use crate::ports::{
    BalanceUpdate, StoreError, StoreResult, TradeCommit, TransferCommit, WalletStore,
};

#[derive(Clone)]
pub struct PostgresWalletStore {
    pool: PgPool,
}

impl PostgresWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn apply_balance(
    tx: &mut Transaction<'_, Postgres>,
    update: &BalanceUpdate,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE accounts SET balance = $1, version = version + 1 WHERE id = $2 AND version = $3",
    )
    .bind(&update.new_balance)
    .bind(update.account_id)
    .bind(update.expected_version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict);
    }
    Ok(())
}

async fn insert_entry(tx: &mut Transaction<'_, Postgres>, entry: &LedgerEntry) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, account_id, counterparty, amount, direction, note, reference, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id)
    .bind(entry.account_id)
    .bind(&entry.counterparty)
    .bind(&entry.amount)
    .bind(entry.direction.as_str())
    .bind(&entry.note)
    .bind(entry.reference)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl WalletStore for PostgresWalletStore {
    async fn create_account(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, phone, address, balance, version, token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.phone)
        .bind(&account.address)
        .bind(&account.balance)
        .bind(account.version)
        .bind(account.token)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                StoreError::DuplicateAccount(account.address.clone())
            }
            _ => StoreError::from(err),
        })?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_domain)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn find_by_address(&self, address: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AccountRow::into_domain))
    }

    async fn find_by_token(&self, token: Uuid) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AccountRow::into_domain))
    }

    async fn commit_transfer(&self, commit: &TransferCommit) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        apply_balance(&mut tx, &commit.debit_balance).await?;
        apply_balance(&mut tx, &commit.credit_balance).await?;
        insert_entry(&mut tx, &commit.debit_entry).await?;
        insert_entry(&mut tx, &commit.credit_entry).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn recent_entries(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT id, account_id, counterparty, amount, direction, note, reference, created_at
            FROM ledger_entries
            WHERE account_id = $1
            ORDER BY seq DESC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntryRow::into_domain).collect()
    }

    async fn load_holding(&self, account_id: Uuid, symbol: &str) -> StoreResult<Option<Holding>> {
        let row = sqlx::query_as::<_, HoldingRow>(
            "SELECT * FROM holdings WHERE account_id = $1 AND symbol = $2",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(HoldingRow::into_domain))
    }

    async fn load_holdings(&self, account_id: Uuid) -> StoreResult<Vec<Holding>> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            "SELECT * FROM holdings WHERE account_id = $1 ORDER BY symbol",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HoldingRow::into_domain).collect())
    }

    async fn commit_trade(&self, commit: &TradeCommit) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        apply_balance(&mut tx, &commit.balance).await?;

        match &commit.holding {
            Some(holding) => {
                sqlx::query(
                    r#"
                    INSERT INTO holdings (account_id, symbol, company_name, quantity, average_price)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (account_id, symbol)
                    DO UPDATE SET quantity = $4, average_price = $5
                    "#,
                )
                .bind(holding.account_id)
                .bind(&holding.symbol)
                .bind(&holding.company_name)
                .bind(holding.quantity)
                .bind(&holding.average_price)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM holdings WHERE account_id = $1 AND symbol = $2")
                    .bind(commit.trade.account_id)
                    .bind(&commit.trade.symbol)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO stock_trades (
                id, account_id, symbol, company_name, side, quantity,
                price, total_amount, reference, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(commit.trade.id)
        .bind(commit.trade.account_id)
        .bind(&commit.trade.symbol)
        .bind(&commit.trade.company_name)
        .bind(commit.trade.side.as_str())
        .bind(commit.trade.quantity)
        .bind(&commit.trade.price)
        .bind(&commit.trade.total_amount)
        .bind(commit.trade.reference)
        .bind(commit.trade.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn recent_trades(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<StockTrade>> {
        let rows = sqlx::query_as::<_, StockTradeRow>(
            r#"
            SELECT id, account_id, symbol, company_name, side, quantity,
                   price, total_amount, reference, created_at
            FROM stock_trades
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockTradeRow::into_domain).collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    phone: String,
    address: String,
    balance: BigDecimal,
    version: i64,
    token: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl AccountRow {
    fn into_domain(self) -> Account {
        Account {
            id: self.id,
            name: self.name,
            phone: self.phone,
            address: self.address,
            balance: self.balance,
            version: self.version,
            token: self.token,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    account_id: Uuid,
    counterparty: String,
    amount: BigDecimal,
    direction: String,
    note: String,
    reference: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl LedgerEntryRow {
    fn into_domain(self) -> StoreResult<LedgerEntry> {
        let direction = match self.direction.as_str() {
            "DEBIT" => Direction::Debit,
            "CREDIT" => Direction::Credit,
            other => {
                return Err(StoreError::Unavailable(format!(
                    "unknown ledger direction: {}",
                    other
                )))
            }
        };

        Ok(LedgerEntry {
            id: self.id,
            account_id: self.account_id,
            counterparty: self.counterparty,
            amount: self.amount,
            direction,
            note: self.note,
            reference: self.reference,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HoldingRow {
    account_id: Uuid,
    symbol: String,
    company_name: String,
    quantity: i64,
    average_price: BigDecimal,
}

impl HoldingRow {
    fn into_domain(self) -> Holding {
        Holding {
            account_id: self.account_id,
            symbol: self.symbol,
            company_name: self.company_name,
            quantity: self.quantity,
            average_price: self.average_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockTradeRow {
    id: Uuid,
    account_id: Uuid,
    symbol: String,
    company_name: String,
    side: String,
    quantity: i64,
    price: BigDecimal,
    total_amount: BigDecimal,
    reference: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl StockTradeRow {
    fn into_domain(self) -> StoreResult<StockTrade> {
        let side = match self.side.as_str() {
            "BUY" => TradeSide::Buy,
            "SELL" => TradeSide::Sell,
            other => {
                return Err(StoreError::Unavailable(format!(
                    "unknown trade side: {}",
                    other
                )))
            }
        };

        Ok(StockTrade {
            id: self.id,
            account_id: self.account_id,
            symbol: self.symbol,
            company_name: self.company_name,
            side,
            quantity: self.quantity,
            price: self.price,
            total_amount: self.total_amount,
            reference: self.reference,
            created_at: self.created_at,
        })
    }
}
