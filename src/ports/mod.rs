//! Store port. The wallet store is the only component allowed to mutate
//! balances; both the transfer engine and the trading desk go through it.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, Holding, LedgerEntry, StockTrade};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// An account row changed under a version-guarded commit. Nothing was
    /// applied; the caller re-reads and retries.
    #[error("version conflict")]
    Conflict,

    #[error("duplicate account: {0}")]
    DuplicateAccount(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// One version-guarded balance write. `expected_version` is the version
/// observed when the balance was read; a mismatch at commit time fails
/// the whole unit of work with [`StoreError::Conflict`].
#[derive(Debug, Clone)]
pub struct BalanceUpdate {
    pub account_id: Uuid,
    pub expected_version: i64,
    pub new_balance: BigDecimal,
}

/// The full effect of one transfer: two balance writes and the
/// DEBIT/CREDIT ledger pair. Applied atomically or not at all.
#[derive(Debug, Clone)]
pub struct TransferCommit {
    pub debit_balance: BalanceUpdate,
    pub credit_balance: BalanceUpdate,
    pub debit_entry: LedgerEntry,
    pub credit_entry: LedgerEntry,
}

/// The full effect of one stock order: a balance write, the new holding
/// state and the trade row. Same atomicity contract as transfers.
#[derive(Debug, Clone)]
pub struct TradeCommit {
    pub balance: BalanceUpdate,
    /// `None` means the position closed and the holding row goes away.
    pub holding: Option<Holding>,
    pub trade: StockTrade,
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn create_account(&self, account: &Account) -> StoreResult<()>;

    async fn load(&self, id: Uuid) -> StoreResult<Account>;

    async fn find_by_address(&self, address: &str) -> StoreResult<Option<Account>>;

    async fn find_by_token(&self, token: Uuid) -> StoreResult<Option<Account>>;

    /// Atomically applies both balance writes and both ledger rows.
    /// Either every write lands or none does, including under concurrent
    /// commits touching the same accounts.
    async fn commit_transfer(&self, commit: &TransferCommit) -> StoreResult<()>;

    /// Newest-first ledger rows owned by one account.
    async fn recent_entries(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<LedgerEntry>>;

    async fn load_holding(&self, account_id: Uuid, symbol: &str) -> StoreResult<Option<Holding>>;

    async fn load_holdings(&self, account_id: Uuid) -> StoreResult<Vec<Holding>>;

    /// Atomically applies a balance write, a holding upsert (or removal)
    /// and the trade row.
    async fn commit_trade(&self, commit: &TradeCommit) -> StoreResult<()>;

    /// Newest-first executed orders for one account.
    async fn recent_trades(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<StockTrade>>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}
