//! In-memory implementation of the wallet store. Backs the unit and API
//! tests and the local demo mode; honors the same atomicity and version
//! guard contract as the Postgres adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::{Account, Holding, LedgerEntry, StockTrade};
use crate::ports::{
    BalanceUpdate, StoreError, StoreResult, TradeCommit, TransferCommit, WalletStore,
};

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    entries: Vec<LedgerEntry>,
    holdings: HashMap<(Uuid, String), Holding>,
    trades: Vec<StockTrade>,
}

#[derive(Default)]
pub struct InMemoryWalletStore {
    inner: Mutex<Inner>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    /// Total value held across all accounts; used by conservation tests.
    pub fn total_balance(&self) -> BigDecimal {
        match self.inner.lock() {
            Ok(inner) => inner
                .accounts
                .values()
                .map(|account| account.balance.clone())
                .sum(),
            Err(_) => BigDecimal::from(0),
        }
    }

    pub fn entry_count(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.entries.len(),
            Err(_) => 0,
        }
    }
}

fn apply_balance(inner: &mut Inner, update: &BalanceUpdate) -> StoreResult<()> {
    let account = inner
        .accounts
        .get_mut(&update.account_id)
        .ok_or_else(|| StoreError::NotFound(update.account_id.to_string()))?;

    if account.version != update.expected_version {
        return Err(StoreError::Conflict);
    }
    if update.new_balance < BigDecimal::from(0) {
        return Err(StoreError::Unavailable(
            "balance constraint violated".to_string(),
        ));
    }

    account.balance = update.new_balance.clone();
    account.version += 1;
    Ok(())
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn create_account(&self, account: &Account) -> StoreResult<()> {
        let mut inner = self.lock()?;

        let taken = inner
            .accounts
            .values()
            .any(|existing| existing.address == account.address || existing.phone == account.phone);
        if taken {
            return Err(StoreError::DuplicateAccount(account.address.clone()));
        }

        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        let inner = self.lock()?;
        inner
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn find_by_address(&self, address: &str) -> StoreResult<Option<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.address == address)
            .cloned())
    }

    async fn find_by_token(&self, token: Uuid) -> StoreResult<Option<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.token == token)
            .cloned())
    }

    async fn commit_transfer(&self, commit: &TransferCommit) -> StoreResult<()> {
        let mut inner = self.lock()?;

        // Version checks before any mutation so a conflict applies nothing.
        for update in [&commit.debit_balance, &commit.credit_balance] {
            let account = inner
                .accounts
                .get(&update.account_id)
                .ok_or_else(|| StoreError::NotFound(update.account_id.to_string()))?;
            if account.version != update.expected_version {
                return Err(StoreError::Conflict);
            }
        }

        apply_balance(&mut inner, &commit.debit_balance)?;
        apply_balance(&mut inner, &commit.credit_balance)?;
        inner.entries.push(commit.debit_entry.clone());
        inner.entries.push(commit.credit_entry.clone());
        Ok(())
    }

    async fn recent_entries(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|entry| entry.account_id == account_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn load_holding(&self, account_id: Uuid, symbol: &str) -> StoreResult<Option<Holding>> {
        let inner = self.lock()?;
        Ok(inner
            .holdings
            .get(&(account_id, symbol.to_string()))
            .cloned())
    }

    async fn load_holdings(&self, account_id: Uuid) -> StoreResult<Vec<Holding>> {
        let inner = self.lock()?;
        let mut holdings: Vec<Holding> = inner
            .holdings
            .values()
            .filter(|holding| holding.account_id == account_id)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(holdings)
    }

    async fn commit_trade(&self, commit: &TradeCommit) -> StoreResult<()> {
        let mut inner = self.lock()?;

        apply_balance(&mut inner, &commit.balance)?;

        let key = (commit.trade.account_id, commit.trade.symbol.clone());
        match &commit.holding {
            Some(holding) => {
                inner.holdings.insert(key, holding.clone());
            }
            None => {
                inner.holdings.remove(&key);
            }
        }
        inner.trades.push(commit.trade.clone());
        Ok(())
    }

    async fn recent_trades(&self, account_id: Uuid, limit: i64) -> StoreResult<Vec<StockTrade>> {
        let inner = self.lock()?;
        Ok(inner
            .trades
            .iter()
            .rev()
            .filter(|trade| trade.account_id == account_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use std::str::FromStr;

    fn account(name: &str, phone: &str, address: &str, balance: &str) -> Account {
        let mut account = Account::open(name.to_string(), phone.to_string(), address.to_string());
        account.balance = BigDecimal::from_str(balance).expect("valid decimal");
        account
    }

    fn commit_between(sender: &Account, receiver: &Account, amount: &str) -> TransferCommit {
        let amount = BigDecimal::from_str(amount).expect("valid decimal");
        let reference = Uuid::new_v4();
        TransferCommit {
            debit_balance: BalanceUpdate {
                account_id: sender.id,
                expected_version: sender.version,
                new_balance: &sender.balance - &amount,
            },
            credit_balance: BalanceUpdate {
                account_id: receiver.id,
                expected_version: receiver.version,
                new_balance: &receiver.balance + &amount,
            },
            debit_entry: LedgerEntry::new(
                sender.id,
                receiver.name.clone(),
                amount.clone(),
                Direction::Debit,
                String::new(),
                reference,
            ),
            credit_entry: LedgerEntry::new(
                receiver.id,
                sender.name.clone(),
                amount,
                Direction::Credit,
                String::new(),
                reference,
            ),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_address() {
        let store = InMemoryWalletStore::new();
        let first = account("A", "111", "a@pulse", "1000.00");
        let second = account("B", "222", "a@pulse", "1000.00");

        store.create_account(&first).await.expect("first insert");
        assert!(matches!(
            store.create_account(&second).await,
            Err(StoreError::DuplicateAccount(_))
        ));
    }

    #[tokio::test]
    async fn stale_version_applies_nothing() {
        let store = InMemoryWalletStore::new();
        let sender = account("S", "111", "s@pulse", "100.00");
        let receiver = account("R", "222", "r@pulse", "50.00");
        store.create_account(&sender).await.expect("insert");
        store.create_account(&receiver).await.expect("insert");

        let mut commit = commit_between(&sender, &receiver, "60.00");
        commit.debit_balance.expected_version = sender.version + 1;

        assert!(matches!(
            store.commit_transfer(&commit).await,
            Err(StoreError::Conflict)
        ));

        let unchanged = store.load(sender.id).await.expect("load");
        assert_eq!(unchanged.balance, sender.balance);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn commit_applies_balances_and_entries() {
        let store = InMemoryWalletStore::new();
        let sender = account("S", "111", "s@pulse", "100.00");
        let receiver = account("R", "222", "r@pulse", "50.00");
        store.create_account(&sender).await.expect("insert");
        store.create_account(&receiver).await.expect("insert");

        let commit = commit_between(&sender, &receiver, "60.00");
        store.commit_transfer(&commit).await.expect("commit");

        let sender_after = store.load(sender.id).await.expect("load");
        let receiver_after = store.load(receiver.id).await.expect("load");
        assert_eq!(
            sender_after.balance,
            BigDecimal::from_str("40.00").expect("valid decimal")
        );
        assert_eq!(
            receiver_after.balance,
            BigDecimal::from_str("110.00").expect("valid decimal")
        );
        assert_eq!(sender_after.version, sender.version + 1);
        assert_eq!(store.entry_count(), 2);
    }
}
