//! Trading desk: the stock-order analogue of the transfer engine. Same
//! discipline, lower stakes — one balance write, one holding upsert and
//! one trade row, committed atomically under the account's version guard.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Holding, StockTrade, TradeSide};
use crate::ports::{BalanceUpdate, StoreError, TradeCommit, WalletStore};
use crate::stocks;

use super::transfer::MAX_COMMIT_ATTEMPTS;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("quantity must be a positive whole number")]
    InvalidQuantity,

    #[error("unknown stock symbol")]
    UnknownSymbol,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient holdings")]
    InsufficientHoldings,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for TradeError {
    fn from(err: StoreError) -> Self {
        TradeError::StoreUnavailable(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub quantity: i64,
    pub side: TradeSide,
}

#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub trade: StockTrade,
    pub balance: BigDecimal,
    pub holding: Option<Holding>,
}

#[derive(Clone)]
pub struct TradingDesk {
    store: Arc<dyn WalletStore>,
}

impl TradingDesk {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    pub async fn place_order(
        &self,
        account_id: Uuid,
        order: &OrderRequest,
    ) -> Result<TradeOutcome, TradeError> {
        if order.quantity <= 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let quote = stocks::find(&order.symbol).ok_or(TradeError::UnknownSymbol)?;
        let price = quote.price();
        let total = (&price * BigDecimal::from(order.quantity)).with_scale(2);

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let account = self.store.load(account_id).await?;
            let holding = self.store.load_holding(account_id, quote.symbol).await?;

            let (new_balance, new_holding) = match order.side {
                TradeSide::Buy => {
                    if account.balance < total {
                        return Err(TradeError::InsufficientBalance);
                    }
                    (
                        &account.balance - &total,
                        Some(buy_into(account_id, holding, quote, order.quantity, &price, &total)),
                    )
                }
                TradeSide::Sell => {
                    let held = holding.ok_or(TradeError::InsufficientHoldings)?;
                    if held.quantity < order.quantity {
                        return Err(TradeError::InsufficientHoldings);
                    }
                    let remaining = held.quantity - order.quantity;
                    let new_holding = (remaining > 0).then(|| Holding {
                        quantity: remaining,
                        ..held
                    });
                    (&account.balance + &total, new_holding)
                }
            };

            let trade = StockTrade {
                id: Uuid::new_v4(),
                account_id,
                symbol: quote.symbol.to_string(),
                company_name: quote.company_name.to_string(),
                side: order.side,
                quantity: order.quantity,
                price: price.clone(),
                total_amount: total.clone(),
                reference: Uuid::new_v4(),
                created_at: chrono::Utc::now(),
            };

            let commit = TradeCommit {
                balance: BalanceUpdate {
                    account_id,
                    expected_version: account.version,
                    new_balance: new_balance.clone(),
                },
                holding: new_holding.clone(),
                trade: trade.clone(),
            };

            match self.store.commit_trade(&commit).await {
                Ok(()) => {
                    tracing::info!(
                        reference = %trade.reference,
                        account = %account_id,
                        symbol = %trade.symbol,
                        side = trade.side.as_str(),
                        quantity = trade.quantity,
                        "trade committed"
                    );
                    return Ok(TradeOutcome {
                        trade,
                        balance: new_balance,
                        holding: new_holding,
                    });
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(attempt, account = %account_id, "trade commit conflicted");
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(TradeError::StoreUnavailable(
            "trade commit kept conflicting".to_string(),
        ))
    }
}

fn buy_into(
    account_id: Uuid,
    holding: Option<Holding>,
    quote: &stocks::StockQuote,
    quantity: i64,
    price: &BigDecimal,
    total: &BigDecimal,
) -> Holding {
    match holding {
        Some(held) => {
            let total_cost = &held.average_price * BigDecimal::from(held.quantity) + total;
            let new_quantity = held.quantity + quantity;
            Holding {
                quantity: new_quantity,
                average_price: (total_cost / BigDecimal::from(new_quantity)).with_scale(4),
                ..held
            }
        }
        None => Holding {
            account_id,
            symbol: quote.symbol.to_string(),
            company_name: quote.company_name.to_string(),
            quantity,
            average_price: price.with_scale(4),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryWalletStore;
    use crate::domain::Account;
    use std::str::FromStr;

    fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).expect("valid decimal")
    }

    async fn funded_account(store: &InMemoryWalletStore, balance: &str) -> Account {
        let mut account = Account::open(
            "Sia".to_string(),
            "111".to_string(),
            "sia@pulse".to_string(),
        );
        account.balance = decimal(balance);
        store.create_account(&account).await.expect("seed account");
        account
    }

    fn order(symbol: &str, quantity: i64, side: TradeSide) -> OrderRequest {
        OrderRequest {
            symbol: symbol.to_string(),
            quantity,
            side,
        }
    }

    #[tokio::test]
    async fn buy_debits_balance_and_opens_holding() {
        let store = Arc::new(InMemoryWalletStore::new());
        let account = funded_account(&store, "2000.00").await;
        let desk = TradingDesk::new(store.clone());

        // SBIN trades at 780.25.
        let outcome = desk
            .place_order(account.id, &order("SBIN", 2, TradeSide::Buy))
            .await
            .expect("buy succeeds");

        assert_eq!(outcome.trade.total_amount, decimal("1560.50"));
        assert_eq!(outcome.balance, decimal("439.50"));
        let holding = outcome.holding.expect("holding opened");
        assert_eq!(holding.quantity, 2);
        assert_eq!(holding.average_price, decimal("780.2500"));
        assert_eq!(
            store.load(account.id).await.expect("load").balance,
            decimal("439.50")
        );
    }

    #[tokio::test]
    async fn repeat_buy_averages_the_price_basis() {
        let store = Arc::new(InMemoryWalletStore::new());
        let account = funded_account(&store, "100000.00").await;
        let desk = TradingDesk::new(store.clone());

        desk.place_order(account.id, &order("SBIN", 2, TradeSide::Buy))
            .await
            .expect("first buy");

        // Seed a cheaper basis directly to exercise the weighted average.
        let held = store
            .load_holding(account.id, "SBIN")
            .await
            .expect("load")
            .expect("holding");
        let cheaper = Holding {
            average_price: decimal("700.0000"),
            ..held
        };
        let refreshed = store.load(account.id).await.expect("load");
        store
            .commit_trade(&TradeCommit {
                balance: BalanceUpdate {
                    account_id: account.id,
                    expected_version: refreshed.version,
                    new_balance: refreshed.balance.clone(),
                },
                holding: Some(cheaper),
                trade: StockTrade {
                    id: Uuid::new_v4(),
                    account_id: account.id,
                    symbol: "SBIN".to_string(),
                    company_name: "State Bank of India".to_string(),
                    side: TradeSide::Buy,
                    quantity: 0,
                    price: decimal("700.00"),
                    total_amount: decimal("0.00"),
                    reference: Uuid::new_v4(),
                    created_at: chrono::Utc::now(),
                },
            })
            .await
            .expect("seed basis");

        let outcome = desk
            .place_order(account.id, &order("SBIN", 2, TradeSide::Buy))
            .await
            .expect("second buy");

        // (700 * 2 + 780.25 * 2) / 4 = 740.125
        let holding = outcome.holding.expect("holding");
        assert_eq!(holding.quantity, 4);
        assert_eq!(holding.average_price, decimal("740.1250"));
    }

    #[tokio::test]
    async fn sell_credits_balance_and_closes_position() {
        let store = Arc::new(InMemoryWalletStore::new());
        let account = funded_account(&store, "2000.00").await;
        let desk = TradingDesk::new(store.clone());

        desk.place_order(account.id, &order("SBIN", 2, TradeSide::Buy))
            .await
            .expect("buy");
        let outcome = desk
            .place_order(account.id, &order("SBIN", 2, TradeSide::Sell))
            .await
            .expect("sell succeeds");

        assert_eq!(outcome.balance, decimal("2000.00"));
        assert!(outcome.holding.is_none());
        assert!(store
            .load_holding(account.id, "SBIN")
            .await
            .expect("load")
            .is_none());
    }

    #[tokio::test]
    async fn trade_history_reads_newest_first() {
        let store = Arc::new(InMemoryWalletStore::new());
        let account = funded_account(&store, "2000.00").await;
        let desk = TradingDesk::new(store.clone());

        desk.place_order(account.id, &order("SBIN", 2, TradeSide::Buy))
            .await
            .expect("buy");
        desk.place_order(account.id, &order("SBIN", 1, TradeSide::Sell))
            .await
            .expect("sell");

        let trades = store.recent_trades(account.id, 50).await.expect("read");
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[1].side, TradeSide::Buy);
        assert_eq!(trades[1].quantity, 2);

        let capped = store.recent_trades(account.id, 1).await.expect("read");
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].side, TradeSide::Sell);
    }

    #[tokio::test]
    async fn rejects_bad_orders_without_mutation() {
        let store = Arc::new(InMemoryWalletStore::new());
        let account = funded_account(&store, "100.00").await;
        let desk = TradingDesk::new(store.clone());

        assert!(matches!(
            desk.place_order(account.id, &order("SBIN", 0, TradeSide::Buy))
                .await,
            Err(TradeError::InvalidQuantity)
        ));
        assert!(matches!(
            desk.place_order(account.id, &order("UNLISTED", 1, TradeSide::Buy))
                .await,
            Err(TradeError::UnknownSymbol)
        ));
        assert!(matches!(
            desk.place_order(account.id, &order("SBIN", 1, TradeSide::Buy))
                .await,
            Err(TradeError::InsufficientBalance)
        ));
        assert!(matches!(
            desk.place_order(account.id, &order("SBIN", 1, TradeSide::Sell))
                .await,
            Err(TradeError::InsufficientHoldings)
        ));

        assert_eq!(
            store.load(account.id).await.expect("load").balance,
            decimal("100.00")
        );
    }
}
