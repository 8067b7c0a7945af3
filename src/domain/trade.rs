//! Stock trading domain entities. Trading is the second consumer of the
//! wallet store's atomic balance commit, alongside money transfers.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// An account's position in one symbol.
#[derive(Debug, Clone)]
pub struct Holding {
    pub account_id: Uuid,
    pub symbol: String,
    pub company_name: String,
    pub quantity: i64,
    pub average_price: BigDecimal,
}

/// Immutable record of one executed order.
#[derive(Debug, Clone)]
pub struct StockTrade {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub company_name: String,
    pub side: TradeSide,
    pub quantity: i64,
    pub price: BigDecimal,
    pub total_amount: BigDecimal,
    pub reference: Uuid,
    pub created_at: DateTime<Utc>,
}
