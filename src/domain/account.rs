//! Account domain entity.
//! The balance is only ever mutated through the wallet store's atomic
//! commit operations; `version` is the optimistic guard those commits use.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opening balance credited to every new account.
pub const OPENING_BALANCE: i64 = 1000;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    /// Unique human-facing payment address used to target transfers.
    pub address: String,
    pub balance: BigDecimal,
    /// Bumped by every committed balance write.
    pub version: i64,
    /// Opaque bearer token handed out when the account is opened.
    pub token: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn open(name: String, phone: String, address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            address,
            balance: BigDecimal::from(OPENING_BALANCE).with_scale(2),
            version: 0,
            token: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}
