//! Ledger entry domain entity.
//! One immutable record of value moving into or out of one account. A
//! transfer always produces a DEBIT/CREDIT pair linked by `reference`.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "DEBIT")]
    Debit,
    #[serde(rename = "CREDIT")]
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "DEBIT",
            Direction::Credit => "CREDIT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    /// The account whose statement this entry belongs to.
    pub account_id: Uuid,
    pub counterparty: String,
    pub amount: BigDecimal,
    pub direction: Direction,
    pub note: String,
    /// Correlation id shared by the paired entry on the other account.
    pub reference: Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        account_id: Uuid,
        counterparty: String,
        amount: BigDecimal,
        direction: Direction,
        note: String,
        reference: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            counterparty,
            amount,
            direction,
            note,
            reference,
            created_at: Utc::now(),
        }
    }
}

/// Wire representation of a ledger entry, shared by the REST responses
/// and the WebSocket events. Amounts travel as strings to keep them exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryView {
    pub id: Uuid,
    pub amount: String,
    pub direction: Direction,
    pub counterparty: String,
    pub note: String,
    pub reference: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for LedgerEntryView {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            amount: entry.amount.to_string(),
            direction: entry.direction,
            counterparty: entry.counterparty.clone(),
            note: entry.note.clone(),
            reference: entry.reference,
            created_at: entry.created_at,
        }
    }
}
