//! Transfer request and outcome types.

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::ledger::LedgerEntry;

/// One request to move money. Lives only for the duration of a single
/// `TransferEngine::transfer` call; never persisted.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub receiver_address: String,
    /// Raw caller-supplied amount; parsed and validated by the engine.
    pub amount: String,
    pub note: Option<String>,
}

/// Everything a committed transfer produced: the DEBIT/CREDIT pair and
/// both post-commit balances. Handed to the event publisher for fan-out.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub reference: Uuid,
    pub debit: LedgerEntry,
    pub credit: LedgerEntry,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_balance: BigDecimal,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub receiver_balance: BigDecimal,
}
