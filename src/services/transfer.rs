//! Transfer engine: turns one transfer request into a committed
//! DEBIT/CREDIT ledger pair and two updated balances, or fails with no
//! partial effect.
//!
//! Concurrency control is optimistic: balances are read together with
//! their version, validation runs against that snapshot, and the store
//! commit is version-guarded. A conflicting commit re-runs the whole
//! read-validate-commit section, up to [`MAX_COMMIT_ATTEMPTS`] times.
//! Validation failures are terminal and never retried.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Direction, LedgerEntry, TransferOutcome, TransferRequest};
use crate::ports::{BalanceUpdate, StoreError, TransferCommit, WalletStore};
use crate::validation;

pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("amount must be a positive decimal with at most two fraction digits")]
    InvalidAmount,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("receiver not found")]
    ReceiverNotFound,

    #[error("cannot send money to yourself")]
    SelfTransfer,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        TransferError::StoreUnavailable(err.to_string())
    }
}

#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn WalletStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    pub async fn transfer(
        &self,
        sender_id: Uuid,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        let amount = validation::parse_amount(&request.amount)
            .map_err(|_| TransferError::InvalidAmount)?;
        let note = request
            .note
            .as_deref()
            .map(validation::sanitize_string)
            .unwrap_or_default();
        let receiver_address = validation::sanitize_string(&request.receiver_address);

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let sender = self.store.load(sender_id).await?;

            if sender.balance < amount {
                return Err(TransferError::InsufficientBalance);
            }

            let receiver = self
                .store
                .find_by_address(&receiver_address)
                .await?
                .ok_or(TransferError::ReceiverNotFound)?;

            if receiver.id == sender.id {
                return Err(TransferError::SelfTransfer);
            }

            let reference = Uuid::new_v4();
            let sender_balance = &sender.balance - &amount;
            let receiver_balance = &receiver.balance + &amount;

            let commit = TransferCommit {
                debit_balance: BalanceUpdate {
                    account_id: sender.id,
                    expected_version: sender.version,
                    new_balance: sender_balance.clone(),
                },
                credit_balance: BalanceUpdate {
                    account_id: receiver.id,
                    expected_version: receiver.version,
                    new_balance: receiver_balance.clone(),
                },
                debit_entry: LedgerEntry::new(
                    sender.id,
                    receiver.name.clone(),
                    amount.clone(),
                    Direction::Debit,
                    note.clone(),
                    reference,
                ),
                credit_entry: LedgerEntry::new(
                    receiver.id,
                    sender.name.clone(),
                    amount.clone(),
                    Direction::Credit,
                    note.clone(),
                    reference,
                ),
            };

            match self.store.commit_transfer(&commit).await {
                Ok(()) => {
                    tracing::info!(
                        reference = %reference,
                        sender = %sender.id,
                        receiver = %receiver.id,
                        amount = %amount,
                        "transfer committed"
                    );
                    return Ok(TransferOutcome {
                        reference,
                        debit: commit.debit_entry,
                        credit: commit.credit_entry,
                        sender_id: sender.id,
                        sender_name: sender.name,
                        sender_balance,
                        receiver_id: receiver.id,
                        receiver_name: receiver.name,
                        receiver_balance,
                    });
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(attempt, sender = %sender.id, "transfer commit conflicted");
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(TransferError::StoreUnavailable(
            "transfer commit kept conflicting".to_string(),
        ))
    }
}
