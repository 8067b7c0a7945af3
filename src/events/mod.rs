//! Event fan-out. Each account gets a private broadcast channel; a
//! committed transfer pushes ledger, balance and payment-received events
//! to whichever sessions are subscribed. Delivery is best-effort and
//! at-most-once — the ledger is the system of record, not this channel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bigdecimal::BigDecimal;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{LedgerEntryView, TransferOutcome};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalletEvent {
    /// A new row appeared on the subscriber's statement.
    LedgerEntry { entry: LedgerEntryView },
    /// The subscriber's spendable balance changed.
    BalanceUpdate { balance: String },
    /// Receiver-only toast notice; the consumer auto-dismisses it.
    PaymentReceived {
        from: String,
        amount: String,
        reference: Uuid,
    },
}

#[derive(Clone, Default)]
pub struct EventPublisher {
    channels: Arc<RwLock<HashMap<Uuid, broadcast::Sender<WalletEvent>>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a session to one account's private channel.
    pub fn subscribe(&self, account_id: Uuid) -> broadcast::Receiver<WalletEvent> {
        if let Ok(channels) = self.channels.read() {
            if let Some(sender) = channels.get(&account_id) {
                return sender.subscribe();
            }
        }

        match self.channels.write() {
            Ok(mut channels) => channels
                .entry(account_id)
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe(),
            // Lock poisoning leaves the session with a channel nobody
            // publishes to; events are best-effort anyway.
            Err(_) => broadcast::channel(CHANNEL_CAPACITY).0.subscribe(),
        }
    }

    /// Fans out a committed transfer to both parties. Failures are logged
    /// and swallowed; money has already moved.
    pub fn publish_transfer(&self, outcome: &TransferOutcome) {
        self.send(
            outcome.sender_id,
            WalletEvent::LedgerEntry {
                entry: LedgerEntryView::from(&outcome.debit),
            },
        );
        self.send(
            outcome.sender_id,
            WalletEvent::BalanceUpdate {
                balance: outcome.sender_balance.to_string(),
            },
        );

        self.send(
            outcome.receiver_id,
            WalletEvent::LedgerEntry {
                entry: LedgerEntryView::from(&outcome.credit),
            },
        );
        self.send(
            outcome.receiver_id,
            WalletEvent::BalanceUpdate {
                balance: outcome.receiver_balance.to_string(),
            },
        );
        self.send(
            outcome.receiver_id,
            WalletEvent::PaymentReceived {
                from: outcome.sender_name.clone(),
                amount: outcome.credit.amount.to_string(),
                reference: outcome.reference,
            },
        );
    }

    /// Balance-only notification, used by the trading desk.
    pub fn publish_balance(&self, account_id: Uuid, balance: &BigDecimal) {
        self.send(
            account_id,
            WalletEvent::BalanceUpdate {
                balance: balance.to_string(),
            },
        );
    }

    fn send(&self, account_id: Uuid, event: WalletEvent) {
        let undelivered = {
            let channels = match self.channels.read() {
                Ok(channels) => channels,
                Err(_) => {
                    tracing::error!("event channel registry poisoned, dropping event");
                    return;
                }
            };

            match channels.get(&account_id) {
                // Err means no live subscriber; the event is simply dropped.
                Some(sender) => sender.send(event).is_err(),
                None => false,
            }
        };

        if undelivered {
            tracing::debug!(account = %account_id, "no live session, event dropped");
            self.prune(account_id);
        }
    }

    /// Removes an account's channel once its last subscriber is gone, so
    /// the registry does not keep an entry for every account that ever
    /// connected.
    fn prune(&self, account_id: Uuid) {
        if let Ok(mut channels) = self.channels.write() {
            let abandoned = channels
                .get(&account_id)
                .map_or(false, |sender| sender.receiver_count() == 0);
            if abandoned {
                channels.remove(&account_id);
            }
        }
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        self.channels
            .read()
            .map(|channels| channels.len())
            .unwrap_or(0)
    }
}
