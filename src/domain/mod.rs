pub mod account;
pub mod ledger;
pub mod trade;
pub mod transfer;

pub use account::Account;
pub use ledger::{Direction, LedgerEntry, LedgerEntryView};
pub use trade::{Holding, StockTrade, TradeSide};
pub use transfer::{TransferOutcome, TransferRequest};
