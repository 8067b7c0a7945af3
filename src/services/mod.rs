pub mod trading;
pub mod transfer;

pub use trading::{OrderRequest, TradeError, TradeOutcome, TradingDesk};
pub use transfer::{TransferEngine, TransferError};
