use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{LedgerEntryView, TransferRequest};
use crate::error::AppError;
use crate::middleware::auth::CurrentAccount;
use crate::validation;
use crate::AppState;

/// Statement reads return at most this many rows.
pub const RECENT_WINDOW: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SendMoneyRequest {
    pub receiver_address: String,
    pub amount: String,
    pub note: Option<String>,
}

pub async fn send_money(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<SendMoneyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(note) = &payload.note {
        validation::validate_note(note)?;
    }

    let request = TransferRequest {
        receiver_address: payload.receiver_address,
        amount: payload.amount,
        note: payload.note,
    };
    let outcome = state.engine.transfer(account.id, &request).await?;

    // Fan-out is best-effort and must not affect the response; the
    // transfer is already committed.
    state.publisher.publish_transfer(&outcome);

    Ok(Json(json!({
        "reference": outcome.reference,
        "amount": outcome.debit.amount.to_string(),
        "receiver_name": outcome.receiver_name,
        "balance": outcome.sender_balance.to_string(),
    })))
}

pub async fn recent(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.store.recent_entries(account.id, RECENT_WINDOW).await?;
    let views: Vec<LedgerEntryView> = entries.iter().map(LedgerEntryView::from).collect();
    Ok(Json(json!({ "entries": views })))
}
