use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Account;
use crate::error::AppError;
use crate::middleware::auth::CurrentAccount;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub balance: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            phone: account.phone.clone(),
            address: account.address.clone(),
            balance: account.balance.to_string(),
            created_at: account.created_at,
        }
    }
}

pub async fn open_account(
    State(state): State<AppState>,
    Json(payload): Json<OpenAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_display_name(&payload.name)?;
    validation::validate_phone(&payload.phone)?;
    validation::validate_payment_address(&payload.address)?;

    let account = Account::open(
        validation::sanitize_string(&payload.name),
        validation::sanitize_string(&payload.phone),
        validation::sanitize_string(&payload.address),
    );
    state.store.create_account(&account).await?;

    tracing::info!(account = %account.id, address = %account.address, "account opened");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": account.token,
            "account": AccountView::from(&account),
        })),
    ))
}

pub async fn me(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<AccountView> {
    Json(AccountView::from(&account))
}
