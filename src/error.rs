use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::StoreError;
use crate::services::{TradeError, TransferError};
use crate::validation::ValidationError;

/// API-level error. Every variant maps to a stable machine-readable
/// `code` plus a human message; the body is relayed to clients verbatim.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::DuplicateAccount(address) => AppError::AccountExists(address),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Transfer(TransferError::InvalidAmount) => "INVALID_AMOUNT",
            AppError::Transfer(TransferError::InsufficientBalance) => "INSUFFICIENT_BALANCE",
            AppError::Transfer(TransferError::ReceiverNotFound) => "RECEIVER_NOT_FOUND",
            AppError::Transfer(TransferError::SelfTransfer) => "SELF_TRANSFER",
            AppError::Transfer(TransferError::StoreUnavailable(_)) => "STORE_UNAVAILABLE",
            AppError::Trade(TradeError::InvalidQuantity) => "INVALID_QUANTITY",
            AppError::Trade(TradeError::UnknownSymbol) => "UNKNOWN_SYMBOL",
            AppError::Trade(TradeError::InsufficientBalance) => "INSUFFICIENT_BALANCE",
            AppError::Trade(TradeError::InsufficientHoldings) => "INSUFFICIENT_HOLDINGS",
            AppError::Trade(TradeError::StoreUnavailable(_)) => "STORE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::AccountExists(_) => "ACCOUNT_EXISTS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Transfer(TransferError::ReceiverNotFound) => StatusCode::NOT_FOUND,
            AppError::Transfer(TransferError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Transfer(_) => StatusCode::BAD_REQUEST,
            AppError::Trade(TradeError::UnknownSymbol) => StatusCode::NOT_FOUND,
            AppError::Trade(TradeError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Trade(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AccountExists(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        }
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_errors_map_to_stable_codes() {
        let cases = [
            (
                AppError::from(TransferError::InvalidAmount),
                "INVALID_AMOUNT",
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(TransferError::InsufficientBalance),
                "INSUFFICIENT_BALANCE",
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(TransferError::ReceiverNotFound),
                "RECEIVER_NOT_FOUND",
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(TransferError::SelfTransfer),
                "SELF_TRANSFER",
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(TransferError::StoreUnavailable("down".to_string())),
                "STORE_UNAVAILABLE",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status_code(), status);
        }
    }

    #[test]
    fn trade_errors_map_to_stable_codes() {
        assert_eq!(
            AppError::from(TradeError::InsufficientHoldings).code(),
            "INSUFFICIENT_HOLDINGS"
        );
        assert_eq!(
            AppError::from(TradeError::UnknownSymbol).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn error_body_carries_code_and_message() {
        let response = AppError::from(TransferError::InsufficientBalance).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = hyper_body_to_value(response).await;
        assert_eq!(body["code"], "INSUFFICIENT_BALANCE");
        assert_eq!(body["message"], "insufficient balance");
    }

    async fn hyper_body_to_value(response: Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }
}
