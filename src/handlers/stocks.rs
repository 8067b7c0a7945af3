use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::TradeSide;
use crate::error::AppError;
use crate::middleware::auth::CurrentAccount;
use crate::services::{OrderRequest, TradeError};
use crate::stocks;
use crate::AppState;

const HISTORY_DAYS: u32 = 30;

/// Trade history reads return at most this many rows.
const TRADE_WINDOW: i64 = 50;

#[derive(Serialize)]
pub struct QuoteView {
    pub symbol: String,
    pub company_name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
}

impl From<&stocks::StockQuote> for QuoteView {
    fn from(quote: &stocks::StockQuote) -> Self {
        Self {
            symbol: quote.symbol.to_string(),
            company_name: quote.company_name.to_string(),
            price: quote.price().to_string(),
            change: quote.change().to_string(),
            change_percent: quote.change_percent().to_string(),
        }
    }
}

pub async fn market() -> impl IntoResponse {
    let quotes: Vec<QuoteView> = stocks::MARKET.iter().map(QuoteView::from).collect();
    Json(json!({ "stocks": quotes }))
}

pub async fn history(Path(symbol): Path<String>) -> Result<impl IntoResponse, AppError> {
    let quote = stocks::find(&symbol).ok_or(TradeError::UnknownSymbol)?;
    let points: Vec<serde_json::Value> = stocks::history(quote, HISTORY_DAYS)
        .iter()
        .map(|point| {
            json!({
                "date": point.date,
                "price": point.price.to_string(),
                "volume": point.volume,
            })
        })
        .collect();

    Ok(Json(json!({ "symbol": symbol, "history": points })))
}

pub async fn holdings(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, AppError> {
    let holdings = state.store.load_holdings(account.id).await?;

    let views: Vec<serde_json::Value> = holdings
        .iter()
        .filter_map(|holding| {
            // Delisted symbols have no price to mark against; skip them.
            let quote = stocks::find(&holding.symbol)?;
            let price = quote.price();
            let quantity = BigDecimal::from(holding.quantity);
            let total_value = (&price * &quantity).with_scale(2);
            let total_cost = (&holding.average_price * &quantity).with_scale(2);
            let profit_loss = &total_value - &total_cost;
            let profit_loss_percent = if total_cost == BigDecimal::from(0) {
                BigDecimal::from(0).with_scale(2)
            } else {
                (&profit_loss * BigDecimal::from(100) / &total_cost).with_scale(2)
            };

            Some(json!({
                "symbol": holding.symbol,
                "company_name": holding.company_name,
                "quantity": holding.quantity,
                "average_price": holding.average_price.to_string(),
                "current_price": price.to_string(),
                "total_value": total_value.to_string(),
                "total_cost": total_cost.to_string(),
                "profit_loss": profit_loss.to_string(),
                "profit_loss_percent": profit_loss_percent.to_string(),
            }))
        })
        .collect();

    Ok(Json(json!({ "holdings": views })))
}

pub async fn trades(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, AppError> {
    let trades = state.store.recent_trades(account.id, TRADE_WINDOW).await?;

    let views: Vec<serde_json::Value> = trades
        .iter()
        .map(|trade| {
            json!({
                "id": trade.id,
                "symbol": trade.symbol,
                "company_name": trade.company_name,
                "side": trade.side,
                "quantity": trade.quantity,
                "price": trade.price.to_string(),
                "total_amount": trade.total_amount.to_string(),
                "reference": trade.reference,
                "created_at": trade.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "trades": views })))
}

#[derive(Debug, Deserialize)]
pub struct OrderPayload {
    pub symbol: String,
    pub quantity: i64,
    pub side: TradeSide,
}

pub async fn place_order(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderRequest {
        symbol: payload.symbol,
        quantity: payload.quantity,
        side: payload.side,
    };
    let outcome = state.desk.place_order(account.id, &order).await?;

    state
        .publisher
        .publish_balance(account.id, &outcome.balance);

    Ok(Json(json!({
        "trade": {
            "id": outcome.trade.id,
            "symbol": outcome.trade.symbol,
            "side": outcome.trade.side,
            "quantity": outcome.trade.quantity,
            "price": outcome.trade.price.to_string(),
            "total_amount": outcome.trade.total_amount.to_string(),
            "reference": outcome.trade.reference,
        },
        "balance": outcome.balance.to_string(),
    })))
}
