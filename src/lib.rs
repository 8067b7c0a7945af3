pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod stocks;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::events::EventPublisher;
use crate::ports::WalletStore;
use crate::services::{TradingDesk, TransferEngine};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WalletStore>,
    pub engine: TransferEngine,
    pub desk: TradingDesk,
    pub publisher: EventPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            engine: TransferEngine::new(store.clone()),
            desk: TradingDesk::new(store.clone()),
            publisher: EventPublisher::new(),
            store,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let authed = Router::new()
        .route("/accounts/me", get(handlers::accounts::me))
        .route("/transfers", post(handlers::transfers::send_money))
        .route("/transfers/recent", get(handlers::transfers::recent))
        .route("/stocks/market", get(handlers::stocks::market))
        .route("/stocks/:symbol/history", get(handlers::stocks::history))
        .route("/stocks/holdings", get(handlers::stocks::holdings))
        .route("/stocks/trades", get(handlers::stocks::trades))
        .route("/stocks/orders", post(handlers::stocks::place_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_account,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/accounts", post(handlers::accounts::open_account))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(authed)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
