pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::balance::BalanceConfig;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    balance: Arc<BalanceConfig>,
}

impl AppState {
    pub fn new(db: DBService, balance: BalanceConfig) -> Self {
        Self {
            db,
            balance: Arc::new(balance),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::router())
        .layer(cors)
        .with_state(state)
}
