pub mod nodes;
pub mod profile;
pub mod progression;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(progression::router())
        .merge(profile::router())
        .merge(nodes::router())
}
