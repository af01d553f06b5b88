mod health;
mod orders;
mod robots;
mod templates;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub fn build() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(robots::router())
        .merge(orders::router())
        .merge(templates::router())
}
