mod dto;
pub mod filter;
pub mod handlers;
pub mod services;
pub mod session;
pub mod sort;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
