use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub(crate) mod password;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_admin_routes())
}
