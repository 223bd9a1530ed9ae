pub mod approval;
pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod exams;
pub mod register;
pub mod risk;
pub mod session;

use crate::state::SharedState;
use axum::Router;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/register", register::router(state.clone()))
        .nest("/api/approval", approval::router(state.clone()))
        .nest("/api/attendance", attendance::router(state.clone()))
        .nest("/api/exams", exams::router(state.clone()))
        .nest("/api/risk", risk::router(state.clone()))
        .nest("/api/dashboard", dashboard::router(state))
}
