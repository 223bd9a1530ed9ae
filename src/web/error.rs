use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

/// Central error policy for the web layer. Authorization failures bounce to
/// the public landing page with no state change; everything else maps to a
/// plain status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not allowed")]
    Denied,
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("bad request")]
    BadRequest,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Denied => Redirect::to("/").into_response(),
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Conflict => StatusCode::CONFLICT.into_response(),
            AppError::BadRequest => StatusCode::BAD_REQUEST.into_response(),
            AppError::Internal(err) => {
                tracing::error!("request failed: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
