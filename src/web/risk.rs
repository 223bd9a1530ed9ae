use crate::db::{self, DbUser};
use crate::domain::roles::RoleCode;
use crate::state::SharedState;
use crate::time_utils;
use crate::web::error::AppError;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/students", get(list))
        .route("/students/:id/reset", post(reset))
        .with_state(state)
}

#[derive(Serialize)]
struct AtRiskView {
    student_id: i64,
    full_name: String,
    teacher_id: Option<i64>,
    absences: i64,
    counting_since: Option<NaiveDate>,
}

#[derive(Serialize)]
struct ResetResponse {
    student_id: i64,
    absence_reset_at: NaiveDate,
}

async fn require_preparer(state: &SharedState, user_id: i64) -> Result<DbUser, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Denied)?;
    if !db::has_role(&state.pool, &user, RoleCode::Preparer).await? {
        return Err(AppError::Denied);
    }
    Ok(user)
}

async fn list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AtRiskView>>, AppError> {
    require_preparer(&state, user_id).await?;

    let students = db::at_risk_students(&state.pool).await?;
    Ok(Json(
        students
            .into_iter()
            .map(|s| AtRiskView {
                student_id: s.student_id,
                full_name: s.full_name,
                teacher_id: s.teacher_id,
                absences: s.absences,
                counting_since: s.absence_reset_at,
            })
            .collect(),
    ))
}

/// "Forgive and restart": future risk counting for this student only sees
/// absences strictly after today.
async fn reset(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(student_id): Path<i64>,
) -> Result<Json<ResetResponse>, AppError> {
    let preparer = require_preparer(&state, user_id).await?;

    db::find_student(&state.pool, student_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let today = time_utils::today();
    if !db::set_absence_reset(&state.pool, student_id, today).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        "Preparer {} reset absence baseline for student {}",
        preparer.username,
        student_id
    );

    Ok(Json(ResetResponse {
        student_id,
        absence_reset_at: today,
    }))
}
