use crate::db::{self, DbUser, NominationRow, NominationWithStudent};
use crate::domain::exam;
use crate::domain::parts;
use crate::domain::roles::RoleCode;
use crate::state::SharedState;
use crate::web::error::AppError;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/nominations", post(create).get(history))
        .route("/nominations/:id", delete(delete_nomination))
        .route("/nominations/:id/internal", post(record_internal))
        .route("/nominations/:id/association", post(record_association))
        .route("/internal", get(internal_list))
        .route("/association", get(association_list))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreatePayload {
    student_id: i64,
    teacher_grade: f64,
}

#[derive(Deserialize)]
struct GradePayload {
    grade: f64,
}

#[derive(Deserialize)]
struct HistoryParams {
    student_id: i64,
}

#[derive(Serialize)]
struct NominationView {
    id: i64,
    student_id: i64,
    student_name: Option<String>,
    last_tested_part: String,
    part_label: String,
    next_part: &'static str,
    teacher_grade: Option<f64>,
    internal_grade: Option<f64>,
    association_grade: Option<f64>,
    nomination_date: NaiveDate,
    internal_passed: bool,
    association_tested: bool,
}

fn view_from_row(row: NominationRow) -> NominationView {
    NominationView {
        id: row.id,
        student_id: row.student_id,
        student_name: None,
        part_label: parts::part_label(&row.last_tested_part),
        next_part: parts::next_part(&row.last_tested_part),
        last_tested_part: row.last_tested_part,
        teacher_grade: row.teacher_grade,
        internal_grade: row.internal_grade,
        association_grade: row.association_grade,
        nomination_date: row.nomination_date,
        internal_passed: row.internal_passed,
        association_tested: row.association_tested,
    }
}

fn view_from_joined(row: NominationWithStudent) -> NominationView {
    NominationView {
        id: row.id,
        student_id: row.student_id,
        student_name: Some(row.student_name),
        part_label: parts::part_label(&row.last_tested_part),
        next_part: parts::next_part(&row.last_tested_part),
        last_tested_part: row.last_tested_part,
        teacher_grade: row.teacher_grade,
        internal_grade: row.internal_grade,
        association_grade: row.association_grade,
        nomination_date: row.nomination_date,
        internal_passed: row.internal_passed,
        association_tested: row.association_tested,
    }
}

fn valid_grade(grade: f64) -> bool {
    grade.is_finite() && (0.0..=100.0).contains(&grade)
}

async fn require_examiner(state: &SharedState, user_id: i64) -> Result<DbUser, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Denied)?;
    if !db::has_role(&state.pool, &user, RoleCode::Examiner).await? {
        return Err(AppError::Denied);
    }
    Ok(user)
}

/// A teacher nominates one of their own active students. The student's
/// current milestone is snapshotted onto the nomination and not re-read
/// afterwards.
async fn create(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreatePayload>,
) -> Result<(StatusCode, Json<NominationView>), AppError> {
    if !valid_grade(payload.teacher_grade) {
        return Err(AppError::BadRequest);
    }

    let student = db::find_student(&state.pool, payload.student_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if student.teacher_id != Some(user_id) {
        return Err(AppError::Denied);
    }
    if student.status != "منتظم" {
        return Err(AppError::Conflict);
    }

    let nomination = db::insert_nomination(
        &state.pool,
        student.id,
        user_id,
        &student.last_tested_part,
        payload.teacher_grade,
    )
    .await?;

    tracing::info!(
        "Teacher {} nominated student {} at part {}",
        user_id,
        student.id,
        nomination.last_tested_part
    );

    Ok((StatusCode::CREATED, Json(view_from_row(nomination))))
}

async fn internal_list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<NominationView>>, AppError> {
    require_examiner(&state, user_id).await?;
    let rows = db::internal_worklist(&state.pool).await?;
    Ok(Json(rows.into_iter().map(view_from_joined).collect()))
}

async fn record_internal(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(nomination_id): Path<i64>,
    Json(payload): Json<GradePayload>,
) -> Result<Json<NominationView>, AppError> {
    let examiner = require_examiner(&state, user_id).await?;
    if !valid_grade(payload.grade) {
        return Err(AppError::BadRequest);
    }

    let nomination = db::find_nomination(&state.pool, nomination_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let passed = exam::internal_passed(nomination.teacher_grade, Some(payload.grade));
    db::record_internal_grade(&state.pool, nomination.id, payload.grade, passed).await?;

    tracing::info!(
        "Examiner {} graded internal exam for nomination {}: {} ({})",
        examiner.username,
        nomination.id,
        payload.grade,
        if passed { "passed" } else { "not passed" }
    );

    let updated = db::find_nomination(&state.pool, nomination_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(view_from_row(updated)))
}

async fn association_list(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<NominationView>>, AppError> {
    require_examiner(&state, user_id).await?;
    let rows = db::association_worklist(&state.pool).await?;
    Ok(Json(rows.into_iter().map(view_from_joined).collect()))
}

async fn record_association(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(nomination_id): Path<i64>,
    Json(payload): Json<GradePayload>,
) -> Result<Json<NominationView>, AppError> {
    let examiner = require_examiner(&state, user_id).await?;
    if !valid_grade(payload.grade) {
        return Err(AppError::BadRequest);
    }

    let nomination = db::find_nomination(&state.pool, nomination_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !exam::association_eligible(nomination.internal_passed, nomination.association_tested) {
        return Err(AppError::Conflict);
    }

    db::record_association_grade(&state.pool, nomination.id, payload.grade).await?;

    tracing::info!(
        "Examiner {} recorded association grade {} for nomination {}",
        examiner.username,
        payload.grade,
        nomination.id
    );

    let updated = db::find_nomination(&state.pool, nomination_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(view_from_row(updated)))
}

/// Nomination history for one student: visible to the student's assigned
/// teacher and to examiners.
async fn history(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<NominationView>>, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Denied)?;

    let student = db::find_student(&state.pool, params.student_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_own_teacher = student.teacher_id == Some(user.id);
    if !is_own_teacher && !db::has_role(&state.pool, &user, RoleCode::Examiner).await? {
        return Err(AppError::Denied);
    }

    let rows = db::nominations_for_student(&state.pool, student.id).await?;
    Ok(Json(rows.into_iter().map(view_from_row).collect()))
}

/// Only the nominating teacher may withdraw a nomination, at any stage.
async fn delete_nomination(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(nomination_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let nomination = db::find_nomination(&state.pool, nomination_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if nomination.teacher_id != user_id {
        return Err(AppError::Denied);
    }

    if !db::delete_nomination(&state.pool, nomination_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("Teacher {} withdrew nomination {}", user_id, nomination_id);
    Ok(StatusCode::NO_CONTENT)
}
