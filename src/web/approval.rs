use crate::db::{self, DbUser, StageSupervisorRow, StudentRow};
use crate::domain::roles::RoleCode;
use crate::domain::stage::EducationalStage;
use crate::state::SharedState;
use crate::web::error::AppError;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/approve", post(approve))
        .route("/students/:id", delete(delete_pending))
        .with_state(state)
}

/// What the caller is allowed to approve: everything, or one stage.
enum ApprovalScope {
    Global,
    Stage(StageSupervisorRow),
}

impl ApprovalScope {
    fn stage(&self) -> Option<&str> {
        match self {
            ApprovalScope::Global => None,
            ApprovalScope::Stage(profile) => profile.stage.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct PendingStudent {
    id: i64,
    full_name: String,
    grade: String,
    educational_stage: String,
    last_tested_part: String,
    parent_phone: String,
    neighborhood: Option<String>,
}

#[derive(Deserialize)]
struct ApprovePayload {
    student_id: i64,
    teacher_id: Option<i64>,
}

#[derive(Serialize)]
struct ApproveResponse {
    student_id: i64,
    status: String,
    teacher_id: Option<i64>,
}

async fn require_approver(
    state: &SharedState,
    user_id: i64,
) -> Result<(DbUser, ApprovalScope), AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Denied)?;

    if user.is_superuser
        || db::has_role(&state.pool, &user, RoleCode::Supervisor).await?
        || db::has_role(&state.pool, &user, RoleCode::Manager).await?
    {
        return Ok((user, ApprovalScope::Global));
    }

    if let Some(profile) = db::find_stage_supervisor(&state.pool, user.id).await? {
        // profiles without a recognized stage cannot approve anything
        let stage_known = profile
            .stage
            .as_deref()
            .and_then(EducationalStage::parse)
            .is_some();
        if profile.can_approve_students && stage_known {
            return Ok((user, ApprovalScope::Stage(profile)));
        }
    }

    Err(AppError::Denied)
}

fn pending_view(student: StudentRow) -> PendingStudent {
    PendingStudent {
        id: student.id,
        full_name: student.full_name,
        grade: student.grade,
        educational_stage: student.educational_stage,
        last_tested_part: student.last_tested_part,
        parent_phone: student.parent_phone,
        neighborhood: student.neighborhood,
    }
}

async fn list_pending(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<PendingStudent>>, AppError> {
    let (_user, scope) = require_approver(&state, user_id).await?;

    let students = db::pending_students(&state.pool, scope.stage()).await?;
    Ok(Json(students.into_iter().map(pending_view).collect()))
}

async fn approve(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<ApprovePayload>,
) -> Result<Json<ApproveResponse>, AppError> {
    let (user, scope) = require_approver(&state, user_id).await?;

    let student = db::find_student(&state.pool, payload.student_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if student.status != "منتظر" {
        return Err(AppError::Conflict);
    }

    if let ApprovalScope::Stage(profile) = &scope {
        if profile.stage.as_deref() != Some(student.educational_stage.as_str()) {
            return Err(AppError::Denied);
        }
        if payload.teacher_id.is_some() && !profile.can_assign_teachers {
            return Err(AppError::Denied);
        }
    }

    if let Some(teacher_id) = payload.teacher_id {
        db::find_user_by_id(&state.pool, teacher_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or(AppError::NotFound)?;
    }

    if !db::approve_student(&state.pool, student.id, payload.teacher_id).await? {
        // approved concurrently between the read and the write
        return Err(AppError::Conflict);
    }

    tracing::info!(
        "Student {} approved by {} ({})",
        student.id,
        user.username,
        match scope {
            ApprovalScope::Global => "global".to_string(),
            ApprovalScope::Stage(profile) => profile.stage.unwrap_or_default(),
        }
    );

    Ok(Json(ApproveResponse {
        student_id: student.id,
        status: "منتظم".to_string(),
        teacher_id: payload.teacher_id.or(student.teacher_id),
    }))
}

async fn delete_pending(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Path(student_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let (user, scope) = require_approver(&state, user_id).await?;

    let student = db::find_student(&state.pool, student_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if student.status != "منتظر" {
        return Err(AppError::Conflict);
    }

    if let ApprovalScope::Stage(profile) = &scope {
        if profile.stage.as_deref() != Some(student.educational_stage.as_str()) {
            return Err(AppError::Denied);
        }
    }

    if !db::delete_pending_student(&state.pool, student_id).await? {
        return Err(AppError::Conflict);
    }

    tracing::info!("Pending student {} deleted by {}", student_id, user.username);
    Ok(StatusCode::NO_CONTENT)
}
