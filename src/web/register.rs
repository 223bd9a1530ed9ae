use crate::db::{self, NewStudent};
use crate::domain::{parts, stage};
use crate::state::SharedState;
use crate::web::error::AppError;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(register))
        .route("/grades", get(grades))
        .with_state(state)
}

/// Public registration form payload; no authentication required.
#[derive(Deserialize)]
struct RegisterPayload {
    full_name: String,
    student_phone: Option<String>,
    parent_phone: Option<String>,
    identity_number: Option<String>,
    parent_identity: Option<String>,
    grade: String,
    birth_date: Option<String>,
    last_tested_part: Option<String>,
    previous_center: Option<String>,
    neighborhood: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    student_id: i64,
    status: String,
    educational_stage: String,
}

#[derive(Serialize)]
struct GradeChoice {
    code: &'static str,
    label: &'static str,
}

async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::BadRequest);
    }

    let grade = payload.grade.trim().to_string();
    if !stage::is_valid_grade(&grade) {
        return Err(AppError::BadRequest);
    }

    // Legacy registrations carried prose here; anything unknown becomes
    // untested rather than rejecting the form.
    let last_tested_part = parts::normalize_part(payload.last_tested_part.as_deref().unwrap_or(""));

    // unparseable birth dates are dropped rather than failing the form
    let birth_date = payload
        .birth_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

    let student = db::insert_student(
        &state.pool,
        NewStudent {
            identity_number: trimmed(payload.identity_number),
            full_name,
            student_phone: trimmed(payload.student_phone),
            parent_phone: payload
                .parent_phone
                .map(|p| p.trim().to_string())
                .unwrap_or_default(),
            parent_identity: trimmed(payload.parent_identity),
            grade,
            birth_date,
            last_tested_part: last_tested_part.to_string(),
            previous_center: trimmed(payload.previous_center),
            neighborhood: trimmed(payload.neighborhood),
        },
    )
    .await?;

    tracing::info!(
        "Registered student {} ({}) in stage {}",
        student.id,
        student.full_name,
        student.educational_stage
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            student_id: student.id,
            status: student.status,
            educational_stage: student.educational_stage,
        }),
    ))
}

async fn grades() -> Json<Vec<GradeChoice>> {
    Json(
        stage::GRADE_CODES
            .iter()
            .copied()
            .map(|code| GradeChoice {
                code,
                label: stage::grade_label(code),
            })
            .collect(),
    )
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
