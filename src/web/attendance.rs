use crate::db::{self, DbUser};
use crate::domain::attendance::AttendanceStatus;
use crate::domain::calendar;
use crate::domain::roles::RoleCode;
use crate::state::SharedState;
use crate::time_utils;
use crate::web::error::AppError;
use crate::web::session::UserSession;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/roster", get(roster))
        .route("/submit", post(submit))
        .route("/teachers", post(submit_teachers))
        .route("/summary", get(summary))
        .with_state(state)
}

#[derive(Serialize)]
struct RosterStudent {
    id: i64,
    full_name: String,
    grade: String,
    last_tested_part: String,
}

/// Bulk daily submission: student id -> status string. Students missing from
/// the map simply get no record for the day.
#[derive(Deserialize)]
struct SubmitPayload {
    date: Option<String>,
    entries: HashMap<i64, String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    date: NaiveDate,
    weekday: &'static str,
    week_number: i32,
    saved: usize,
}

#[derive(Deserialize)]
struct SummaryParams {
    date: Option<String>,
}

#[derive(Serialize)]
struct TeacherEntry {
    teacher_id: i64,
    display_name: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    date: NaiveDate,
    submitted: Vec<TeacherEntry>,
    missing: Vec<TeacherEntry>,
}

/// Parses every status up front so one invalid entry rejects the whole
/// payload before anything is written.
fn parse_entries(
    entries: &HashMap<i64, String>,
) -> Result<Vec<(i64, AttendanceStatus)>, AppError> {
    entries
        .iter()
        .map(|(id, raw)| {
            AttendanceStatus::parse(raw)
                .map(|status| (*id, status))
                .ok_or(AppError::BadRequest)
        })
        .collect()
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

async fn roster(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<RosterStudent>>, AppError> {
    let students = db::active_students_of(&state.pool, user_id).await?;
    Ok(Json(
        students
            .into_iter()
            .map(|s| RosterStudent {
                id: s.id,
                full_name: s.full_name,
                grade: s.grade,
                last_tested_part: s.last_tested_part,
            })
            .collect(),
    ))
}

/// Teacher's daily submission for their own active students. Weekday and
/// week number are stamped at write time from the academic calendar;
/// resubmitting the same date overwrites. A payload with any invalid status
/// is rejected before the first row is written.
async fn submit(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SubmitPayload>,
) -> Result<Json<SubmitResponse>, AppError> {
    let date = time_utils::parse_date_or_today(payload.date.as_deref());
    let weeks = db::load_calendar(&state.pool).await?;
    let week_number = calendar::week_for(&weeks, date);
    let weekday = calendar::weekday_name(date);

    let roster: HashSet<i64> = db::active_students_of(&state.pool, user_id)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    // entries for students outside the caller's roster are ignored
    let on_roster: HashMap<i64, String> = payload
        .entries
        .into_iter()
        .filter(|(id, _)| roster.contains(id))
        .collect();
    let entries = parse_entries(&on_roster)?;

    for (student_id, status) in &entries {
        db::upsert_attendance(&state.pool, *student_id, date, weekday, week_number, *status)
            .await?;
    }
    let saved = entries.len();

    tracing::info!(
        "Teacher {} recorded attendance for {} students on {}",
        user_id,
        saved,
        date
    );

    Ok(Json(SubmitResponse {
        date,
        weekday,
        week_number,
        saved,
    }))
}

/// Staff attendance, recorded by the preparer, keyed (teacher, date).
async fn submit_teachers(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<SubmitPayload>,
) -> Result<Json<SubmitResponse>, AppError> {
    let preparer = require_preparer(&state, user_id).await?;

    let date = time_utils::parse_date_or_today(payload.date.as_deref());
    let weeks = db::load_calendar(&state.pool).await?;
    let week_number = calendar::week_for(&weeks, date);
    let weekday = calendar::weekday_name(date);

    let entries = parse_entries(&payload.entries)?;

    let mut saved = 0usize;
    for (teacher_id, status) in entries {
        let Some(teacher) = db::find_user_by_id(&state.pool, teacher_id).await? else {
            continue;
        };
        if !teacher.is_active {
            continue;
        }
        db::upsert_teacher_attendance(&state.pool, teacher_id, date, weekday, week_number, status)
            .await?;
        saved += 1;
    }

    tracing::info!(
        "Preparer {} recorded attendance for {} teachers on {}",
        preparer.username,
        saved,
        date
    );

    Ok(Json(SubmitResponse {
        date,
        weekday,
        week_number,
        saved,
    }))
}

/// Which teachers have submitted student attendance for the date, and which
/// have not. Preparer-only completeness view.
async fn summary(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    require_preparer(&state, user_id).await?;

    let date = time_utils::parse_date_or_today(params.date.as_deref());
    let teachers = db::teachers_with_students(&state.pool).await?;
    let submitted_ids: HashSet<i64> = db::teacher_ids_submitted_on(&state.pool, date)
        .await?
        .into_iter()
        .collect();

    let mut submitted = Vec::new();
    let mut missing = Vec::new();
    for teacher in teachers {
        let entry = TeacherEntry {
            teacher_id: teacher.id,
            display_name: if teacher.display_name.is_empty() {
                teacher.username
            } else {
                teacher.display_name
            },
        };
        if submitted_ids.contains(&entry.teacher_id) {
            submitted.push(entry);
        } else {
            missing.push(entry);
        }
    }

    Ok(Json(SummaryResponse {
        date,
        submitted,
        missing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_bad_status_rejects_the_whole_payload() {
        let mut entries = HashMap::new();
        entries.insert(1, "حاضر".to_string());
        entries.insert(2, "bogus".to_string());
        assert!(matches!(
            parse_entries(&entries),
            Err(AppError::BadRequest)
        ));
    }

    #[test]
    fn test_valid_payload_parses_every_entry() {
        let mut entries = HashMap::new();
        entries.insert(1, "حاضر".to_string());
        entries.insert(2, "غائب".to_string());
        entries.insert(3, "مستأذن".to_string());
        let parsed = parse_entries(&entries).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed
            .iter()
            .any(|(id, status)| *id == 2 && *status == AttendanceStatus::Absent));
    }
}
