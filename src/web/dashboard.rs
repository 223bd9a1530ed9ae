use crate::db;
use crate::domain::roles::RoleCode;
use crate::state::SharedState;
use crate::web::error::AppError;
use crate::web::session::UserSession;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(overview)).with_state(state)
}

/// Role-scoped landing summary: only the sections the caller's capabilities
/// unlock are populated.
#[derive(Serialize)]
struct DashboardResponse {
    user_id: i64,
    display_name: String,
    is_superuser: bool,
    roles: Vec<String>,
    stage_supervisor: bool,
    supervised_stage: Option<String>,
    pending_students: Option<i64>,
    roster_size: Option<i64>,
    internal_exams_open: Option<i64>,
    association_exams_open: Option<i64>,
    at_risk_students: Option<i64>,
}

/// The roster section keys off assignment, not count: a teacher whose
/// students all left still sees an explicit zero instead of nothing.
fn roster_section(assigned: bool, active: i64) -> Option<i64> {
    assigned.then_some(active)
}

async fn overview(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Denied)?;

    let roles = db::role_codes_for(&state.pool, user.id).await?;
    let stage_supervisor = db::is_stage_supervisor(&state.pool, &user).await?;
    let stage_profile = db::find_stage_supervisor(&state.pool, user.id).await?;
    let supervised_stage = stage_profile.as_ref().and_then(|p| p.stage.clone());

    let is_global_approver = user.is_superuser
        || db::has_role(&state.pool, &user, RoleCode::Supervisor).await?
        || db::has_role(&state.pool, &user, RoleCode::Manager).await?;

    let pending_students = if is_global_approver {
        Some(db::pending_count(&state.pool, None).await?)
    } else if let Some(stage) = supervised_stage.as_deref() {
        Some(db::pending_count(&state.pool, Some(stage)).await?)
    } else {
        None
    };

    let roster_size = roster_section(
        db::is_assigned_teacher(&state.pool, user.id).await?,
        db::roster_count(&state.pool, user.id).await?,
    );

    let (internal_exams_open, association_exams_open) =
        if db::has_role(&state.pool, &user, RoleCode::Examiner).await? {
            (
                Some(db::internal_open_count(&state.pool).await?),
                Some(db::association_open_count(&state.pool).await?),
            )
        } else {
            (None, None)
        };

    let at_risk_students = if db::has_role(&state.pool, &user, RoleCode::Preparer).await? {
        Some(db::at_risk_count(&state.pool).await?)
    } else {
        None
    };

    Ok(Json(DashboardResponse {
        user_id: user.id,
        display_name: user.display_name,
        is_superuser: user.is_superuser,
        roles,
        stage_supervisor,
        supervised_stage,
        pending_students,
        roster_size,
        internal_exams_open,
        association_exams_open,
        at_risk_students,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_roster_still_shown_for_assigned_teacher() {
        assert_eq!(roster_section(true, 0), Some(0));
        assert_eq!(roster_section(true, 7), Some(7));
    }

    #[test]
    fn test_no_roster_section_without_assignment() {
        assert_eq!(roster_section(false, 0), None);
    }
}
