pub mod seed;

use crate::domain::attendance::{self, AttendanceStatus};
use crate::domain::calendar::CalendarWeek;
use crate::domain::roles::RoleCode;
use crate::domain::stage;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub hash: String,
    pub display_name: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageSupervisorRow {
    pub id: i64,
    pub user_id: i64,
    pub stage: Option<String>,
    pub can_approve_students: bool,
    pub can_assign_teachers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub identity_number: Option<String>,
    pub full_name: String,
    pub student_phone: Option<String>,
    pub parent_phone: String,
    pub parent_identity: Option<String>,
    pub grade: String,
    pub birth_date: Option<NaiveDate>,
    pub last_tested_part: String,
    pub previous_center: Option<String>,
    pub neighborhood: Option<String>,
    pub teacher_id: Option<i64>,
    pub status: String,
    pub educational_stage: String,
    pub absence_reset_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Registration-form fields. Status and stage are never accepted from the
/// caller; the stage is derived from the grade on insert.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub identity_number: Option<String>,
    pub full_name: String,
    pub student_phone: Option<String>,
    pub parent_phone: String,
    pub parent_identity: Option<String>,
    pub grade: String,
    pub birth_date: Option<NaiveDate>,
    pub last_tested_part: String,
    pub previous_center: Option<String>,
    pub neighborhood: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NominationRow {
    pub id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    pub last_tested_part: String,
    pub teacher_grade: Option<f64>,
    pub internal_grade: Option<f64>,
    pub association_grade: Option<f64>,
    pub nomination_date: NaiveDate,
    pub internal_passed: bool,
    pub association_tested: bool,
}

/// Nomination joined with the student's name for examiner worklists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NominationWithStudent {
    pub id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    pub student_name: String,
    pub last_tested_part: String,
    pub teacher_grade: Option<f64>,
    pub internal_grade: Option<f64>,
    pub association_grade: Option<f64>,
    pub nomination_date: NaiveDate,
    pub internal_passed: bool,
    pub association_tested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AtRiskStudent {
    pub student_id: i64,
    pub full_name: String,
    pub teacher_id: Option<i64>,
    pub absence_reset_at: Option<NaiveDate>,
    pub absences: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherRef {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

// ============================================
// Users and capabilities
// ============================================

const USER_COLUMNS: &str =
    "id, username, hash, display_name, is_superuser, is_active, created_at";

pub async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND is_active = true"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Capability check: superusers hold every role; everyone else needs a
/// (user, role) assignment row.
pub async fn has_role(pool: &PgPool, user: &DbUser, role: RoleCode) -> Result<bool> {
    if user.is_superuser {
        return Ok(true);
    }
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.code = $2
        )
        "#,
    )
    .bind(user.id)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn role_codes_for(pool: &PgPool, user_id: i64) -> Result<Vec<String>> {
    let codes = sqlx::query_scalar(
        r#"
        SELECT r.code
        FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = $1
        ORDER BY r.code
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(codes)
}

pub async fn find_stage_supervisor(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<StageSupervisorRow>> {
    let row = sqlx::query_as::<_, StageSupervisorRow>(
        r#"
        SELECT id, user_id, stage, can_approve_students, can_assign_teachers
        FROM stage_supervisors
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Stage-supervisor check: a bound profile, the supervisor role, or the
/// superuser flag all qualify.
pub async fn is_stage_supervisor(pool: &PgPool, user: &DbUser) -> Result<bool> {
    if user.is_superuser {
        return Ok(true);
    }
    if find_stage_supervisor(pool, user.id).await?.is_some() {
        return Ok(true);
    }
    has_role(pool, user, RoleCode::Supervisor).await
}

// ============================================
// Students
// ============================================

const STUDENT_COLUMNS: &str = "id, identity_number, full_name, student_phone, parent_phone, \
     parent_identity, grade, birth_date, last_tested_part, previous_center, neighborhood, \
     teacher_id, status, educational_stage, absence_reset_at, created_at";

pub async fn insert_student(pool: &PgPool, new: NewStudent) -> Result<StudentRow> {
    let educational_stage = stage::stage_for_code(&new.grade).as_str();
    let student = sqlx::query_as::<_, StudentRow>(&format!(
        r#"
        INSERT INTO students (
            identity_number, full_name, student_phone, parent_phone, parent_identity,
            grade, birth_date, last_tested_part, previous_center, neighborhood,
            status, educational_stage
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'منتظر', $11)
        RETURNING {STUDENT_COLUMNS}
        "#
    ))
    .bind(&new.identity_number)
    .bind(&new.full_name)
    .bind(&new.student_phone)
    .bind(&new.parent_phone)
    .bind(&new.parent_identity)
    .bind(&new.grade)
    .bind(new.birth_date)
    .bind(&new.last_tested_part)
    .bind(&new.previous_center)
    .bind(&new.neighborhood)
    .bind(educational_stage)
    .fetch_one(pool)
    .await?;
    Ok(student)
}

pub async fn find_student(pool: &PgPool, id: i64) -> Result<Option<StudentRow>> {
    let student = sqlx::query_as::<_, StudentRow>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(student)
}

/// Pending students, optionally scoped to one educational stage for
/// stage-bound supervisors.
pub async fn pending_students(pool: &PgPool, stage: Option<&str>) -> Result<Vec<StudentRow>> {
    let students = match stage {
        Some(stage) => {
            sqlx::query_as::<_, StudentRow>(&format!(
                r#"
                SELECT {STUDENT_COLUMNS} FROM students
                WHERE status = 'منتظر' AND educational_stage = $1
                ORDER BY created_at
                "#
            ))
            .bind(stage)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, StudentRow>(&format!(
                "SELECT {STUDENT_COLUMNS} FROM students WHERE status = 'منتظر' ORDER BY created_at"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(students)
}

/// Activates a pending student, optionally binding a teacher in the same
/// write. Returns false when the student was not pending (no change made).
pub async fn approve_student(
    pool: &PgPool,
    student_id: i64,
    teacher_id: Option<i64>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE students
        SET status = 'منتظم',
            teacher_id = COALESCE($2, teacher_id)
        WHERE id = $1 AND status = 'منتظر'
        "#,
    )
    .bind(student_id)
    .bind(teacher_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a registration that has not been approved yet.
pub async fn delete_pending_student(pool: &PgPool, student_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1 AND status = 'منتظر'")
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn active_students_of(pool: &PgPool, teacher_id: i64) -> Result<Vec<StudentRow>> {
    let students = sqlx::query_as::<_, StudentRow>(&format!(
        r#"
        SELECT {STUDENT_COLUMNS} FROM students
        WHERE teacher_id = $1 AND status = 'منتظم'
        ORDER BY full_name
        "#
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;
    Ok(students)
}

pub async fn set_absence_reset(pool: &PgPool, student_id: i64, date: NaiveDate) -> Result<bool> {
    let result = sqlx::query("UPDATE students SET absence_reset_at = $2 WHERE id = $1")
        .bind(student_id)
        .bind(date)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================
// Academic calendar
// ============================================

#[derive(Debug, FromRow)]
struct CalendarRow {
    week_number: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

pub async fn load_calendar(pool: &PgPool) -> Result<Vec<CalendarWeek>> {
    let rows = sqlx::query_as::<_, CalendarRow>(
        "SELECT week_number, start_date, end_date FROM academic_calendar ORDER BY week_number",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| CalendarWeek {
            week_number: row.week_number,
            start_date: row.start_date,
            end_date: row.end_date,
        })
        .collect())
}

pub async fn calendar_week_count(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM academic_calendar")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn insert_calendar_week(pool: &PgPool, week: &CalendarWeek) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO academic_calendar (week_number, start_date, end_date)
        VALUES ($1, $2, $3)
        ON CONFLICT (week_number) DO NOTHING
        "#,
    )
    .bind(week.week_number)
    .bind(week.start_date)
    .bind(week.end_date)
    .execute(pool)
    .await?;
    Ok(())
}

// ============================================
// Attendance
// ============================================

/// One row per (student, date); resubmission overwrites status and the
/// stamped weekday/week.
pub async fn upsert_attendance(
    pool: &PgPool,
    student_id: i64,
    date: NaiveDate,
    weekday: &str,
    week_number: i32,
    status: AttendanceStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO attendance (student_id, date, weekday, week_number, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, date) DO UPDATE
        SET status = EXCLUDED.status,
            weekday = EXCLUDED.weekday,
            week_number = EXCLUDED.week_number
        "#,
    )
    .bind(student_id)
    .bind(date)
    .bind(weekday)
    .bind(week_number)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_teacher_attendance(
    pool: &PgPool,
    teacher_id: i64,
    date: NaiveDate,
    weekday: &str,
    week_number: i32,
    status: AttendanceStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teacher_attendance (teacher_id, date, weekday, week_number, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (teacher_id, date) DO UPDATE
        SET status = EXCLUDED.status,
            weekday = EXCLUDED.weekday,
            week_number = EXCLUDED.week_number
        "#,
    )
    .bind(teacher_id)
    .bind(date)
    .bind(weekday)
    .bind(week_number)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Teachers who have at least one active student, for the preparer's
/// submission summary.
pub async fn teachers_with_students(pool: &PgPool) -> Result<Vec<TeacherRef>> {
    let teachers = sqlx::query_as::<_, TeacherRef>(
        r#"
        SELECT DISTINCT u.id, u.username, u.display_name
        FROM users u
        JOIN students s ON s.teacher_id = u.id
        WHERE s.status = 'منتظم' AND u.is_active = true
        ORDER BY u.display_name, u.username
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(teachers)
}

/// Teachers with at least one attendance row submitted for the date.
pub async fn teacher_ids_submitted_on(pool: &PgPool, date: NaiveDate) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT DISTINCT s.teacher_id
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        WHERE a.date = $1 AND s.teacher_id IS NOT NULL
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

// ============================================
// Absence risk
// ============================================

#[derive(Debug, FromRow)]
struct AbsenceRow {
    student_id: i64,
    full_name: String,
    teacher_id: Option<i64>,
    absence_reset_at: Option<NaiveDate>,
    date: NaiveDate,
}

/// Active students whose absences since their reset baseline reached the
/// risk threshold. The baseline arithmetic lives in
/// [`crate::domain::attendance`]; this only fetches the raw absence dates.
pub async fn at_risk_students(pool: &PgPool) -> Result<Vec<AtRiskStudent>> {
    let rows = sqlx::query_as::<_, AbsenceRow>(
        r#"
        SELECT s.id AS student_id,
               s.full_name,
               s.teacher_id,
               s.absence_reset_at,
               a.date
        FROM students s
        JOIN attendance a ON a.student_id = s.id
        WHERE s.status = 'منتظم' AND a.status = 'غائب'
        ORDER BY s.id, a.date
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<(AtRiskStudent, Vec<NaiveDate>)> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some((student, dates)) if student.student_id == row.student_id => {
                dates.push(row.date);
            }
            _ => grouped.push((
                AtRiskStudent {
                    student_id: row.student_id,
                    full_name: row.full_name,
                    teacher_id: row.teacher_id,
                    absence_reset_at: row.absence_reset_at,
                    absences: 0,
                },
                vec![row.date],
            )),
        }
    }

    let mut students: Vec<AtRiskStudent> = grouped
        .into_iter()
        .filter_map(|(mut student, dates)| {
            student.absences =
                attendance::counted_absences(&dates, student.absence_reset_at);
            attendance::is_at_risk(student.absences).then_some(student)
        })
        .collect();
    students.sort_by(|a, b| b.absences.cmp(&a.absences).then(a.full_name.cmp(&b.full_name)));
    Ok(students)
}

pub async fn at_risk_count(pool: &PgPool) -> Result<i64> {
    Ok(at_risk_students(pool).await?.len() as i64)
}

// ============================================
// Exam nominations
// ============================================

const NOMINATION_COLUMNS: &str = "id, student_id, teacher_id, last_tested_part, teacher_grade, \
     internal_grade, association_grade, nomination_date, internal_passed, association_tested";

pub async fn insert_nomination(
    pool: &PgPool,
    student_id: i64,
    teacher_id: i64,
    last_tested_part: &str,
    teacher_grade: f64,
) -> Result<NominationRow> {
    let nomination = sqlx::query_as::<_, NominationRow>(&format!(
        r#"
        INSERT INTO exam_nominations (student_id, teacher_id, last_tested_part, teacher_grade)
        VALUES ($1, $2, $3, $4)
        RETURNING {NOMINATION_COLUMNS}
        "#
    ))
    .bind(student_id)
    .bind(teacher_id)
    .bind(last_tested_part)
    .bind(teacher_grade)
    .fetch_one(pool)
    .await?;
    Ok(nomination)
}

pub async fn find_nomination(pool: &PgPool, id: i64) -> Result<Option<NominationRow>> {
    let nomination = sqlx::query_as::<_, NominationRow>(&format!(
        "SELECT {NOMINATION_COLUMNS} FROM exam_nominations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(nomination)
}

/// Examiner worklist for the internal exam. A nomination leaves this list the
/// moment it passes, regardless of later edits.
pub async fn internal_worklist(pool: &PgPool) -> Result<Vec<NominationWithStudent>> {
    let nominations = sqlx::query_as::<_, NominationWithStudent>(
        r#"
        SELECT n.id, n.student_id, n.teacher_id, s.full_name AS student_name,
               n.last_tested_part, n.teacher_grade, n.internal_grade, n.association_grade,
               n.nomination_date, n.internal_passed, n.association_tested
        FROM exam_nominations n
        JOIN students s ON s.id = n.student_id
        WHERE n.internal_passed = false
        ORDER BY n.nomination_date DESC, n.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(nominations)
}

/// Examiner worklist for the association exam: passed internal, not yet
/// association-tested.
pub async fn association_worklist(pool: &PgPool) -> Result<Vec<NominationWithStudent>> {
    let nominations = sqlx::query_as::<_, NominationWithStudent>(
        r#"
        SELECT n.id, n.student_id, n.teacher_id, s.full_name AS student_name,
               n.last_tested_part, n.teacher_grade, n.internal_grade, n.association_grade,
               n.nomination_date, n.internal_passed, n.association_tested
        FROM exam_nominations n
        JOIN students s ON s.id = n.student_id
        WHERE n.internal_passed = true AND n.association_tested = false
        ORDER BY n.nomination_date DESC, n.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(nominations)
}

pub async fn record_internal_grade(
    pool: &PgPool,
    nomination_id: i64,
    grade: f64,
    passed: bool,
) -> Result<()> {
    sqlx::query(
        "UPDATE exam_nominations SET internal_grade = $2, internal_passed = $3 WHERE id = $1",
    )
    .bind(nomination_id)
    .bind(grade)
    .bind(passed)
    .execute(pool)
    .await?;
    Ok(())
}

/// Recording an association grade is what marks the nomination as
/// association-tested; the flag never diverges from grade presence.
pub async fn record_association_grade(pool: &PgPool, nomination_id: i64, grade: f64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE exam_nominations
        SET association_grade = $2, association_tested = true
        WHERE id = $1
        "#,
    )
    .bind(nomination_id)
    .bind(grade)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn nominations_for_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Vec<NominationRow>> {
    let nominations = sqlx::query_as::<_, NominationRow>(&format!(
        r#"
        SELECT {NOMINATION_COLUMNS} FROM exam_nominations
        WHERE student_id = $1
        ORDER BY nomination_date DESC, id DESC
        "#
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(nominations)
}

pub async fn delete_nomination(pool: &PgPool, nomination_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exam_nominations WHERE id = $1")
        .bind(nomination_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================
// Dashboard counts
// ============================================

pub async fn pending_count(pool: &PgPool, stage: Option<&str>) -> Result<i64> {
    let count: i64 = match stage {
        Some(stage) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM students WHERE status = 'منتظر' AND educational_stage = $1",
            )
            .bind(stage)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE status = 'منتظر'")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

/// Whether any student, in any status, is assigned to this user. Separates
/// a teacher with a currently-empty roster from a non-teacher.
pub async fn is_assigned_teacher(pool: &PgPool, user_id: i64) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE teacher_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn roster_count(pool: &PgPool, teacher_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM students WHERE teacher_id = $1 AND status = 'منتظم'",
    )
    .bind(teacher_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn internal_open_count(pool: &PgPool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM exam_nominations WHERE internal_passed = false")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn association_open_count(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_nominations WHERE internal_passed = true AND association_tested = false",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
