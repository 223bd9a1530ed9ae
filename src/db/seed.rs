use crate::db;
use crate::domain::calendar;
use crate::domain::roles::RoleCode;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use chrono::NaiveDate;
use sqlx::PgPool;

pub async fn seed_all(pool: &PgPool) -> Result<()> {
    seed_roles(pool).await?;
    seed_calendar(pool).await?;
    seed_admin(pool).await?;
    Ok(())
}

async fn seed_roles(pool: &PgPool) -> Result<()> {
    for role in RoleCode::ALL {
        sqlx::query(
            r#"
            INSERT INTO roles (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(role.as_str())
        .bind(role.label())
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Seeds the 19-week term starting Sunday 2026-01-18. Skipped once any
/// calendar rows exist, so a hand-edited calendar is left alone.
async fn seed_calendar(pool: &PgPool) -> Result<()> {
    if db::calendar_week_count(pool).await? > 0 {
        return Ok(());
    }

    let term_start = NaiveDate::from_ymd_opt(2026, 1, 18)
        .ok_or_else(|| anyhow::anyhow!("invalid term start date"))?;
    for week in calendar::term_weeks(term_start) {
        db::insert_calendar_week(pool, &week).await?;
        tracing::info!(
            "Seeded week {} ({} - {})",
            week.week_number,
            week.start_date,
            week.end_date
        );
    }
    Ok(())
}

/// Bootstraps the first superuser from ADMIN_USERNAME / ADMIN_PASSWORD.
/// Roles for everyone else are assigned through this account afterwards.
async fn seed_admin(pool: &PgPool) -> Result<()> {
    let (Ok(username), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(());
    };

    if db::find_user_by_username(pool, &username).await?.is_some() {
        return Ok(());
    }

    let salt = SaltString::generate(rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO users (username, hash, display_name, is_superuser)
        VALUES ($1, $2, $3, true)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(&username)
    .bind(&hash)
    .bind("مدير المركز")
    .execute(pool)
    .await?;
    tracing::info!("Seeded superuser {}", username);
    Ok(())
}
