//! Shared fixtures for the repository tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, SubsecRound, Utc};
use clinic_common::models::{NewUser, Slot, User, UserRole};
use clinic_config::DatabaseConfig;
use clinic_db::{DbClient, SlotRepository, SqlSlotRepository, SqlUserRepository, UserRepository};
use tempfile::TempDir;

/// A fresh SQLite file with the full schema. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn test_db() -> (TempDir, DbClient) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("clinic.db").display());
    let config = DatabaseConfig {
        url,
        max_connections: 8,
        acquire_timeout_secs: 10,
    };

    let db = DbClient::from_config(&config).await.expect("db client");
    clinic_db::init_schema(&db).await.expect("schema");
    (dir, db)
}

pub async fn create_user(db: &DbClient, email: &str, role: UserRole) -> User {
    SqlUserRepository::new(db.clone())
        .create_user(NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: email.split('@').next().unwrap_or("user").to_string(),
            role,
            calendar_id: None,
        })
        .await
        .expect("create user")
}

pub async fn doctor(db: &DbClient, email: &str) -> User {
    create_user(db, email, UserRole::Doctor).await
}

pub async fn patient(db: &DbClient, email: &str) -> User {
    create_user(db, email, UserRole::Patient).await
}

/// Start of a slot `days` days from now, truncated to whole seconds.
pub fn in_days(days: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::days(days)).trunc_subsecs(0)
}

pub async fn open_slot(db: &DbClient, doctor_id: &str, starts_at: DateTime<Utc>) -> Slot {
    SqlSlotRepository::new(db.clone())
        .insert_slot(doctor_id, starts_at, starts_at + Duration::minutes(30))
        .await
        .expect("insert slot")
        .expect("slot does not overlap")
}

pub async fn count_appointments_for_slot(db: &DbClient, slot_id: &str) -> i64 {
    use sqlx::Row;

    sqlx::query("SELECT COUNT(*) AS n FROM appointments WHERE slot_id = $1")
        .bind(slot_id)
        .fetch_one(db.pool())
        .await
        .expect("count")
        .try_get("n")
        .expect("count column")
}
