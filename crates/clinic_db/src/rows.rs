//! Row mapping helpers.
//!
//! `DateTime<Utc>` does not implement `Decode` for `sqlx::Any`, so every
//! timestamp is stored as unix seconds and converted here.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use clinic_common::models::{Appointment, AppointmentDetails, Slot, User};
use sqlx::any::AnyRow;
use sqlx::Row;

pub(crate) fn to_epoch(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn from_epoch(secs: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| DbError::MappingError(format!("timestamp out of range: {secs}")))
}

/// Booleans are stored as BIGINT 0/1.
pub(crate) fn to_flag(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn from_flag(value: i64) -> bool {
    value != 0
}

/// Optional text is stored as `''` because the `Any` driver cannot decode
/// NULL into `Option<String>`.
pub(crate) fn to_optional_text(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    let value = text(row, column)?;
    Ok((!value.is_empty()).then_some(value))
}

fn text(row: &AnyRow, column: &str) -> Result<String, DbError> {
    Ok(row.try_get::<String, _>(column)?)
}

fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, DbError> {
    from_epoch(row.try_get::<i64, _>(column)?)
}

fn parsed<T: std::str::FromStr<Err = String>>(row: &AnyRow, column: &str) -> Result<T, DbError> {
    text(row, column)?.parse().map_err(DbError::MappingError)
}

/// Map a user whose columns carry `prefix` (empty for a plain `users` select).
pub(crate) fn map_user(row: &AnyRow, prefix: &str) -> Result<User, DbError> {
    let col = |name: &str| format!("{prefix}{name}");

    Ok(User {
        id: text(row, &col("id"))?,
        email: text(row, &col("email"))?,
        first_name: text(row, &col("first_name"))?,
        last_name: text(row, &col("last_name"))?,
        role: parsed(row, &col("role"))?,
        calendar_id: optional_text(row, &col("calendar_id"))?,
        accepting_appointments: from_flag(
            row.try_get::<i64, _>(col("accepting_appointments").as_str())?,
        ),
        created_at: timestamp(row, &col("created_at"))?,
    })
}

pub(crate) fn map_slot(row: &AnyRow, prefix: &str) -> Result<Slot, DbError> {
    let col = |name: &str| format!("{prefix}{name}");

    Ok(Slot {
        id: text(row, &col("id"))?,
        doctor_id: text(row, &col("doctor_id"))?,
        starts_at: timestamp(row, &col("starts_at"))?,
        ends_at: timestamp(row, &col("ends_at"))?,
        status: parsed(row, &col("status"))?,
        created_at: timestamp(row, &col("created_at"))?,
        updated_at: timestamp(row, &col("updated_at"))?,
    })
}

pub(crate) fn map_appointment(row: &AnyRow, prefix: &str) -> Result<Appointment, DbError> {
    let col = |name: &str| format!("{prefix}{name}");

    Ok(Appointment {
        id: text(row, &col("id"))?,
        slot_id: text(row, &col("slot_id"))?,
        patient_id: text(row, &col("patient_id"))?,
        reason: text(row, &col("reason"))?,
        created_at: timestamp(row, &col("created_at"))?,
    })
}

/// Column list for [`map_details`]; every table is aliased with its own prefix.
pub(crate) const DETAILS_SELECT: &str = r#"
    SELECT
        a.id AS a_id, a.slot_id AS a_slot_id, a.patient_id AS a_patient_id,
        a.reason AS a_reason, a.created_at AS a_created_at,
        s.id AS s_id, s.doctor_id AS s_doctor_id, s.starts_at AS s_starts_at,
        s.ends_at AS s_ends_at, s.status AS s_status,
        s.created_at AS s_created_at, s.updated_at AS s_updated_at,
        d.id AS d_id, d.email AS d_email, d.first_name AS d_first_name,
        d.last_name AS d_last_name, d.role AS d_role,
        COALESCE(d.calendar_id, '') AS d_calendar_id,
        d.accepting_appointments AS d_accepting_appointments, d.created_at AS d_created_at,
        p.id AS p_id, p.email AS p_email, p.first_name AS p_first_name,
        p.last_name AS p_last_name, p.role AS p_role,
        COALESCE(p.calendar_id, '') AS p_calendar_id,
        p.accepting_appointments AS p_accepting_appointments, p.created_at AS p_created_at
    FROM appointments a
    JOIN availability_slots s ON s.id = a.slot_id
    JOIN users d ON d.id = s.doctor_id
    JOIN users p ON p.id = a.patient_id
"#;

pub(crate) fn map_details(row: &AnyRow) -> Result<AppointmentDetails, DbError> {
    Ok(AppointmentDetails {
        appointment: map_appointment(row, "a_")?,
        slot: map_slot(row, "s_")?,
        doctor: map_user(row, "d_")?,
        patient: map_user(row, "p_")?,
    })
}
