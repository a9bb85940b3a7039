//! SQL implementation of the appointment repository

use crate::client::DbTransaction;
use crate::error::{is_unique_violation, DbError};
use crate::repositories::appointments::{
    AppointmentRepository, ReservationRequest, ReserveError,
};
use crate::rows::{
    from_epoch, from_flag, map_appointment, map_details, to_epoch, to_flag, DETAILS_SELECT,
};
use crate::DbClient;
use clinic_common::models::{Appointment, AppointmentDetails, SlotStatus, UserRole};
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = "id, slot_id, patient_id, reason, created_at";

/// Claims the slot. Written as the first statement of the transaction so the
/// write lock is taken before anything is read.
const CLAIM_SLOT: &str = r#"
    UPDATE availability_slots
    SET status = 'booked', updated_at = $1
    WHERE id = $2
      AND status = 'open'
      AND starts_at > $3
      AND doctor_id IN (SELECT id FROM users WHERE accepting_appointments = $4)
"#;

const INSERT_APPOINTMENT: &str = r#"
    INSERT INTO appointments (id, slot_id, patient_id, reason, created_at)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// SQL implementation of the appointment repository
#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    db_client: DbClient,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn ensure_patient(&self, patient_id: &str) -> Result<(), ReserveError> {
        let row = sqlx::query("SELECT role FROM users WHERE id = $1")
            .bind(patient_id)
            .fetch_optional(self.db_client.pool())
            .await?;

        match row {
            Some(row) if row.try_get::<String, _>("role")? == UserRole::Patient.as_str() => Ok(()),
            _ => Err(ReserveError::PatientNotFound(patient_id.to_string())),
        }
    }

    /// Explain why the claim touched no row. Runs inside the same transaction.
    async fn classify_unclaimed(
        tx: &mut DbTransaction<'static>,
        slot_id: &str,
        now: i64,
    ) -> Result<ReserveError, ReserveError> {
        let row = sqlx::query(
            r#"
            SELECT s.status, s.starts_at, u.accepting_appointments
            FROM availability_slots s
            JOIN users u ON u.id = s.doctor_id
            WHERE s.id = $1
            "#,
        )
        .bind(slot_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            return Ok(ReserveError::SlotNotFound(slot_id.to_string()));
        };

        let status: String = row.try_get("status")?;
        let starts_at: i64 = row.try_get("starts_at")?;
        let accepting = from_flag(row.try_get::<i64, _>("accepting_appointments")?);

        let reason = if status == SlotStatus::Booked.as_str() {
            ReserveError::AlreadyBooked(slot_id.to_string())
        } else if starts_at <= now {
            ReserveError::SlotStarted(slot_id.to_string())
        } else if !accepting {
            ReserveError::DoctorUnavailable(slot_id.to_string())
        } else {
            ReserveError::Db(DbError::QueryError(format!(
                "slot {slot_id} in status {status} could not be claimed"
            )))
        };

        Ok(reason)
    }
}

impl AppointmentRepository for SqlAppointmentRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointment schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                slot_id TEXT NOT NULL UNIQUE REFERENCES availability_slots(id),
                patient_id TEXT NOT NULL REFERENCES users(id),
                reason TEXT NOT NULL DEFAULT '',
                created_at BIGINT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments (patient_id)",
            )
            .await?;

        info!("Appointment schema initialized successfully");
        Ok(())
    }

    async fn reserve_slot(&self, request: &ReservationRequest) -> Result<Appointment, ReserveError> {
        debug!(
            "Reserving slot {} for patient {}",
            request.slot_id, request.patient_id
        );

        self.ensure_patient(&request.patient_id).await?;

        let now = to_epoch(request.requested_at);
        let mut tx = self.db_client.begin().await?;

        let claimed = sqlx::query(CLAIM_SLOT)
            .bind(now)
            .bind(&request.slot_id)
            .bind(now)
            .bind(to_flag(true))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if claimed == 0 {
            let reason = Self::classify_unclaimed(&mut tx, &request.slot_id, now).await;
            tx.rollback().await?;
            return Err(reason.unwrap_or_else(|err| err));
        }

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            slot_id: request.slot_id.clone(),
            patient_id: request.patient_id.clone(),
            reason: request.reason.clone(),
            created_at: from_epoch(now)?,
        };

        sqlx::query(INSERT_APPOINTMENT)
            .bind(&appointment.id)
            .bind(&appointment.slot_id)
            .bind(&appointment.patient_id)
            .bind(&appointment.reason)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ReserveError::AlreadyBooked(request.slot_id.clone())
                } else {
                    error!("Failed to insert appointment: {}", e);
                    ReserveError::from(e)
                }
            })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(
            "Slot {} booked as appointment {}",
            appointment.slot_id, appointment.id
        );
        Ok(appointment)
    }

    async fn find_by_id(&self, appointment_id: &str) -> Result<Option<Appointment>, DbError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(appointment_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find appointment: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_appointment(&row, "")).transpose()
    }

    async fn find_by_slot(&self, slot_id: &str) -> Result<Option<Appointment>, DbError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE slot_id = $1");

        let row = sqlx::query(&query)
            .bind(slot_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find appointment by slot: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_appointment(&row, "")).transpose()
    }

    async fn find_details(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentDetails>, DbError> {
        let query = format!("{DETAILS_SELECT} WHERE a.id = $1");

        let row = sqlx::query(&query)
            .bind(appointment_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load appointment details: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_details(&row)).transpose()
    }

    async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<AppointmentDetails>, DbError> {
        let query = format!("{DETAILS_SELECT} WHERE a.patient_id = $1 ORDER BY s.starts_at");

        let rows = sqlx::query(&query)
            .bind(patient_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list patient appointments: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(map_details).collect()
    }

    async fn list_for_doctor(&self, doctor_id: &str) -> Result<Vec<AppointmentDetails>, DbError> {
        let query = format!("{DETAILS_SELECT} WHERE s.doctor_id = $1 ORDER BY s.starts_at");

        let rows = sqlx::query(&query)
            .bind(doctor_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list doctor appointments: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(map_details).collect()
    }
}
