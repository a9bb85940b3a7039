//! SQL implementation of the slot repository

use crate::error::{is_unique_violation, DbError};
use crate::repositories::slots::{SlotDeletion, SlotFilter, SlotRepository};
use crate::rows::{map_slot, to_epoch};
use crate::DbClient;
use chrono::{DateTime, SubsecRound, Utc};
use clinic_common::models::{Slot, SlotStatus};
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

const SLOT_COLUMNS: &str = "id, doctor_id, starts_at, ends_at, status, created_at, updated_at";

/// SQL implementation of the slot repository
#[derive(Debug, Clone)]
pub struct SqlSlotRepository {
    db_client: DbClient,
}

impl SqlSlotRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl SlotRepository for SqlSlotRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing slot schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS availability_slots (
                id TEXT PRIMARY KEY,
                doctor_id TEXT NOT NULL REFERENCES users(id),
                starts_at BIGINT NOT NULL,
                ends_at BIGINT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                UNIQUE(doctor_id, starts_at, ends_at),
                CHECK (ends_at > starts_at)
            )
        "#;

        self.db_client.execute(query).await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_slots_doctor_start \
                 ON availability_slots (doctor_id, starts_at)",
            )
            .await?;

        info!("Slot schema initialized successfully");
        Ok(())
    }

    async fn insert_slot(
        &self,
        doctor_id: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Option<Slot>, DbError> {
        debug!("Inserting slot for {}: {} - {}", doctor_id, starts_at, ends_at);

        let now = Utc::now().trunc_subsecs(0);
        let slot = Slot {
            id: Uuid::new_v4().to_string(),
            doctor_id: doctor_id.to_string(),
            starts_at: starts_at.trunc_subsecs(0),
            ends_at: ends_at.trunc_subsecs(0),
            status: SlotStatus::Open,
            created_at: now,
            updated_at: now,
        };

        // Half-open overlap against every slot of the doctor, booked or not
        let query = r#"
            INSERT INTO availability_slots
                (id, doctor_id, starts_at, ends_at, status, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM availability_slots
                WHERE doctor_id = $8 AND starts_at < $9 AND ends_at > $10
            )
        "#;

        let result = sqlx::query(query)
            .bind(&slot.id)
            .bind(&slot.doctor_id)
            .bind(to_epoch(slot.starts_at))
            .bind(to_epoch(slot.ends_at))
            .bind(SlotStatus::Open.as_str())
            .bind(to_epoch(now))
            .bind(to_epoch(now))
            .bind(&slot.doctor_id)
            .bind(to_epoch(slot.ends_at))
            .bind(to_epoch(slot.starts_at))
            .execute(self.db_client.pool())
            .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                info!("Slot {} created for doctor {}", slot.id, doctor_id);
                Ok(Some(slot))
            }
            Ok(_) => {
                debug!("Slot {} - {} overlaps an existing slot", starts_at, ends_at);
                Ok(None)
            }
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => {
                error!("Failed to insert slot: {}", e);
                Err(DbError::QueryError(e.to_string()))
            }
        }
    }

    async fn find_by_id(&self, slot_id: &str) -> Result<Option<Slot>, DbError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(slot_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find slot: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_slot(&row, "")).transpose()
    }

    async fn list_for_doctor(
        &self,
        doctor_id: &str,
        filter: SlotFilter,
    ) -> Result<Vec<Slot>, DbError> {
        debug!("Listing slots for {} with {:?}", doctor_id, filter);

        let mut query = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE doctor_id = $1");
        if filter.open_only {
            query.push_str(" AND status = 'open'");
        }
        if filter.starting_after.is_some() {
            query.push_str(" AND starts_at > $2");
        }
        query.push_str(" ORDER BY starts_at");

        let mut statement = sqlx::query(&query).bind(doctor_id);
        if let Some(after) = filter.starting_after {
            statement = statement.bind(to_epoch(after));
        }

        let rows = statement
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list slots: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(|row| map_slot(row, "")).collect()
    }

    async fn delete_open_slot(
        &self,
        doctor_id: &str,
        slot_id: &str,
    ) -> Result<SlotDeletion, DbError> {
        debug!("Deleting slot {} of doctor {}", slot_id, doctor_id);

        let deleted = sqlx::query(
            "DELETE FROM availability_slots WHERE id = $1 AND doctor_id = $2 AND status = 'open'",
        )
        .bind(slot_id)
        .bind(doctor_id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to delete slot: {}", e);
            DbError::QueryError(e.to_string())
        })?
        .rows_affected();

        if deleted > 0 {
            info!("Slot {} deleted", slot_id);
            return Ok(SlotDeletion::Deleted);
        }

        let remaining = sqlx::query(
            "SELECT status FROM availability_slots WHERE id = $1 AND doctor_id = $2",
        )
        .bind(slot_id)
        .bind(doctor_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        match remaining {
            None => Ok(SlotDeletion::NotFound),
            Some(row) => {
                let status: String = row.try_get("status")?;
                if status == SlotStatus::Booked.as_str() {
                    Ok(SlotDeletion::Booked)
                } else {
                    Err(DbError::QueryError(format!(
                        "slot {slot_id} was not deleted in status {status}"
                    )))
                }
            }
        }
    }
}
