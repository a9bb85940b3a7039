use crate::error::{is_unique_violation, DbError};
use crate::repositories::calendar_events::CalendarEventRepository;
use crate::rows::{from_epoch, to_epoch};
use crate::DbClient;
use clinic_common::models::{CalendarEventLink, CalendarOwner};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct SqlCalendarEventRepository {
    db_client: DbClient,
}

impl SqlCalendarEventRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn map_link(row: &AnyRow) -> Result<CalendarEventLink, DbError> {
    let owner: String = row.try_get("owner")?;

    Ok(CalendarEventLink {
        appointment_id: row.try_get("appointment_id")?,
        owner: owner.parse().map_err(DbError::MappingError)?,
        event_id: row.try_get("event_id")?,
        created_at: from_epoch(row.try_get("created_at")?)?,
    })
}

impl CalendarEventRepository for SqlCalendarEventRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing calendar event schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS calendar_events (
                appointment_id TEXT NOT NULL REFERENCES appointments(id),
                owner TEXT NOT NULL,
                event_id TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                PRIMARY KEY (appointment_id, owner)
            )
        "#;

        self.db_client.execute(query).await?;
        Ok(())
    }

    async fn record_event(&self, link: &CalendarEventLink) -> Result<bool, DbError> {
        debug!(
            "Recording {} calendar event {} for appointment {}",
            link.owner.as_str(),
            link.event_id,
            link.appointment_id
        );

        let result = sqlx::query(
            r#"
            INSERT INTO calendar_events (appointment_id, owner, event_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&link.appointment_id)
        .bind(link.owner.as_str())
        .bind(&link.event_id)
        .bind(to_epoch(link.created_at))
        .execute(self.db_client.pool())
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => {
                error!("Failed to record calendar event: {}", e);
                Err(DbError::QueryError(e.to_string()))
            }
        }
    }

    async fn find_event(
        &self,
        appointment_id: &str,
        owner: CalendarOwner,
    ) -> Result<Option<CalendarEventLink>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT appointment_id, owner, event_id, created_at
            FROM calendar_events
            WHERE appointment_id = $1 AND owner = $2
            "#,
        )
        .bind(appointment_id)
        .bind(owner.as_str())
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.map(|row| map_link(&row)).transpose()
    }

    async fn list_for_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Vec<CalendarEventLink>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT appointment_id, owner, event_id, created_at
            FROM calendar_events
            WHERE appointment_id = $1
            ORDER BY owner
            "#,
        )
        .bind(appointment_id)
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(map_link).collect()
    }
}
