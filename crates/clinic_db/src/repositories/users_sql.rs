//! SQL implementation of the user repository

use crate::error::{is_unique_violation, DbError};
use crate::repositories::users::UserRepository;
use crate::rows::{map_user, to_epoch, to_flag, to_optional_text};
use crate::DbClient;
use chrono::{SubsecRound, Utc};
use clinic_common::models::{NewUser, User, UserRole};
use tracing::{debug, error, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, \
    COALESCE(calendar_id, '') AS calendar_id, accepting_appointments, created_at";

/// SQL implementation of the user repository
#[derive(Debug, Clone)]
pub struct SqlUserRepository {
    db_client: DbClient,
}

impl SqlUserRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl UserRepository for SqlUserRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing user schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL,
                calendar_id TEXT NOT NULL DEFAULT '',
                accepting_appointments BIGINT NOT NULL DEFAULT 1,
                created_at BIGINT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("User schema initialized successfully");
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DbError> {
        debug!("Creating {} with email {}", user.role, user.email);

        let created = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            calendar_id: user.calendar_id.filter(|id| !id.is_empty()),
            accepting_appointments: true,
            created_at: Utc::now().trunc_subsecs(0),
        };

        let query = r#"
            INSERT INTO users (id, email, first_name, last_name, role, calendar_id,
                               accepting_appointments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        sqlx::query(query)
            .bind(&created.id)
            .bind(&created.email)
            .bind(&created.first_name)
            .bind(&created.last_name)
            .bind(created.role.as_str())
            .bind(to_optional_text(created.calendar_id.as_deref()))
            .bind(to_flag(created.accepting_appointments))
            .bind(to_epoch(created.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::Conflict(format!("email {} is already registered", created.email))
                } else {
                    error!("Failed to insert user: {}", e);
                    DbError::QueryError(e.to_string())
                }
            })?;

        info!("User {} created", created.id);
        Ok(created)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, DbError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find user: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_user(&row, "")).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find user by email: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.map(|row| map_user(&row, "")).transpose()
    }

    async fn list_doctors(&self, accepting_only: bool) -> Result<Vec<User>, DbError> {
        let mut query = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1");
        if accepting_only {
            query.push_str(" AND accepting_appointments = $2");
        }
        query.push_str(" ORDER BY last_name, first_name");

        let mut rows = sqlx::query(&query).bind(UserRole::Doctor.as_str());
        if accepting_only {
            rows = rows.bind(to_flag(true));
        }
        let rows = rows
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list doctors: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(|row| map_user(row, "")).collect()
    }

    async fn set_accepting_appointments(
        &self,
        doctor_id: &str,
        accepting: bool,
    ) -> Result<bool, DbError> {
        debug!("Setting accepting_appointments={} for {}", accepting, doctor_id);

        let result = sqlx::query(
            "UPDATE users SET accepting_appointments = $1 WHERE id = $2 AND role = $3",
        )
        .bind(to_flag(accepting))
        .bind(doctor_id)
        .bind(UserRole::Doctor.as_str())
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to update doctor availability: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }
}
