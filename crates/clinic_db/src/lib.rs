//! Database integration for the clinic booking service
//!
//! This crate provides a database client built on the SQLx `Any` driver and
//! the repositories for users, availability slots, appointments and calendar
//! event links. SQLite is enabled by default, PostgreSQL behind the `postgres`
//! feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use clinic_db::DbClient;
//!
//! async fn setup_db() -> Result<DbClient, clinic_db::error::DbError> {
//!     let db_client = DbClient::from_url("sqlite://data/clinic.db").await?;
//!     clinic_db::init_schema(&db_client).await?;
//!     Ok(db_client)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
mod rows;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;

pub use repositories::{
    AppointmentRepository, CalendarEventRepository, ReservationRequest, ReserveError,
    SlotDeletion, SlotFilter, SlotRepository, SqlAppointmentRepository,
    SqlCalendarEventRepository, SqlSlotRepository, SqlUserRepository, UserRepository,
};

/// Create all tables in dependency order.
pub async fn init_schema(db_client: &DbClient) -> Result<(), DbError> {
    SqlUserRepository::new(db_client.clone()).init_schema().await?;
    SqlSlotRepository::new(db_client.clone()).init_schema().await?;
    SqlAppointmentRepository::new(db_client.clone())
        .init_schema()
        .await?;
    SqlCalendarEventRepository::new(db_client.clone())
        .init_schema()
        .await?;
    Ok(())
}
