//! Repository for appointments
//!
//! This is where the check-and-reserve of a slot happens. The conditional
//! update and the appointment insert share one store transaction, so the
//! guarantee holds across threads and across processes sharing the database.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use clinic_common::models::{Appointment, AppointmentDetails};
use thiserror::Error;

/// A request to turn an OPEN slot into an appointment.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub slot_id: String,
    pub patient_id: String,
    pub reason: String,
    /// Slots starting at or before this instant can no longer be booked.
    pub requested_at: DateTime<Utc>,
}

/// Why a reservation did not happen.
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("patient {0} not found")]
    PatientNotFound(String),

    #[error("slot {0} not found")]
    SlotNotFound(String),

    #[error("slot {0} is already booked")]
    AlreadyBooked(String),

    #[error("slot {0} has already started")]
    SlotStarted(String),

    #[error("doctor of slot {0} is not accepting appointments")]
    DoctorUnavailable(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ReserveError {
    fn from(err: sqlx::Error) -> Self {
        ReserveError::Db(DbError::from(err))
    }
}

/// Repository for appointments
pub trait AppointmentRepository {
    /// Create the `appointments` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Atomically mark the slot BOOKED and create its appointment.
    ///
    /// Of any number of concurrent calls for the same slot exactly one
    /// succeeds; the others observe the slot as booked.
    ///
    /// # Errors
    ///
    /// * [`ReserveError::PatientNotFound`] - unknown id or not a patient
    /// * [`ReserveError::SlotNotFound`] - no such slot, nothing written
    /// * [`ReserveError::AlreadyBooked`] - the slot was not OPEN
    /// * [`ReserveError::SlotStarted`] / [`ReserveError::DoctorUnavailable`]
    /// * [`ReserveError::Db`] - the store failed; the transaction is rolled back
    fn reserve_slot(
        &self,
        request: &ReservationRequest,
    ) -> impl std::future::Future<Output = Result<Appointment, ReserveError>> + Send;

    /// Find an appointment by id
    fn find_by_id(
        &self,
        appointment_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// Find the appointment booked on a slot
    fn find_by_slot(
        &self,
        slot_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// Load an appointment together with its slot, doctor and patient.
    fn find_details(
        &self,
        appointment_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AppointmentDetails>, DbError>> + Send;

    /// Appointments of a patient ordered by slot start.
    fn list_for_patient(
        &self,
        patient_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<AppointmentDetails>, DbError>> + Send;

    /// Appointments with a doctor ordered by slot start.
    fn list_for_doctor(
        &self,
        doctor_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<AppointmentDetails>, DbError>> + Send;
}
