//! The booking guard.
//!
//! [`BookingGuard::attempt_book`] is the only way a slot becomes BOOKED. The
//! OPEN check and the reservation are a single store transaction (see
//! [`AppointmentRepository::reserve_slot`]), so of any number of concurrent
//! attempts on one slot, in this process or another one sharing the database,
//! exactly one is confirmed and every other one is rejected as
//! [`BookingRejection::AlreadyBooked`].

use crate::fulfillment::{FulfillmentDispatcher, FulfillmentTask};
use chrono::Utc;
use clinic_common::models::Appointment;
use clinic_common::ClinicError;
use clinic_db::{
    AppointmentRepository, DbClient, ReservationRequest, ReserveError, SqlAppointmentRepository,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Message returned to a patient who lost the race for a slot.
pub const SLOT_TAKEN_MESSAGE: &str = "slot no longer available, please choose another";

/// A patient's request for a slot.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub slot_id: String,
    pub patient_id: String,
    pub reason: Option<String>,
}

/// Why a booking attempt was rejected. All variants are recoverable by the
/// caller; none of them leaves a partial write behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingRejection {
    /// The slot or the patient does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Someone else booked the slot first.
    #[error("slot {0} is already booked")]
    AlreadyBooked(String),

    /// Any other precondition failed: the slot already started, the doctor
    /// stopped accepting appointments, or the store failed or timed out.
    #[error("{0}")]
    InvalidState(String),
}

impl From<ReserveError> for BookingRejection {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::PatientNotFound(id) => {
                BookingRejection::NotFound(format!("patient {id} not found"))
            }
            ReserveError::SlotNotFound(id) => {
                BookingRejection::NotFound(format!("slot {id} not found"))
            }
            ReserveError::AlreadyBooked(id) => BookingRejection::AlreadyBooked(id),
            ReserveError::SlotStarted(id) => {
                BookingRejection::InvalidState(format!("slot {id} has already started"))
            }
            ReserveError::DoctorUnavailable(id) => BookingRejection::InvalidState(format!(
                "the doctor for slot {id} is not accepting appointments"
            )),
            ReserveError::Db(e) => {
                error!("Store failure while booking: {}", e);
                BookingRejection::InvalidState("booking could not be completed".to_string())
            }
        }
    }
}

impl From<BookingRejection> for ClinicError {
    fn from(rejection: BookingRejection) -> Self {
        match rejection {
            BookingRejection::NotFound(msg) => ClinicError::NotFoundError(msg),
            BookingRejection::AlreadyBooked(_) => {
                ClinicError::ConflictError(SLOT_TAKEN_MESSAGE.to_string())
            }
            BookingRejection::InvalidState(msg) => ClinicError::InvalidStateError(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingGuard {
    appointments: SqlAppointmentRepository,
    dispatcher: FulfillmentDispatcher,
    statement_timeout: Duration,
}

impl BookingGuard {
    pub fn new(
        db_client: DbClient,
        dispatcher: FulfillmentDispatcher,
        statement_timeout: Duration,
    ) -> Self {
        Self {
            appointments: SqlAppointmentRepository::new(db_client),
            dispatcher,
            statement_timeout,
        }
    }

    /// Try to book `request.slot_id` for `request.patient_id`.
    ///
    /// On success the appointment is committed before calendar sync and the
    /// confirmation email are queued; their outcome never affects the result.
    /// There are no internal retries.
    pub async fn attempt_book(
        &self,
        request: BookingRequest,
    ) -> Result<Appointment, BookingRejection> {
        let reservation = ReservationRequest {
            slot_id: request.slot_id,
            patient_id: request.patient_id,
            reason: request.reason.unwrap_or_default().trim().to_string(),
            requested_at: Utc::now(),
        };

        let outcome = tokio::time::timeout(
            self.statement_timeout,
            self.appointments.reserve_slot(&reservation),
        )
        .await;

        let appointment = match outcome {
            Ok(Ok(appointment)) => appointment,
            Ok(Err(e)) => {
                let rejection = BookingRejection::from(e);
                match &rejection {
                    BookingRejection::AlreadyBooked(_) => info!(
                        "Slot {} already booked, rejecting patient {}",
                        reservation.slot_id, reservation.patient_id
                    ),
                    other => warn!(
                        "Booking of slot {} for patient {} rejected: {}",
                        reservation.slot_id, reservation.patient_id, other
                    ),
                }
                return Err(rejection);
            }
            Err(_) => {
                warn!(
                    "Booking of slot {} timed out after {:?}",
                    reservation.slot_id, self.statement_timeout
                );
                self.recover_timed_out(&reservation).await?
            }
        };

        info!(
            "Confirmed appointment {} on slot {} for patient {}",
            appointment.id, appointment.slot_id, appointment.patient_id
        );
        self.dispatcher
            .dispatch_all(FulfillmentTask::for_booking(&appointment.id));

        Ok(appointment)
    }

    /// A timeout may fire after the commit went through. Re-read the slot and
    /// treat the attempt as confirmed if this patient holds it.
    async fn recover_timed_out(
        &self,
        reservation: &ReservationRequest,
    ) -> Result<Appointment, BookingRejection> {
        let timed_out =
            || BookingRejection::InvalidState("booking timed out, please try again".to_string());

        let lookup = tokio::time::timeout(
            self.statement_timeout,
            self.appointments.find_by_slot(&reservation.slot_id),
        )
        .await;

        match lookup {
            Ok(Ok(Some(appointment))) if appointment.patient_id == reservation.patient_id => {
                info!(
                    "Booking of slot {} committed before the timeout fired",
                    reservation.slot_id
                );
                Ok(appointment)
            }
            Ok(Ok(_)) => Err(timed_out()),
            Ok(Err(e)) => {
                error!(
                    "Could not re-read slot {} after timeout: {}",
                    reservation.slot_id, e
                );
                Err(timed_out())
            }
            Err(_) => Err(timed_out()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_common::HttpStatusCode;

    #[test]
    fn test_reserve_errors_collapse_into_three_rejections() {
        assert!(matches!(
            BookingRejection::from(ReserveError::SlotNotFound("S999".into())),
            BookingRejection::NotFound(_)
        ));
        assert!(matches!(
            BookingRejection::from(ReserveError::PatientNotFound("P9".into())),
            BookingRejection::NotFound(_)
        ));
        assert_eq!(
            BookingRejection::from(ReserveError::AlreadyBooked("S101".into())),
            BookingRejection::AlreadyBooked("S101".into())
        );
        assert!(matches!(
            BookingRejection::from(ReserveError::SlotStarted("S1".into())),
            BookingRejection::InvalidState(_)
        ));
        assert!(matches!(
            BookingRejection::from(ReserveError::DoctorUnavailable("S1".into())),
            BookingRejection::InvalidState(_)
        ));
        assert!(matches!(
            BookingRejection::from(ReserveError::Db(clinic_db::DbError::QueryError(
                "disk I/O".into()
            ))),
            BookingRejection::InvalidState(_)
        ));
    }

    async fn guard_with_booked_slot() -> (
        tempfile::TempDir,
        BookingGuard,
        tokio::sync::mpsc::Receiver<FulfillmentTask>,
        Appointment,
    ) {
        use clinic_common::models::{NewUser, UserRole};
        use clinic_db::{SlotRepository, SqlSlotRepository, SqlUserRepository, UserRepository};

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("clinic.db").display());
        let db = DbClient::from_url(&url).await.unwrap();
        clinic_db::init_schema(&db).await.unwrap();

        let users = SqlUserRepository::new(db.clone());
        let new_user = |email: &str, role| NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            calendar_id: None,
        };
        let d1 = users
            .create_user(new_user("d1@example.com", UserRole::Doctor))
            .await
            .unwrap();
        let p1 = users
            .create_user(new_user("p1@example.com", UserRole::Patient))
            .await
            .unwrap();

        let starts_at = Utc::now() + chrono::Duration::days(1);
        let slot = SqlSlotRepository::new(db.clone())
            .insert_slot(&d1.id, starts_at, starts_at + chrono::Duration::minutes(30))
            .await
            .unwrap()
            .unwrap();

        let appointment = SqlAppointmentRepository::new(db.clone())
            .reserve_slot(&ReservationRequest {
                slot_id: slot.id,
                patient_id: p1.id,
                reason: String::new(),
                requested_at: Utc::now(),
            })
            .await
            .unwrap();

        let (dispatcher, receiver) = FulfillmentDispatcher::channel(8);
        let guard = BookingGuard::new(db, dispatcher, Duration::from_secs(5));
        (dir, guard, receiver, appointment)
    }

    fn reservation_for(appointment: &Appointment, patient_id: &str) -> ReservationRequest {
        ReservationRequest {
            slot_id: appointment.slot_id.clone(),
            patient_id: patient_id.to_string(),
            reason: String::new(),
            requested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_timeout_after_commit_is_still_confirmed() {
        let (_dir, guard, _receiver, booked) = guard_with_booked_slot().await;

        let recovered = guard
            .recover_timed_out(&reservation_for(&booked, &booked.patient_id))
            .await
            .unwrap();
        assert_eq!(recovered, booked);
    }

    #[tokio::test]
    async fn test_timeout_on_someone_elses_slot_stays_invalid_state() {
        let (_dir, guard, mut receiver, booked) = guard_with_booked_slot().await;

        let outcome = guard
            .recover_timed_out(&reservation_for(&booked, "another-patient"))
            .await;
        assert!(matches!(outcome, Err(BookingRejection::InvalidState(_))));

        let mut unbooked = booked.clone();
        unbooked.slot_id = "S999".to_string();
        let outcome = guard
            .recover_timed_out(&reservation_for(&unbooked, &booked.patient_id))
            .await;
        assert!(matches!(outcome, Err(BookingRejection::InvalidState(_))));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_rejections_map_to_http_statuses() {
        let taken: ClinicError = BookingRejection::AlreadyBooked("S101".into()).into();
        assert_eq!(taken.status_code(), 409);
        assert!(taken.to_string().contains(SLOT_TAKEN_MESSAGE));

        let missing: ClinicError = BookingRejection::NotFound("slot S999 not found".into()).into();
        assert_eq!(missing.status_code(), 404);

        let invalid: ClinicError = BookingRejection::InvalidState("late".into()).into();
        assert_eq!(invalid.status_code(), 422);
    }
}
