//! Calendar event ids written by calendar sync.
//!
//! Kept apart from `appointments` so that a confirmed appointment row is
//! never updated after the booking transaction.

use crate::error::DbError;
use clinic_common::models::{CalendarEventLink, CalendarOwner};

pub trait CalendarEventRepository {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Remember the event created for one side of an appointment.
    ///
    /// # Returns
    ///
    /// `false` if an event was already recorded for that appointment and owner
    fn record_event(
        &self,
        link: &CalendarEventLink,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    fn find_event(
        &self,
        appointment_id: &str,
        owner: CalendarOwner,
    ) -> impl std::future::Future<Output = Result<Option<CalendarEventLink>, DbError>> + Send;

    fn list_for_appointment(
        &self,
        appointment_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CalendarEventLink>, DbError>> + Send;
}
