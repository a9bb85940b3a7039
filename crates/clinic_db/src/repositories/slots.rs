//! Repository for availability slots

use crate::error::DbError;
use chrono::{DateTime, Utc};
use clinic_common::models::Slot;

/// Which slots of a doctor to list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotFilter {
    /// Only slots with status OPEN.
    pub open_only: bool,
    /// Only slots starting strictly after this instant.
    pub starting_after: Option<DateTime<Utc>>,
}

impl SlotFilter {
    pub fn open_after(now: DateTime<Utc>) -> Self {
        Self {
            open_only: true,
            starting_after: Some(now),
        }
    }
}

/// Outcome of a conditional slot delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDeletion {
    Deleted,
    /// No slot with that id belongs to the doctor.
    NotFound,
    /// The slot exists but has been booked and must be kept.
    Booked,
}

/// Repository for availability slots
///
/// Status changes are not exposed here: the only OPEN→BOOKED transition goes
/// through [`crate::AppointmentRepository::reserve_slot`].
pub trait SlotRepository {
    /// Create the `availability_slots` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert an OPEN slot unless it overlaps an existing slot of the same doctor.
    ///
    /// The overlap check and the insert are a single statement.
    ///
    /// # Returns
    ///
    /// The stored slot, or `None` if it overlaps or duplicates an existing one
    fn insert_slot(
        &self,
        doctor_id: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Slot>, DbError>> + Send;

    /// Find a slot by id
    fn find_by_id(
        &self,
        slot_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Slot>, DbError>> + Send;

    /// List the slots of a doctor ordered by start time.
    fn list_for_doctor(
        &self,
        doctor_id: &str,
        filter: SlotFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Slot>, DbError>> + Send;

    /// Delete a slot of the doctor if, and only if, it is still OPEN.
    fn delete_open_slot(
        &self,
        doctor_id: &str,
        slot_id: &str,
    ) -> impl std::future::Future<Output = Result<SlotDeletion, DbError>> + Send;
}
