//! Availability slot management for doctors.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;
use clinic_common::models::{Slot, User};
use clinic_common::{conflict, not_found, validation_error, ClinicError};
use clinic_db::{
    DbClient, SlotDeletion, SlotFilter, SlotRepository, SqlSlotRepository, SqlUserRepository,
    UserRepository,
};
use tracing::{debug, info};

/// Slot lengths a doctor can pick for bulk creation.
pub const ALLOWED_DURATIONS_MINUTES: [i64; 4] = [15, 30, 45, 60];

/// A working window on one day, in clinic local time.
#[derive(Debug, Clone)]
pub struct BulkSlotRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
}

/// Cut `[window_start, window_end)` into consecutive slots of `length`.
/// A trailing remainder shorter than `length` is dropped.
pub fn split_into_slots(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    length: Duration,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut slots = Vec::new();
    if length <= Duration::zero() {
        return slots;
    }

    let mut start = window_start;
    while start + length <= window_end {
        slots.push((start, start + length));
        start += length;
    }
    slots
}

fn local_to_utc(time_zone: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, ClinicError> {
    time_zone
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| validation_error(format!("{date} {time} does not exist in {time_zone}")))
}

#[derive(Debug, Clone)]
pub struct SlotService {
    users: SqlUserRepository,
    slots: SqlSlotRepository,
    time_zone: Tz,
}

impl SlotService {
    pub fn new(db_client: DbClient, time_zone: Tz) -> Self {
        Self {
            users: SqlUserRepository::new(db_client.clone()),
            slots: SqlSlotRepository::new(db_client),
            time_zone,
        }
    }

    async fn require_doctor(&self, doctor_id: &str) -> Result<User, ClinicError> {
        match self.users.find_by_id(doctor_id).await? {
            Some(user) if user.is_doctor() => Ok(user),
            _ => Err(not_found(format!("doctor {doctor_id} not found"))),
        }
    }

    /// Publish one slot. It must lie in the future and not overlap any other
    /// slot of the same doctor.
    pub async fn create_slot(
        &self,
        doctor_id: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Slot, ClinicError> {
        let starts_at = starts_at.trunc_subsecs(0);
        let ends_at = ends_at.trunc_subsecs(0);

        if ends_at <= starts_at {
            return Err(validation_error("end time must be after start time"));
        }
        if starts_at <= Utc::now() {
            return Err(validation_error("slots must start in the future"));
        }

        self.require_doctor(doctor_id).await?;

        let slot = self
            .slots
            .insert_slot(doctor_id, starts_at, ends_at)
            .await?
            .ok_or_else(|| conflict("slot overlaps an existing slot"))?;

        info!("Doctor {} published slot {}", doctor_id, slot.id);
        Ok(slot)
    }

    /// Publish consecutive slots covering a local working window. Slots that
    /// would overlap existing ones are skipped; the created slots are returned.
    pub async fn bulk_create_slots(
        &self,
        doctor_id: &str,
        request: &BulkSlotRequest,
    ) -> Result<Vec<Slot>, ClinicError> {
        if !ALLOWED_DURATIONS_MINUTES.contains(&request.duration_minutes) {
            return Err(validation_error(format!(
                "duration must be one of {ALLOWED_DURATIONS_MINUTES:?} minutes"
            )));
        }
        if request.start_time >= request.end_time {
            return Err(validation_error("end time must be after start time"));
        }
        let today = Utc::now().with_timezone(&self.time_zone).date_naive();
        if request.date < today {
            return Err(validation_error("cannot create slots for a past date"));
        }

        self.require_doctor(doctor_id).await?;

        let window_start = local_to_utc(self.time_zone, request.date, request.start_time)?;
        let window_end = local_to_utc(self.time_zone, request.date, request.end_time)?;
        let now = Utc::now();

        let mut created = Vec::new();
        for (starts_at, ends_at) in split_into_slots(
            window_start,
            window_end,
            Duration::minutes(request.duration_minutes),
        ) {
            if starts_at <= now {
                continue;
            }
            match self.slots.insert_slot(doctor_id, starts_at, ends_at).await? {
                Some(slot) => created.push(slot),
                None => debug!("Skipping overlapping slot {} - {}", starts_at, ends_at),
            }
        }

        info!(
            "Doctor {} published {} slot(s) on {}",
            doctor_id,
            created.len(),
            request.date
        );
        Ok(created)
    }

    /// Remove an OPEN slot. Booked slots stay, together with their appointment.
    pub async fn delete_slot(&self, doctor_id: &str, slot_id: &str) -> Result<(), ClinicError> {
        match self.slots.delete_open_slot(doctor_id, slot_id).await? {
            SlotDeletion::Deleted => {
                info!("Doctor {} deleted slot {}", doctor_id, slot_id);
                Ok(())
            }
            SlotDeletion::Booked => Err(conflict(format!(
                "slot {slot_id} is booked and cannot be deleted"
            ))),
            SlotDeletion::NotFound => Err(not_found(format!("slot {slot_id} not found"))),
        }
    }

    /// Future OPEN slots of a doctor, earliest first.
    pub async fn list_open_slots(&self, doctor_id: &str) -> Result<Vec<Slot>, ClinicError> {
        self.require_doctor(doctor_id).await?;
        Ok(self
            .slots
            .list_for_doctor(doctor_id, SlotFilter::open_after(Utc::now()))
            .await?)
    }

    pub async fn list_doctor_slots(&self, doctor_id: &str) -> Result<Vec<Slot>, ClinicError> {
        self.require_doctor(doctor_id).await?;
        Ok(self
            .slots
            .list_for_doctor(doctor_id, SlotFilter::default())
            .await?)
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }
}
