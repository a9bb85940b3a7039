//! Domain models shared between the store, the booking logic and the
//! external integrations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Patient,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Doctor => "doctor",
            UserRole::Patient => "patient",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(UserRole::Doctor),
            "patient" => Ok(UserRole::Patient),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// Google calendar of the user. `None` means calendar sync is not connected.
    pub calendar_id: Option<String>,
    pub accepting_appointments: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_calendar_connected(&self) -> bool {
        self.calendar_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn is_doctor(&self) -> bool {
        self.role == UserRole::Doctor
    }
}

/// Input for creating a user. The id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Open,
    Booked,
}

impl SlotStatus {
    /// Column value in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Open => "open",
            SlotStatus::Booked => "booked",
        }
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SlotStatus::Open),
            "booked" => Ok(SlotStatus::Booked),
            other => Err(format!("unknown slot status: {other}")),
        }
    }
}

/// A bookable interval published by a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub doctor_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Open
    }

    pub fn is_in_future(&self, now: DateTime<Utc>) -> bool {
        self.starts_at > now
    }

    pub fn duration(&self) -> Duration {
        self.ends_at - self.starts_at
    }

    /// Half-open interval overlap: touching slots do not overlap.
    pub fn overlaps(&self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> bool {
        intervals_overlap(self.starts_at, self.ends_at, starts_at, ends_at)
    }
}

pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// The record of a patient claiming a slot. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub slot_id: String,
    pub patient_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// An appointment joined with everything needed to present or fulfil it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub slot: Slot,
    pub doctor: User,
    pub patient: User,
}

/// Whose calendar an event was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarOwner {
    Doctor,
    Patient,
}

impl CalendarOwner {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarOwner::Doctor => "doctor",
            CalendarOwner::Patient => "patient",
        }
    }
}

impl FromStr for CalendarOwner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(CalendarOwner::Doctor),
            "patient" => Ok(CalendarOwner::Patient),
            other => Err(format!("unknown calendar owner: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventLink {
    pub appointment_id: String,
    pub owner: CalendarOwner,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
}
