//! Calendar events and email payloads derived from an appointment.

use chrono::DateTime;
use chrono_tz::Tz;
use clinic_common::models::{AppointmentDetails, CalendarOwner, User};
use clinic_common::services::{CalendarEvent, EmailNotification, EventReminder};

/// Reason shown when the patient did not give one.
pub const DEFAULT_REASON: &str = "General Consultation";

const EMAIL_REMINDER_MINUTES: i32 = 24 * 60;
const POPUP_REMINDER_MINUTES: i32 = 30;

pub fn display_reason(reason: &str) -> &str {
    let reason = reason.trim();
    if reason.is_empty() {
        DEFAULT_REASON
    } else {
        reason
    }
}

pub fn doctor_display_name(doctor: &User) -> String {
    format!("Dr. {}", doctor.full_name())
}

/// The event written to `owner`'s calendar. The other party is the attendee.
pub fn appointment_event(details: &AppointmentDetails, owner: CalendarOwner) -> CalendarEvent {
    let (summary, counterpart_label, counterpart_name, attendee) = match owner {
        CalendarOwner::Doctor => (
            format!("Appointment with {}", details.patient.full_name()),
            "Patient",
            details.patient.full_name(),
            details.patient.email.clone(),
        ),
        CalendarOwner::Patient => (
            format!("Appointment with {}", doctor_display_name(&details.doctor)),
            "Doctor",
            doctor_display_name(&details.doctor),
            details.doctor.email.clone(),
        ),
    };

    let description = format!(
        "Clinic appointment\n\n{}: {}\nReason: {}",
        counterpart_label,
        counterpart_name,
        display_reason(&details.appointment.reason)
    );

    CalendarEvent {
        start_time: details.slot.starts_at,
        end_time: details.slot.ends_at,
        summary,
        description: Some(description),
        attendees: vec![attendee],
        reminders: vec![
            EventReminder {
                method: "email".to_string(),
                minutes: EMAIL_REMINDER_MINUTES,
            },
            EventReminder {
                method: "popup".to_string(),
                minutes: POPUP_REMINDER_MINUTES,
            },
        ],
    }
}

/// Confirmation sent to the patient, with times rendered in the clinic zone.
pub fn booking_confirmation(details: &AppointmentDetails, time_zone: Tz) -> EmailNotification {
    let starts_at = details.slot.starts_at.with_timezone(&time_zone);
    let ends_at = details.slot.ends_at.with_timezone(&time_zone);

    EmailNotification::BookingConfirmation {
        to_email: details.patient.email.clone(),
        patient_email: details.patient.email.clone(),
        patient_name: details.patient.full_name(),
        doctor_email: details.doctor.email.clone(),
        doctor_name: doctor_display_name(&details.doctor),
        appointment_date: starts_at.format("%A, %B %d, %Y").to_string(),
        appointment_time: format!("{} - {}", clock_time(&starts_at), clock_time(&ends_at)),
        reason: display_reason(&details.appointment.reason).to_string(),
    }
}

pub fn welcome_email(user: &User) -> EmailNotification {
    EmailNotification::SignupWelcome {
        to_email: user.email.clone(),
        user_name: user.full_name(),
        role: user.role.as_str().to_string(),
    }
}

fn clock_time(at: &DateTime<Tz>) -> String {
    at.format("%I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clinic_common::models::{Appointment, Slot, SlotStatus, UserRole};

    fn user(id: &str, first: &str, last: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role,
            calendar_id: None,
            accepting_appointments: true,
            created_at: Utc.with_ymd_and_hms(2029, 12, 1, 0, 0, 0).unwrap(),
        }
    }

    fn details(reason: &str) -> AppointmentDetails {
        let starts_at = Utc.with_ymd_and_hms(2030, 1, 7, 15, 0, 0).unwrap();
        AppointmentDetails {
            appointment: Appointment {
                id: "A1".to_string(),
                slot_id: "S101".to_string(),
                patient_id: "P1".to_string(),
                reason: reason.to_string(),
                created_at: starts_at,
            },
            slot: Slot {
                id: "S101".to_string(),
                doctor_id: "D1".to_string(),
                starts_at,
                ends_at: starts_at + chrono::Duration::minutes(30),
                status: SlotStatus::Booked,
                created_at: starts_at,
                updated_at: starts_at,
            },
            doctor: user("D1", "Dana", "Doe", UserRole::Doctor),
            patient: user("P1", "Pat", "One", UserRole::Patient),
        }
    }

    #[test]
    fn test_doctor_event_names_patient_and_invites_them() {
        let event = appointment_event(&details("Back pain"), CalendarOwner::Doctor);

        assert_eq!(event.summary, "Appointment with Pat One");
        assert_eq!(event.attendees, vec!["pat@example.com".to_string()]);
        let description = event.description.unwrap();
        assert!(description.contains("Patient: Pat One"));
        assert!(description.contains("Reason: Back pain"));
        assert_eq!(event.reminders[0].minutes, 1440);
        assert_eq!(event.reminders[1].method, "popup");
        assert_eq!(event.reminders[1].minutes, 30);
    }

    #[test]
    fn test_patient_event_names_doctor() {
        let event = appointment_event(&details(""), CalendarOwner::Patient);

        assert_eq!(event.summary, "Appointment with Dr. Dana Doe");
        assert_eq!(event.attendees, vec!["dana@example.com".to_string()]);
        assert!(event
            .description
            .unwrap()
            .contains("Reason: General Consultation"));
    }

    #[test]
    fn test_booking_confirmation_renders_clinic_local_time() {
        let email = booking_confirmation(&details("  "), chrono_tz::America::New_York);

        match email {
            EmailNotification::BookingConfirmation {
                to_email,
                doctor_name,
                appointment_date,
                appointment_time,
                reason,
                ..
            } => {
                assert_eq!(to_email, "pat@example.com");
                assert_eq!(doctor_name, "Dr. Dana Doe");
                assert_eq!(appointment_date, "Monday, January 07, 2030");
                assert_eq!(appointment_time, "10:00 AM - 10:30 AM");
                assert_eq!(reason, DEFAULT_REASON);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_welcome_email_carries_role() {
        let doctor = user("D1", "Dana", "Doe", UserRole::Doctor);
        assert_eq!(
            welcome_email(&doctor),
            EmailNotification::SignupWelcome {
                to_email: "dana@example.com".to_string(),
                user_name: "Dana Doe".to_string(),
                role: "doctor".to_string(),
            }
        );
    }
}
