#[cfg(test)]
mod tests {
    use crate::service::{is_gone, resolve_time_zone, to_google_event, GcalServiceError};
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::Tz;
    use clinic_common::services::{CalendarEvent, EventReminder};
    use serde_json::json;

    fn sample_event() -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2030, 1, 7, 10, 0, 0).unwrap();
        CalendarEvent {
            start_time: start,
            end_time: start + Duration::minutes(30),
            summary: "Appointment with Dr. Dana Doe".to_string(),
            description: Some("Reason: General Consultation".to_string()),
            attendees: vec!["doc@example.com".to_string()],
            reminders: vec![
                EventReminder {
                    method: "email".to_string(),
                    minutes: 1440,
                },
                EventReminder {
                    method: "popup".to_string(),
                    minutes: 30,
                },
            ],
        }
    }

    #[test]
    fn test_event_conversion_carries_attendees_and_reminders() {
        let event = sample_event();
        let google = to_google_event(&event, Tz::Europe__Zurich).unwrap();

        assert_eq!(google.summary.as_deref(), Some("Appointment with Dr. Dana Doe"));

        let start = google.start.unwrap();
        assert_eq!(start.date_time, Some(event.start_time));
        assert_eq!(start.time_zone.as_deref(), Some("Europe/Zurich"));
        assert_eq!(google.end.unwrap().date_time, Some(event.end_time));

        let attendees = google.attendees.unwrap();
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0].email.as_deref(), Some("doc@example.com"));

        let reminders = google.reminders.unwrap();
        assert_eq!(reminders.use_default, Some(false));
        let overrides = reminders.overrides.unwrap();
        assert_eq!(overrides[0].method.as_deref(), Some("email"));
        assert_eq!(overrides[0].minutes, Some(1440));
        assert_eq!(overrides[1].minutes, Some(30));
    }

    #[test]
    fn test_event_without_attendees_omits_the_field() {
        let mut event = sample_event();
        event.attendees.clear();

        let google = to_google_event(&event, Tz::UTC).unwrap();
        assert!(google.attendees.is_none());
    }

    #[test]
    fn test_event_with_inverted_times_is_rejected() {
        let mut event = sample_event();
        event.end_time = event.start_time;

        assert!(matches!(
            to_google_event(&event, Tz::UTC),
            Err(GcalServiceError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_resolve_time_zone() {
        assert_eq!(resolve_time_zone(None).unwrap(), Tz::UTC);
        assert_eq!(resolve_time_zone(Some("")).unwrap(), Tz::UTC);
        assert_eq!(
            resolve_time_zone(Some("America/New_York")).unwrap(),
            Tz::America__New_York
        );
        assert!(matches!(
            resolve_time_zone(Some("Mars/Olympus")),
            Err(GcalServiceError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_not_found_responses_count_as_gone() {
        let not_found =
            google_calendar3::Error::BadRequest(json!({"error": {"code": 404, "message": "Not Found"}}));
        let gone = google_calendar3::Error::BadRequest(json!({"error": {"code": 410}}));
        let forbidden = google_calendar3::Error::BadRequest(json!({"error": {"code": 403}}));

        assert!(is_gone(&not_found));
        assert!(is_gone(&gone));
        assert!(!is_gone(&forbidden));
        assert!(!is_gone(&google_calendar3::Error::Cancelled));
    }
}
