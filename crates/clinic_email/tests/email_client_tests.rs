use clinic_common::services::{EmailNotification, NotificationService};
use clinic_config::EmailConfig;
use clinic_email::{EmailError, HttpEmailService};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(mock_server: &MockServer) -> HttpEmailService {
    HttpEmailService::new(&EmailConfig {
        service_url: format!("{}/email", mock_server.uri()),
        timeout_secs: 2,
    })
    .expect("email service")
}

fn booking_confirmation() -> EmailNotification {
    EmailNotification::BookingConfirmation {
        to_email: "pat@example.com".to_string(),
        patient_email: "pat@example.com".to_string(),
        patient_name: "Pat One".to_string(),
        doctor_email: "doc@example.com".to_string(),
        doctor_name: "Dr. Dana Doe".to_string(),
        appointment_date: "Monday, January 07, 2030".to_string(),
        appointment_time: "10:00 AM - 10:30 AM".to_string(),
        reason: "General Consultation".to_string(),
    }
}

#[tokio::test]
async fn test_booking_confirmation_is_posted_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .and(header_exists("X-Request-Id"))
        .and(body_partial_json(json!({
            "action": "BOOKING_CONFIRMATION",
            "to_email": "pat@example.com",
            "doctor_name": "Dr. Dana Doe",
            "appointment_time": "10:00 AM - 10:30 AM",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .send_email(booking_confirmation())
        .await
        .unwrap();

    assert_eq!(result.status, "queued");
    assert!(!result.id.is_empty());
}

#[tokio::test]
async fn test_plain_success_body_reports_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .and(body_partial_json(json!({"action": "SIGNUP_WELCOME"})))
        .respond_with(ResponseTemplate::new(202).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .send_email(EmailNotification::SignupWelcome {
            to_email: "new@example.com".to_string(),
            user_name: "New User".to_string(),
            role: "patient".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.status, "sent");
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .send_email(booking_confirmation())
        .await
        .unwrap_err();

    match err {
        EmailError::ApiError { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_slow_email_function_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let service = HttpEmailService::new(&EmailConfig {
        service_url: format!("{}/email", mock_server.uri()),
        timeout_secs: 1,
    })
    .unwrap();

    let err = service.send_email(booking_confirmation()).await.unwrap_err();
    assert!(matches!(err, EmailError::RequestError(e) if e.is_timeout()));
}
