// File: crates/clinic_booking/src/handlers.rs
use crate::guard::BookingRequest;
use crate::slots::BulkSlotRequest;
use crate::state::BookingState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use clinic_common::models::{Appointment, AppointmentDetails, NewUser, Slot, User, UserRole};
use clinic_common::{validation_error, ClinicError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// --- Request / response bodies ---

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterUserRequest {
    #[cfg_attr(feature = "openapi", schema(example = "pat@example.com"))]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// "doctor" or "patient"
    #[cfg_attr(feature = "openapi", schema(example = "patient"))]
    pub role: String,
    /// Google calendar id used for appointment sync.
    pub calendar_id: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub calendar_connected: bool,
    pub accepting_appointments: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetAcceptingRequest {
    pub accepting: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SlotListQuery {
    /// Include booked and past slots.
    pub all: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateSlotRequest {
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07T10:00:00Z"))]
    pub starts_at: String,
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07T10:30:00Z"))]
    pub ends_at: String,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkCreateSlotsRequest {
    /// Day in the clinic time zone.
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07"))]
    pub date: String,
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub start_time: String,
    #[cfg_attr(feature = "openapi", schema(example = "12:00"))]
    pub end_time: String,
    /// 15, 30, 45 or 60
    #[cfg_attr(feature = "openapi", schema(example = 30))]
    pub duration_minutes: i64,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotResponse {
    pub id: String,
    pub doctor_id: String,
    pub starts_at: String,
    pub ends_at: String,
    /// "OPEN" or "BOOKED"
    pub status: String,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookSlotRequest {
    pub patient_id: String,
    #[cfg_attr(feature = "openapi", schema(example = "Follow-up"))]
    pub reason: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppointmentResponse {
    pub id: String,
    pub slot_id: String,
    pub patient_id: String,
    pub reason: String,
    pub created_at: String,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppointmentDetailsResponse {
    pub id: String,
    pub reason: String,
    pub created_at: String,
    pub slot: SlotResponse,
    pub doctor: UserResponse,
    pub patient: UserResponse,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            calendar_connected: user.has_calendar_connected(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role.as_str().to_string(),
            accepting_appointments: user.accepting_appointments,
        }
    }
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id,
            doctor_id: slot.doctor_id,
            starts_at: timestamp(slot.starts_at),
            ends_at: timestamp(slot.ends_at),
            status: slot.status.as_str().to_uppercase(),
        }
    }
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            slot_id: appointment.slot_id,
            patient_id: appointment.patient_id,
            reason: appointment.reason,
            created_at: timestamp(appointment.created_at),
        }
    }
}

impl From<AppointmentDetails> for AppointmentDetailsResponse {
    fn from(details: AppointmentDetails) -> Self {
        Self {
            id: details.appointment.id,
            reason: details.appointment.reason,
            created_at: timestamp(details.appointment.created_at),
            slot: details.slot.into(),
            doctor: details.doctor.into(),
            patient: details.patient.into(),
        }
    }
}

fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, ClinicError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| validation_error(format!("{field} must be an RFC 3339 timestamp")))
}

fn parse_clock(field: &str, value: &str) -> Result<NaiveTime, ClinicError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| validation_error(format!("{field} must use HH:MM")))
}

// --- Handlers ---

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Clinic"
))]
pub async fn health_handler(
    State(state): State<Arc<BookingState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db_client.is_healthy().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" }.to_string(),
            database,
        }),
    )
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid name, email or role"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Accounts"
))]
pub async fn register_user_handler(
    State(state): State<Arc<BookingState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ClinicError> {
    let role = payload
        .role
        .parse::<UserRole>()
        .map_err(validation_error)?;

    let user = state
        .accounts
        .register_user(NewUser {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role,
            calendar_id: payload.calendar_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/doctors",
    responses(
        (status = 200, description = "Doctors accepting appointments", body = [UserResponse])
    ),
    tag = "Accounts"
))]
pub async fn list_doctors_handler(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Vec<UserResponse>>, ClinicError> {
    let doctors = state.accounts.list_doctors().await?;
    Ok(Json(doctors.into_iter().map(Into::into).collect()))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/doctors/{doctor_id}/accepting",
    params(("doctor_id" = String, Path, description = "Doctor id")),
    request_body = SetAcceptingRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Doctor not found")
    ),
    tag = "Accounts"
))]
pub async fn set_accepting_handler(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
    Json(payload): Json<SetAcceptingRequest>,
) -> Result<StatusCode, ClinicError> {
    state
        .accounts
        .set_accepting_appointments(&doctor_id, payload.accepting)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/doctors/{doctor_id}/slots",
    params(("doctor_id" = String, Path, description = "Doctor id"), SlotListQuery),
    responses(
        (status = 200, description = "Slots ordered by start", body = [SlotResponse]),
        (status = 404, description = "Doctor not found")
    ),
    tag = "Slots"
))]
pub async fn list_slots_handler(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotListQuery>,
) -> Result<Json<Vec<SlotResponse>>, ClinicError> {
    let slots = if query.all.unwrap_or(false) {
        state.slots.list_doctor_slots(&doctor_id).await?
    } else {
        state.slots.list_open_slots(&doctor_id).await?
    };
    Ok(Json(slots.into_iter().map(Into::into).collect()))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/doctors/{doctor_id}/slots",
    params(("doctor_id" = String, Path, description = "Doctor id")),
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot published", body = SlotResponse),
        (status = 400, description = "Invalid or past interval"),
        (status = 404, description = "Doctor not found"),
        (status = 409, description = "Overlaps an existing slot")
    ),
    tag = "Slots"
))]
pub async fn create_slot_handler(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
    Json(payload): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotResponse>), ClinicError> {
    let starts_at = parse_instant("starts_at", &payload.starts_at)?;
    let ends_at = parse_instant("ends_at", &payload.ends_at)?;

    let slot = state
        .slots
        .create_slot(&doctor_id, starts_at, ends_at)
        .await?;
    Ok((StatusCode::CREATED, Json(slot.into())))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/doctors/{doctor_id}/slots/bulk",
    params(("doctor_id" = String, Path, description = "Doctor id")),
    request_body = BulkCreateSlotsRequest,
    responses(
        (status = 201, description = "Slots created; overlapping ones skipped", body = [SlotResponse]),
        (status = 400, description = "Invalid window or duration"),
        (status = 404, description = "Doctor not found")
    ),
    tag = "Slots"
))]
pub async fn bulk_create_slots_handler(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
    Json(payload): Json<BulkCreateSlotsRequest>,
) -> Result<(StatusCode, Json<Vec<SlotResponse>>), ClinicError> {
    let request = BulkSlotRequest {
        date: NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d")
            .map_err(|_| validation_error("date must use YYYY-MM-DD"))?,
        start_time: parse_clock("start_time", &payload.start_time)?,
        end_time: parse_clock("end_time", &payload.end_time)?,
        duration_minutes: payload.duration_minutes,
    };

    let slots = state.slots.bulk_create_slots(&doctor_id, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(slots.into_iter().map(Into::into).collect()),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/doctors/{doctor_id}/slots/{slot_id}",
    params(
        ("doctor_id" = String, Path, description = "Doctor id"),
        ("slot_id" = String, Path, description = "Slot id")
    ),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "No such slot for this doctor"),
        (status = 409, description = "Slot is booked")
    ),
    tag = "Slots"
))]
pub async fn delete_slot_handler(
    State(state): State<Arc<BookingState>>,
    Path((doctor_id, slot_id)): Path<(String, String)>,
) -> Result<StatusCode, ClinicError> {
    state.slots.delete_slot(&doctor_id, &slot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Book a slot for a patient.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/slots/{slot_id}/book",
    params(("slot_id" = String, Path, description = "Slot id")),
    request_body(content = BookSlotRequest, example = json!({
        "patient_id": "7d3f5c1e-0000-4000-8000-000000000001",
        "reason": "Follow-up"
    })),
    responses(
        (status = 201, description = "Appointment confirmed", body = AppointmentResponse),
        (status = 404, description = "Slot or patient not found"),
        (status = 409, description = "Slot no longer available, please choose another"),
        (status = 422, description = "Slot started, doctor unavailable or booking timed out")
    ),
    tag = "Booking"
))]
pub async fn book_slot_handler(
    State(state): State<Arc<BookingState>>,
    Path(slot_id): Path<String>,
    Json(payload): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ClinicError> {
    let appointment = state
        .guard
        .attempt_book(BookingRequest {
            slot_id,
            patient_id: payload.patient_id,
            reason: payload.reason,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/appointments/{appointment_id}",
    params(("appointment_id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment with slot, doctor and patient", body = AppointmentDetailsResponse),
        (status = 404, description = "Appointment not found")
    ),
    tag = "Booking"
))]
pub async fn get_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<AppointmentDetailsResponse>, ClinicError> {
    let details = state.appointments.get_appointment(&appointment_id).await?;
    Ok(Json(details.into()))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/patients/{patient_id}/appointments",
    params(("patient_id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Appointments ordered by slot start", body = [AppointmentDetailsResponse]),
        (status = 404, description = "Patient not found")
    ),
    tag = "Booking"
))]
pub async fn list_patient_appointments_handler(
    State(state): State<Arc<BookingState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<AppointmentDetailsResponse>>, ClinicError> {
    let appointments = state
        .appointments
        .list_patient_appointments(&patient_id)
        .await?;
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/doctors/{doctor_id}/appointments",
    params(("doctor_id" = String, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Appointments ordered by slot start", body = [AppointmentDetailsResponse]),
        (status = 404, description = "Doctor not found")
    ),
    tag = "Booking"
))]
pub async fn list_doctor_appointments_handler(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Vec<AppointmentDetailsResponse>>, ClinicError> {
    let appointments = state
        .appointments
        .list_doctor_appointments(&doctor_id)
        .await?;
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}
