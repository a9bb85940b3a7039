#![cfg(feature = "openapi")]

use crate::handlers::{
    AppointmentDetailsResponse, AppointmentResponse, BookSlotRequest, BulkCreateSlotsRequest,
    CreateSlotRequest, HealthResponse, RegisterUserRequest, SetAcceptingRequest, SlotResponse,
    UserResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler,
        crate::handlers::register_user_handler,
        crate::handlers::list_doctors_handler,
        crate::handlers::set_accepting_handler,
        crate::handlers::list_slots_handler,
        crate::handlers::create_slot_handler,
        crate::handlers::bulk_create_slots_handler,
        crate::handlers::delete_slot_handler,
        crate::handlers::book_slot_handler,
        crate::handlers::get_appointment_handler,
        crate::handlers::list_patient_appointments_handler,
        crate::handlers::list_doctor_appointments_handler,
    ),
    components(schemas(
        HealthResponse,
        RegisterUserRequest,
        UserResponse,
        SetAcceptingRequest,
        CreateSlotRequest,
        BulkCreateSlotsRequest,
        SlotResponse,
        BookSlotRequest,
        AppointmentResponse,
        AppointmentDetailsResponse,
    )),
    tags(
        (name = "Clinic", description = "Service health"),
        (name = "Accounts", description = "Doctor and patient accounts"),
        (name = "Slots", description = "Doctor availability slots"),
        (name = "Booking", description = "Booking guard and appointments")
    )
)]
pub struct BookingApiDoc;
