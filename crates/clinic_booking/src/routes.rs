use crate::handlers::{
    book_slot_handler, bulk_create_slots_handler, create_slot_handler, delete_slot_handler,
    get_appointment_handler, health_handler, list_doctor_appointments_handler,
    list_doctors_handler, list_patient_appointments_handler, list_slots_handler,
    register_user_handler, set_accepting_handler,
};
use crate::state::BookingState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all booking routes. Nest it under `/api`.
pub fn routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/users", post(register_user_handler))
        .route("/doctors", get(list_doctors_handler))
        .route("/doctors/{doctor_id}/accepting", put(set_accepting_handler))
        .route(
            "/doctors/{doctor_id}/slots",
            get(list_slots_handler).post(create_slot_handler),
        )
        .route(
            "/doctors/{doctor_id}/slots/bulk",
            post(bulk_create_slots_handler),
        )
        .route(
            "/doctors/{doctor_id}/slots/{slot_id}",
            delete(delete_slot_handler),
        )
        .route(
            "/doctors/{doctor_id}/appointments",
            get(list_doctor_appointments_handler),
        )
        .route("/slots/{slot_id}/book", post(book_slot_handler))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment_handler),
        )
        .route(
            "/patients/{patient_id}/appointments",
            get(list_patient_appointments_handler),
        )
        .with_state(state)
}
