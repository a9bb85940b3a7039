//! Booking for the clinic service
//!
//! * [`guard`] - the booking guard: atomic check-and-reserve of a slot
//! * [`slots`] - doctors publishing and removing availability
//! * [`accounts`] - registration and doctor availability
//! * [`fulfillment`] - calendar sync and emails queued after commit
//! * [`routes`] - the axum router exposing all of the above

pub mod accounts;
pub mod appointments;
pub mod doc;
pub mod fulfillment;
pub mod guard;
pub mod handlers;
pub mod messages;
pub mod routes;
pub mod slots;
pub mod state;

pub use fulfillment::{FulfillmentDispatcher, FulfillmentTask, FulfillmentWorker};
pub use guard::{BookingGuard, BookingRejection, BookingRequest};
pub use state::BookingState;
