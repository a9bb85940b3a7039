//! Repositories for the clinic tables
//!
//! Each repository is a trait plus a SQL implementation on top of [`crate::DbClient`].

pub mod appointments;
pub mod appointments_sql;
pub mod calendar_events;
pub mod calendar_events_sql;
pub mod slots;
pub mod slots_sql;
pub mod users;
pub mod users_sql;

pub use appointments::{AppointmentRepository, ReservationRequest, ReserveError};
pub use appointments_sql::SqlAppointmentRepository;
pub use calendar_events::CalendarEventRepository;
pub use calendar_events_sql::SqlCalendarEventRepository;
pub use slots::{SlotDeletion, SlotFilter, SlotRepository};
pub use slots_sql::SqlSlotRepository;
pub use users::UserRepository;
pub use users_sql::SqlUserRepository;
