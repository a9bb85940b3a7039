// File: crates/services/clinic_backend/src/lib.rs
pub mod app_state;
pub mod service_factory;

pub use app_state::{build_router, AppState};
pub use service_factory::ClinicServiceFactory;
