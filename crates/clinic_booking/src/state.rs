use crate::accounts::AccountService;
use crate::appointments::AppointmentQueries;
use crate::fulfillment::FulfillmentDispatcher;
use crate::guard::BookingGuard;
use crate::slots::SlotService;
use chrono_tz::Tz;
use clinic_common::{config_error, ClinicError};
use clinic_config::BookingConfig;
use clinic_db::DbClient;

/// The IANA zone the clinic operates in.
pub fn clinic_time_zone(config: &BookingConfig) -> Result<Tz, ClinicError> {
    config
        .time_zone
        .parse::<Tz>()
        .map_err(|_| config_error(format!("unknown time zone {}", config.time_zone)))
}

/// Shared state of the booking routes.
#[derive(Debug, Clone)]
pub struct BookingState {
    pub db_client: DbClient,
    pub guard: BookingGuard,
    pub slots: SlotService,
    pub accounts: AccountService,
    pub appointments: AppointmentQueries,
}

impl BookingState {
    pub fn new(
        db_client: DbClient,
        dispatcher: FulfillmentDispatcher,
        config: &BookingConfig,
    ) -> Result<Self, ClinicError> {
        let time_zone = clinic_time_zone(config)?;

        Ok(Self {
            guard: BookingGuard::new(
                db_client.clone(),
                dispatcher.clone(),
                config.statement_timeout(),
            ),
            slots: SlotService::new(db_client.clone(), time_zone),
            accounts: AccountService::new(db_client.clone(), dispatcher),
            appointments: AppointmentQueries::new(db_client.clone()),
            db_client,
        })
    }
}
