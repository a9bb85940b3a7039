use clinic_config::GcalConfig;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Errors raised while building the calendar hub.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing key_path in GcalConfig")]
    MissingKeyPath,
    #[error("Failed to load service account credentials: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a calendar hub authenticated with the service account key at
/// `config.key_path`.
pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, AuthError> {
    let key_path = config
        .key_path
        .as_deref()
        .filter(|path| !path.is_empty())
        .ok_or(AuthError::MissingKeyPath)?;

    debug!("Reading service account key from {}", key_path);
    let sa_key = read_service_account_key(Path::new(key_path)).await?;

    let auth = ServiceAccountAuthenticator::builder(sa_key).build().await?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, auth))
}
