// --- File: crates/services/clinic_backend/src/app_state.rs ---
use crate::service_factory::ClinicServiceFactory;
use axum::{routing::get, Router};
use clinic_booking::{BookingState, FulfillmentDispatcher, FulfillmentWorker};
use clinic_common::services::ServiceFactory;
use clinic_common::ClinicError;
use clinic_config::AppConfig;
use clinic_db::DbClient;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across all routes.
///
/// Owns the fulfillment worker: it runs until the last dispatcher, held by
/// the booking state, is dropped.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub booking: Arc<BookingState>,
    pub service_factory: Arc<dyn ServiceFactory>,
    pub fulfillment_worker: JoinHandle<()>,
}

impl AppState {
    /// Connect to the database, create the schema and start fulfillment with
    /// the integrations enabled in `config`.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, ClinicError> {
        let db_client = DbClient::new(&config).await?;
        clinic_db::init_schema(&db_client).await?;
        info!("Database schema ready");

        let service_factory = Arc::new(ClinicServiceFactory::new(&config).await);
        Self::with_services(config, db_client, service_factory)
    }

    /// Build the state on an existing database with the given integrations.
    /// Must be called inside a tokio runtime.
    pub fn with_services(
        config: Arc<AppConfig>,
        db_client: DbClient,
        service_factory: Arc<dyn ServiceFactory>,
    ) -> Result<Self, ClinicError> {
        let (dispatcher, receiver) =
            FulfillmentDispatcher::channel(config.booking.fulfillment_queue_capacity);

        let worker = FulfillmentWorker::new(
            db_client.clone(),
            service_factory.as_ref(),
            &config.booking,
        )?;
        let booking = Arc::new(BookingState::new(db_client, dispatcher, &config.booking)?);
        let fulfillment_worker = worker.spawn(receiver);

        Ok(Self {
            config,
            booking,
            service_factory,
            fulfillment_worker,
        })
    }
}

/// The complete application: booking routes under `/api`, request tracing
/// and, with the `openapi` feature, Swagger UI at `/api/docs`.
pub fn build_router(state: &AppState) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Clinic booking API" }))
        .merge(clinic_booking::routes::routes(state.booking.clone()));

    #[allow(unused_mut)] // for the features it needs to be mutable
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use clinic_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Clinic Booking API",
                version = "0.1.0",
                description = "Doctor availability and appointment booking",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app.layer(TraceLayer::new_for_http())
}
