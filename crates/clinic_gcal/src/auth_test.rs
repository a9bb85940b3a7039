#[cfg(test)]
mod tests {
    use crate::auth::{create_calendar_hub, AuthError};
    use clinic_config::GcalConfig;

    #[tokio::test]
    async fn test_create_calendar_hub_missing_key_path() {
        let config = GcalConfig {
            key_path: None,
            time_zone: None,
        };

        let result = create_calendar_hub(&config).await;
        assert!(matches!(result, Err(AuthError::MissingKeyPath)));
    }

    #[tokio::test]
    async fn test_create_calendar_hub_unreadable_key_file() {
        let config = GcalConfig {
            key_path: Some("/nonexistent/clinic-service-account.json".to_string()),
            time_zone: None,
        };

        match create_calendar_hub(&config).await {
            Err(AuthError::Io(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error for a missing key file"),
        }
    }
}
