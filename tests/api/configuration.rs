use docstore::configuration::{get_configuration, Backend, Environment};
use secrecy::ExposeSecret;

#[test]
fn local_configuration_uses_memory_backend() {
    let settings = get_configuration().expect("configuration fetched");

    assert_eq!(settings.application.backend, Backend::Memory);
    assert_eq!(settings.firestore.database, "(default)");
    assert!(settings.firestore.api_key.expose_secret().is_empty());
    assert!(settings.firestore.poll_interval_ms > 0);
}

#[test]
fn unknown_environment_is_rejected() {
    assert!(Environment::try_from("staging".to_string()).is_err());
    assert!(matches!(
        Environment::try_from("PRODUCTION".to_string()),
        Ok(Environment::Production)
    ));
}
