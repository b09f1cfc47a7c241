//! Unit tests for provider configuration validation.

use std::time::Duration;

use ddcloud::{ConfigError, ProviderConfig, ProviderError, ProviderSettings};
use rstest::*;

#[fixture]
fn valid_config() -> ProviderConfig {
    ProviderConfig {
        username: String::from("ddcloud-user"),
        password: String::from("correct horse battery staple"),
        region: String::from("AU"),
        retry_timeout_secs: 600,
        retry_delay_secs: 5,
        max_retry_delay_secs: 30,
        poll_interval_secs: 5,
        lock_timeout_secs: None,
        allow_server_reboots: false,
        auto_create_tag_keys: false,
    }
}

#[rstest]
fn valid_configuration_passes(valid_config: ProviderConfig) {
    valid_config
        .validate()
        .unwrap_or_else(|err| panic!("valid configuration should pass: {err}"));
}

#[rstest]
fn config_validation_rejects_missing_password_with_actionable_error(
    valid_config: ProviderConfig,
) {
    let cfg = ProviderConfig {
        password: String::new(),
        ..valid_config
    };

    let error = cfg.validate().expect_err("password is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("DDCLOUD_PASSWORD"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("ddcloud.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("password"),
        "error should mention TOML key: {message}"
    );
}

/// Verifies that validation produces actionable errors mentioning both the
/// environment variable and configuration file for each required field.
#[rstest]
#[case::username(|cfg: &mut ProviderConfig| cfg.username.clear(), "DDCLOUD_USERNAME", "username")]
#[case::password(|cfg: &mut ProviderConfig| cfg.password = String::from("   "), "DDCLOUD_PASSWORD", "password")]
#[case::region(|cfg: &mut ProviderConfig| cfg.region.clear(), "DDCLOUD_REGION", "region")]
fn config_validation_produces_actionable_errors_for_all_fields(
    valid_config: ProviderConfig,
    #[case] mutate: fn(&mut ProviderConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    let mut cfg = valid_config;
    mutate(&mut cfg);

    let message = cfg
        .validate()
        .expect_err("validation should fail")
        .to_string();
    assert!(
        message.contains(env_var),
        "error should mention env var {env_var}: {message}"
    );
    assert!(
        message.contains("ddcloud.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains(toml_key),
        "error should mention TOML key {toml_key}: {message}"
    );
}

#[rstest]
#[case::retry_timeout(|cfg: &mut ProviderConfig| cfg.retry_timeout_secs = 0, "retry_timeout_secs")]
#[case::poll_interval(|cfg: &mut ProviderConfig| cfg.poll_interval_secs = 0, "poll_interval_secs")]
fn config_rejects_zero_timing_values(
    valid_config: ProviderConfig,
    #[case] mutate: fn(&mut ProviderConfig),
    #[case] field: &str,
) {
    let mut cfg = valid_config;
    mutate(&mut cfg);

    let err = cfg.validate().expect_err("zero values cannot make progress");
    let ConfigError::Invalid(ref message) = err else {
        panic!("expected Invalid error, got {err:?}");
    };
    assert!(message.contains(field), "unexpected error: {message}");
}

#[rstest]
fn config_converts_into_settings(valid_config: ProviderConfig) {
    let cfg = ProviderConfig {
        retry_timeout_secs: 120,
        lock_timeout_secs: Some(45),
        allow_server_reboots: true,
        auto_create_tag_keys: true,
        ..valid_config
    };

    let settings = cfg
        .settings()
        .unwrap_or_else(|err| panic!("settings should convert: {err}"));

    assert_eq!(
        settings,
        ProviderSettings {
            retry_timeout: Duration::from_secs(120),
            retry_delay: Duration::from_secs(5),
            max_retry_delay: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            lock_timeout: Some(Duration::from_secs(45)),
            allow_server_reboots: true,
            auto_create_tag_keys: true,
        }
    );
}

#[rstest]
fn default_settings_match_configuration_defaults(valid_config: ProviderConfig) {
    let settings = valid_config
        .settings()
        .unwrap_or_else(|err| panic!("settings should convert: {err}"));
    assert_eq!(settings, ProviderSettings::default());
}

#[rstest]
fn invalid_configuration_surfaces_as_provider_error(valid_config: ProviderConfig) {
    let cfg = ProviderConfig {
        region: String::new(),
        ..valid_config
    };

    let err = ddcloud::Provider::from_config(ddcloud::test_support::FakeCompute::new(), &cfg)
        .expect_err("region is required");

    let ProviderError::Config(ref message) = err else {
        panic!("expected Config error, got {err:?}");
    };
    assert!(message.contains("DDCLOUD_REGION"), "unexpected error: {message}");
}
