//! Tests for server module

use super::*;
use std::collections::HashMap;

#[test]
fn test_default_config() {
    let config = HandlerConfig::default();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.function_name, DEFAULT_FUNCTION_NAME);
}

#[test]
fn test_config_from_source() {
    let vars = HashMap::from([
        (PORT_VARIABLE, "7071"),
        (FUNCTION_NAME_VARIABLE, "nightly_protection"),
    ]);

    let config = HandlerConfig::from_source(&vars).unwrap();

    assert_eq!(config.port, 7071);
    assert_eq!(config.function_name, "nightly_protection");
}

#[test]
fn test_blank_variables_use_defaults() {
    let vars = HashMap::from([(PORT_VARIABLE, " "), (FUNCTION_NAME_VARIABLE, "")]);

    assert_eq!(
        HandlerConfig::from_source(&vars).unwrap(),
        HandlerConfig::default()
    );
}

#[test]
fn test_invalid_port_is_rejected() {
    let vars = HashMap::from([(PORT_VARIABLE, "not-a-port")]);

    let err = HandlerConfig::from_source(&vars).unwrap_err();

    assert!(err.to_string().contains(PORT_VARIABLE));
}
