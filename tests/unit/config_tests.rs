// Configuration unit tests

use containerservice_testing::config::*;
use containerservice_testing::error::HarnessError;
use jsonwebtoken::Algorithm;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_can_deserialize_full_harness_config() {
    let yaml = r#"
jwt:
  algorithm: RS512
  key_bits: 2048
  token_ttl_secs: 600
  env:
    public_key: JWT_PUBLIC_KEY
    algorithm: JWT_VALIDATION_ALGORITHM
    enabled: JWT_VALIDATION_ENABLED
coverage:
  invalid_authorization: "Bearer not-a-jwt"
  allow_empty: true
network:
  allow_localhost: true
  allowed_hosts:
    - search.internal
logging:
  level: debug
  json: true
app:
  base_url: "http://localhost:3000"
elasticsearch:
  test_cluster_port: "9333"
"#;
    let config = HarnessConfig::from_yaml_with_env(yaml).expect("Failed to parse config");

    assert_eq!(config.jwt.jwt_algorithm().unwrap(), Algorithm::RS512);
    assert_eq!(config.jwt.key_bits, 2048);
    assert_eq!(config.jwt.token_ttl_secs, 600);
    assert_eq!(config.jwt.env, JwtEnvNames::with_prefix("JWT_"));
    assert_eq!(config.coverage.invalid_authorization, "Bearer not-a-jwt");
    assert!(config.coverage.allow_empty);
    assert_eq!(config.network.allowed_hosts, vec!["search.internal"]);
    assert!(config.logging.json);
    assert_eq!(config.app.as_ref().unwrap().timeout_secs, 30);
    assert_eq!(
        config.elasticsearch.as_ref().unwrap().test_cluster_url(),
        "http://localhost:9333"
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_config_matches_service_contract() {
    let config = HarnessConfig::default();

    assert_eq!(config.jwt.algorithm, "RS256");
    assert_eq!(config.jwt.key_bits, 1024);
    assert_eq!(config.jwt.token_ttl_secs, 3600);
    assert_eq!(config.jwt.env.public_key, "PUBLIC_KEY");
    assert_eq!(config.jwt.env.algorithm, "VALIDATION_ALGORITHM");
    assert_eq!(config.jwt.env.enabled, "VALIDATION_ENABLED");
    assert_eq!(
        config.coverage.invalid_authorization,
        DEFAULT_INVALID_AUTHORIZATION
    );
    assert!(!config.coverage.allow_empty);
    assert!(config.validate().is_ok());
}

#[test]
fn test_key_size_floor_is_enforced_per_algorithm() {
    let too_small = JwtHarnessConfig {
        algorithm: "RS512".to_string(),
        key_bits: 512,
        ..Default::default()
    };
    assert!(matches!(too_small.validate(), Err(HarnessError::Config(_))));

    let ok = JwtHarnessConfig {
        algorithm: "RS256".to_string(),
        key_bits: 512,
        ..Default::default()
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_non_rsa_algorithms_are_rejected() {
    for algorithm in ["HS256", "ES256", "none"] {
        let config = JwtHarnessConfig {
            algorithm: algorithm.to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err(), "{} should be rejected", algorithm);
    }
}

#[test]
fn test_invalid_yaml_reports_yaml_error() {
    let result = HarnessConfig::from_yaml_with_env("jwt: [unclosed");

    assert!(matches!(result, Err(HarnessError::Yaml(_))));
}

#[test]
fn test_config_file_with_validation_failure() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"app:\n  base_url: \"ftp://localhost\"\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = HarnessConfig::from_file(temp_file.path()).unwrap();

    assert!(config.validate().is_err());
}
