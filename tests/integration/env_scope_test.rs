// Environment restoration across threads and failure paths

use containerservice_testing::auth::{JwtAuthHarness, ValidationSettings};
use containerservice_testing::config::{JwtEnvNames, JwtHarnessConfig};
use containerservice_testing::env::{
    with_modified_env, with_modified_env_async, EnvOverrides, EnvScope,
};
use serial_test::serial;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

fn harness(prefix: &str) -> JwtAuthHarness {
    JwtAuthHarness::new(JwtHarnessConfig {
        key_bits: 512,
        env: JwtEnvNames::with_prefix(prefix),
        ..Default::default()
    })
    .unwrap()
}

#[test]
#[serial]
fn test_default_env_restored_after_failing_test_body() {
    let harness = harness("ENV_IT_PANIC_");
    let names = harness.config().env.clone();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _scope = harness.default_env_scope().unwrap();
        assert!(ValidationSettings::from_env(&names).enabled);
        panic!("assertion failed inside the test body");
    }));

    assert!(result.is_err());
    let after = ValidationSettings::from_env(&names);
    assert!(!after.enabled);
    assert!(after.public_key.is_none());
    assert!(after.algorithm.is_none());
}

#[test]
#[serial]
fn test_preexisting_values_survive_nested_overrides() {
    let _outer = EnvScope::apply(
        EnvOverrides::new()
            .set("ENV_IT_NESTED_VALIDATION_ENABLED", "original")
            .unset("ENV_IT_NESTED_PUBLIC_KEY"),
    );
    let harness = harness("ENV_IT_NESTED_");

    {
        let _scope = harness.default_env_scope().unwrap();
        with_modified_env(
            EnvOverrides::new().set("ENV_IT_NESTED_VALIDATION_ENABLED", "false"),
            || {
                assert_eq!(
                    std::env::var("ENV_IT_NESTED_VALIDATION_ENABLED").unwrap(),
                    "false"
                );
                assert!(std::env::var("ENV_IT_NESTED_PUBLIC_KEY").is_ok());
            },
        );
        assert_eq!(
            std::env::var("ENV_IT_NESTED_VALIDATION_ENABLED").unwrap(),
            "true"
        );
    }

    assert_eq!(
        std::env::var("ENV_IT_NESTED_VALIDATION_ENABLED").unwrap(),
        "original"
    );
    assert!(std::env::var("ENV_IT_NESTED_PUBLIC_KEY").is_err());
}

#[test]
fn test_concurrent_scopes_never_observe_each_other() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let value = format!("worker-{}", i);
                for _ in 0..25 {
                    with_modified_env(
                        EnvOverrides::new().set("ENV_IT_CONCURRENT", value.as_str()),
                        || {
                            thread::yield_now();
                            assert_eq!(std::env::var("ENV_IT_CONCURRENT").unwrap(), value);
                        },
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker observed a foreign value");
    }

    let _scope = EnvScope::apply(EnvOverrides::new());
    assert!(std::env::var("ENV_IT_CONCURRENT").is_err());
}

#[test]
fn test_harness_instances_own_their_keys() {
    let first = harness("ENV_IT_KEYS_");
    let second = harness("ENV_IT_KEYS_");

    let first_key = {
        let _scope = first.default_env_scope().unwrap();
        std::env::var("ENV_IT_KEYS_PUBLIC_KEY").unwrap()
    };
    let second_key = {
        let _scope = second.default_env_scope().unwrap();
        std::env::var("ENV_IT_KEYS_PUBLIC_KEY").unwrap()
    };

    assert_ne!(first_key, second_key);
    assert_eq!(first_key, first.keypair().unwrap().public_key_pem());
}

#[tokio::test]
#[serial]
async fn test_joined_harness_scopes_leave_no_credentials_behind() {
    let slow = harness("ENV_IT_JOIN_");
    let fast = harness("ENV_IT_JOIN_");
    let names = slow.config().env.clone();

    let (slow_key, fast_key) = tokio::join!(
        with_modified_env_async(slow.default_env().unwrap(), || async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            ValidationSettings::from_env(&names).public_key
        }),
        with_modified_env_async(fast.default_env().unwrap(), || async {
            ValidationSettings::from_env(&names).public_key
        }),
    );

    assert_eq!(fast_key.as_deref(), Some(fast.keypair().unwrap().public_key_pem()));
    assert!(slow_key.is_some());
    let after = ValidationSettings::from_env(&names);
    assert!(!after.enabled);
    assert!(after.public_key.is_none());
}

#[test]
#[serial]
fn test_scopes_released_out_of_order_restore_original() {
    let harness = harness("ENV_IT_ORDER_");
    let names = harness.config().env.clone();

    let defaults = harness.default_env_scope().unwrap();
    let disabled = EnvScope::apply(EnvOverrides::new().set(&names.enabled, "false"));

    drop(defaults);
    assert!(!ValidationSettings::from_env(&names).enabled);
    assert!(ValidationSettings::from_env(&names).public_key.is_none());

    drop(disabled);
    assert!(std::env::var(&names.enabled).is_err());
}
