// Error type tests

use containerservice_testing::error::{HarnessError, Result};

fn parse_port(value: &str) -> Result<u16> {
    value
        .parse()
        .map_err(|_| HarnessError::InvalidArgument(format!("'{}' is not a port", value)))
}

fn load(value: &str) -> Result<u16> {
    let port = parse_port(value)?;
    Ok(port)
}

#[test]
fn test_error_messages_are_actionable() {
    let missing = HarnessError::MissingRouteParameter {
        path: "/widgets/:id(.:format)".to_string(),
        param: "id".to_string(),
    };
    assert_eq!(
        missing.to_string(),
        "Route '/widgets/:id(.:format)' cannot be formatted without required parameter ':id'"
    );

    let empty = HarnessError::NoRoutesForController("gadgets".to_string());
    assert!(empty.to_string().contains("'gadgets'"));

    let blocked = HarnessError::NetConnectNotAllowed("https://example.com/".to_string());
    assert!(blocked.to_string().contains("https://example.com/"));
}

#[test]
fn test_foreign_errors_convert_with_question_mark() {
    let io: HarnessError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, HarnessError::Io(_)));

    let json: HarnessError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(json, HarnessError::Json(_)));

    let yaml: HarnessError = serde_yaml::from_str::<serde_yaml::Value>("a: [")
        .unwrap_err()
        .into();
    assert!(matches!(yaml, HarnessError::Yaml(_)));
}

#[test]
fn test_result_alias_propagates() {
    assert_eq!(load("9250").unwrap(), 9250);
    assert!(matches!(load("x"), Err(HarnessError::InvalidArgument(_))));
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<HarnessError>();

    let boxed: Box<dyn std::error::Error + Send + Sync> =
        Box::new(HarnessError::Config("bad".to_string()));
    assert_eq!(boxed.to_string(), "Configuration error: bad");
}
