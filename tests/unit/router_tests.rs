// Route table and coverage declaration from a routes file

use containerservice_testing::config::CoverageConfig;
use containerservice_testing::coverage::{AuthCoverage, CoverageKind};
use containerservice_testing::request::HttpVerb;
use containerservice_testing::router::{controller_identifier, RouteTable};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

const ROUTES_YAML: &str = r#"
routes:
  - verb: GET
    path: /widgets(.:format)
    to: widgets#index
  - verb: POST
    path: /widgets(.:format)
    to: widgets#create
  - verb: GET
    path: /admin/widgets(.:format)
    to: admin/widgets#index
  - verb: DELETE
    path: /admin/widgets/bulk
    to: admin/widgets#purge
  - verb: GET
    path: /widgets/:id(.:format)
    to: gadgets#show
"#;

fn routes_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(ROUTES_YAML.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_routes_file_loads_every_route() {
    let file = routes_file();

    let routes = RouteTable::from_file(file.path()).unwrap();

    assert_eq!(routes.len(), 5);
    assert_eq!(routes.for_controller("widgets").len(), 2);
    assert_eq!(routes.for_controller("admin/widgets").len(), 2);
}

#[test]
fn test_namespaced_controller_coverage() {
    let routes = RouteTable::from_yaml(ROUTES_YAML).unwrap();

    let coverage = AuthCoverage::declare(
        &routes,
        "Admin::WidgetsControllerTest",
        &CoverageConfig::default(),
    )
    .unwrap();

    assert_eq!(coverage.controller(), "admin/widgets");
    let names: Vec<&str> = coverage.names().collect();
    assert_eq!(
        names,
        vec![
            "test_get_admin_widgets_empty_unauthorized_response_is_returned_if_jwt_is_missing",
            "test_get_admin_widgets_empty_forbidden_response_is_returned_if_invalid_jwt_is_passed",
            "test_delete_admin_widgets_bulk_empty_unauthorized_response_is_returned_if_jwt_is_missing",
            "test_delete_admin_widgets_bulk_empty_forbidden_response_is_returned_if_invalid_jwt_is_passed",
        ]
    );
    assert!(coverage
        .cases()
        .iter()
        .all(|case| case.verb == HttpVerb::Get || case.verb == HttpVerb::Delete));
}

#[test]
fn test_custom_invalid_authorization_is_used() {
    let routes = RouteTable::from_yaml(ROUTES_YAML).unwrap();
    let config = CoverageConfig {
        invalid_authorization: "Bearer forged.token.value".to_string(),
        ..Default::default()
    };

    let coverage = AuthCoverage::declare(&routes, "WidgetsControllerTest", &config).unwrap();

    let invalid: Vec<_> = coverage
        .cases()
        .iter()
        .filter(|case| case.kind == CoverageKind::InvalidToken)
        .collect();
    assert_eq!(invalid.len(), 2);
    assert!(invalid
        .iter()
        .all(|case| case.authorization.as_deref() == Some("Bearer forged.token.value")));
}

#[test]
fn test_controller_with_parameterized_route_fails_loudly() {
    let routes = RouteTable::from_yaml(ROUTES_YAML).unwrap();

    let err = AuthCoverage::declare(&routes, "GadgetsControllerTest", &CoverageConfig::default())
        .unwrap_err();

    assert!(err.to_string().contains("/widgets/:id(.:format)"));
}

#[test]
fn test_route_formats_with_supplied_params() {
    let routes = RouteTable::from_yaml(ROUTES_YAML).unwrap();
    let show = routes.for_controller("gadgets")[0].clone();
    let mut params = HashMap::new();
    params.insert("id".to_string(), "42".to_string());
    params.insert("format".to_string(), "json".to_string());

    assert_eq!(show.format(&params).unwrap(), "/widgets/42.json");
    assert_eq!(show.path.required_params(), vec!["id"]);
}

#[test]
fn test_controller_identifier_forms() {
    assert_eq!(controller_identifier("WidgetsControllerTest").unwrap(), "widgets");
    assert_eq!(
        controller_identifier("Admin::WidgetsController").unwrap(),
        "admin/widgets"
    );
    assert_eq!(controller_identifier("admin/widgets").unwrap(), "admin/widgets");
    assert!(controller_identifier("").is_err());
}
