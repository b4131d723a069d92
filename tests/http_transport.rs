//! Drives the real reqwest transport against a mock CRM endpoint.

use std::net::TcpListener;
use std::time::Duration;

use mockito::{Matcher, Server};
use onecrm::{CrmClient, ErrorKind};
use serde_json::{Map, json};

const REST_PATH: &str = "/service/v4/rest.php";
const DEMO_DIGEST: &str = "fe01ce2a7fbac8fafaed7c982a04e229";

fn endpoint(server: &Server) -> String {
    format!("{}{REST_PATH}", server.url())
}

fn form_field(key: &str, value: &str) -> Matcher {
    Matcher::UrlEncoded(key.to_owned(), value.to_owned())
}

fn login_form() -> Matcher {
    Matcher::AllOf(vec![
        form_field("method", "login"),
        form_field("input_type", "JSON"),
        form_field("response_type", "JSON"),
        form_field(
            "rest_data",
            &format!(r#"{{"user_auth":{{"user_name":"demo","password":"{DEMO_DIGEST}"}}}}"#),
        ),
    ])
}

fn login_body() -> String {
    json!({
        "id": "sess-42",
        "module_name": "Users",
        "name_value_list": {
            "user_id": "1",
            "available_modules": [
                {"module_key": "Accounts", "module_label": "Companies"},
                {"module_key": "Contacts", "module_label": "Contacts"}
            ]
        }
    })
    .to_string()
}

#[test]
fn login_and_call_over_http() {
    let mut server = Server::new();
    let call_result = json!({"result_count": 0, "entry_list": []});

    let login = server
        .mock("POST", REST_PATH)
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_header(
            "user-agent",
            Matcher::Regex("^1CRM Rust client version ".to_owned()),
        )
        .match_body(login_form())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("set-cookie", "PHPSESSID=abc123; Path=/")
        .with_body(login_body())
        .create();
    let call = server
        .mock("POST", REST_PATH)
        .match_header("cookie", "PHPSESSID=abc123")
        .match_body(Matcher::AllOf(vec![
            form_field("method", "get_entry_list"),
            form_field("input_type", "JSON"),
            form_field("response_type", "JSON"),
            form_field(
                "rest_data",
                r#"{"max_results":5,"module_name":"Accounts","session":"sess-42"}"#,
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(call_result.to_string())
        .create();

    let mut client = CrmClient::new(endpoint(&server), false).unwrap();
    client.login("demo", "demo").unwrap();
    assert_eq!(client.list_modules().unwrap(), "Companies (Accounts)\nContacts (Contacts)\n");

    let mut params = Map::new();
    params.insert("max_results".to_owned(), json!(5));
    let result = client.call("Accounts", "get_entry_list", params).unwrap();
    assert_eq!(result, call_result);
    client.close();

    login.assert();
    call.assert();
}

#[test]
fn redirects_are_followed() {
    let mut server = Server::new();
    let moved = server
        .mock("POST", REST_PATH)
        .with_status(302)
        .with_header("location", "/moved/rest.php")
        .create();
    let target = server
        .mock("GET", "/moved/rest.php")
        .with_status(200)
        .with_body(login_body())
        .create();

    let mut client = CrmClient::new(endpoint(&server), false).unwrap();
    client.login("demo", "demo").unwrap();
    assert!(client.is_logged_in());

    moved.assert();
    target.assert();
}

#[test]
fn server_errors_surface_as_connection_errors() {
    let mut server = Server::new();
    let unavailable = server
        .mock("POST", REST_PATH)
        .with_status(503)
        .with_body(r#"{"name":"Maintenance"}"#)
        .create();

    let _ = tracing_subscriber::fmt()
        .with_env_filter("onecrm=debug,reqwest=trace")
        .with_test_writer()
        .try_init();
    let mut client = CrmClient::new(endpoint(&server), true).unwrap();
    let err = client.login("demo", "demo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.status(), Some(503));
    assert!(!client.is_logged_in());
    assert!(client.last_request_secs() > 0.0);

    unavailable.assert();
}

#[test]
fn empty_body_surfaces_as_data_error() {
    let mut server = Server::new();
    let empty = server
        .mock("POST", REST_PATH)
        .match_body(login_form())
        .with_status(200)
        .with_body("")
        .create();

    let mut client = CrmClient::new(endpoint(&server), false).unwrap();
    let err = client.login("demo", "demo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
    assert_eq!(err.to_string(), "Empty response.");

    empty.assert();
}

#[test]
fn unreachable_endpoint_is_a_connection_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut client = CrmClient::builder(format!("http://127.0.0.1:{port}/rest.php"))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let err = client.login("demo", "demo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().starts_with("Request error: "));
}
