#![allow(clippy::unwrap_used)]
// Integration tests for `PanelClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tc20e_api::{AuthHeader, Error, PanelClient, PanelCommand, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const AUTH: &str = "Basic dXNlcjpwYXNzOjE6MA==";
const HOME_HTML: &str = "<html><script>var homeSessionId='sess-123';</script></html>";

async fn setup() -> (MockServer, PanelClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PanelClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn auth() -> AuthHeader {
    AuthHeader::from(AUTH.to_string())
}

async fn mount_login(server: &MockServer, validate_body: &str, home_body: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/validate"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_string(validate_body))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string(home_body))
        .mount(server)
        .await;
}

const COMMANDS: &str = "/applicationservice/domoweb/panel/commands";

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_stores_token() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", HOME_HTML).await;

    let token = client.login(&auth()).await.unwrap();

    assert_eq!(token.expose(), "sess-123");
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (server, client) = setup().await;
    mount_login(&server, "no", HOME_HTML).await;

    let result = client.login(&auth()).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_login_without_session_id() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", "<html>maintenance</html>").await;

    let result = client.login(&auth()).await;

    assert!(
        matches!(result, Err(Error::SessionToken { status: 200 })),
        "expected SessionToken error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_logout_clears_token() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", HOME_HTML).await;
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&auth()).await.unwrap();
    client.logout().await.unwrap();

    assert!(!client.is_logged_in());
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_requires_session() {
    let (_server, client) = setup().await;

    let result = client.submit_command(PanelCommand::Status).await;

    assert!(matches!(result, Err(Error::NotLoggedIn)), "got: {result:?}");
}

#[tokio::test]
async fn test_submit_command_shape() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", HOME_HTML).await;

    Mock::given(method("PUT"))
        .and(path(format!("{COMMANDS}/arm")))
        .and(header("x-session-token", "sess-123"))
        .and(query_param("isBusy", "true"))
        .and(query_param("checkCompletion", "true"))
        .and(body_json(json!({ "key": "", "value": "" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "77", "status": "success" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.login(&auth()).await.unwrap();
    let resp = client.submit_command(PanelCommand::Arm).await.unwrap();

    assert_eq!(resp.status, 200);
    assert!(resp.is_json());
    let ack: tc20e_api::SubmitAck = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(ack.id, "77");
}

#[tokio::test]
async fn test_command_status_polls_job_endpoint() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", HOME_HTML).await;

    Mock::given(method("GET"))
        .and(path(format!("{COMMANDS}/status/77/status")))
        .and(header("x-session-token", "sess-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 2,
            "messageKey": "ok",
            "errorCode": 100
        })))
        .mount(&server)
        .await;

    client.login(&auth()).await.unwrap();
    let resp = client
        .command_status(PanelCommand::Status, "77")
        .await
        .unwrap();

    let status: tc20e_api::CompletionStatus = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(status.status_code, 2);
    assert_eq!(status.error_code, Some(100));
}

#[tokio::test]
async fn test_non_json_response_keeps_content_type() {
    let (server, client) = setup().await;
    mount_login(&server, "#1home", HOME_HTML).await;

    Mock::given(method("PUT"))
        .and(path(format!("{COMMANDS}/disarm")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    client.login(&auth()).await.unwrap();
    let resp = client.submit_command(PanelCommand::Disarm).await.unwrap();

    assert!(!resp.is_json(), "content type: {:?}", resp.content_type);
    assert_eq!(resp.body_preview(), "<html>oops</html>");
}
