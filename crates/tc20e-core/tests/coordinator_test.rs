#![allow(clippy::unwrap_used)]
// End-to-end tests for `Coordinator` against a wiremock panel service.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tc20e_core::{
    AlarmCommand, AlarmState, AuthHeader, Coordinator, CoordinatorConfig, CoreError, FailureKind,
    UpdateFailure,
};

// ── Helpers ─────────────────────────────────────────────────────────

const AUTH: &str = "Basic dXNlcjpwYXNzOjE6MA==";
const COMMANDS: &str = "/applicationservice/domoweb/panel/commands";

fn config(server: &MockServer) -> CoordinatorConfig {
    let mut config = CoordinatorConfig::new(
        Url::parse(&server.uri()).unwrap(),
        AuthHeader::from(AUTH.to_string()),
    );
    config.request_timeout = Duration::from_secs(2);
    config.poll_interval = Duration::from_millis(10);
    config.max_poll_attempts = 5;
    config
}

fn coordinator(server: &MockServer) -> Coordinator {
    Coordinator::new(config(server)).unwrap()
}

async fn mount_login(server: &MockServer, validate_body: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(validate_body))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<script>homeSessionId='sess-1';</script>")
                .set_delay(Duration::from_millis(20)),
        )
        .mount(server)
        .await;
}

async fn mount_logout(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .named("logout")
        .mount(server)
        .await;
}

async fn mount_submit(server: &MockServer, command: &str, response: ResponseTemplate) {
    Mock::given(method("PUT"))
        .and(path(format!("{COMMANDS}/{command}")))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_poll(server: &MockServer, command: &str, job: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("{COMMANDS}/{command}/{job}/status")))
        .respond_with(response)
        .mount(server)
        .await;
}

fn accepted(job: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": job, "status": "success" }))
}

fn completion(status_code: i64, error_code: Option<i64>) -> serde_json::Value {
    json!({ "statusCode": status_code, "messageKey": "msg", "errorCode": error_code })
}

async fn count_requests(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

// ── Arm / disarm ────────────────────────────────────────────────────

#[tokio::test]
async fn set_alarm_applies_target_state_and_logs_out_once() {
    for command in AlarmCommand::iter() {
        let server = MockServer::start().await;
        let name = command.panel_command().name();
        mount_login(&server, "#1home").await;
        mount_logout(&server, 1).await;
        mount_submit(&server, name, accepted("job-9")).await;
        mount_poll(
            &server,
            name,
            "job-9",
            ResponseTemplate::new(200).set_body_json(completion(2, None)),
        )
        .await;

        let coordinator = coordinator(&server);
        let state = coordinator.set_alarm(command).await.unwrap();

        assert_eq!(state, command.target_state());
        assert_eq!(coordinator.alarm_status(), command.target_state());
        assert_eq!(count_requests(&server, "/validate").await, 1);
        assert!(!coordinator.is_busy());
    }
}

#[tokio::test]
async fn poll_continues_until_completed() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(&server, "arm", accepted("7")).await;
    Mock::given(method("GET"))
        .and(path(format!("{COMMANDS}/arm/7/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(1, None)))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_poll(
        &server,
        "arm",
        "7",
        ResponseTemplate::new(200).set_body_json(completion(2, None)),
    )
    .await;

    let coordinator = coordinator(&server);
    coordinator.set_alarm(AlarmCommand::Full).await.unwrap();

    assert_eq!(coordinator.alarm_status(), AlarmState::ArmedAway);
    assert_eq!(count_requests(&server, &format!("{COMMANDS}/arm/7/status")).await, 3);
}

#[tokio::test]
async fn refused_submission_keeps_current_state() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(
        &server,
        "disarm",
        ResponseTemplate::new(200).set_body_json(json!({ "id": "1", "status": "busy" })),
    )
    .await;

    let coordinator = coordinator(&server);
    let state = coordinator.set_alarm(AlarmCommand::Disarm).await.unwrap();

    assert_eq!(state, AlarmState::Pending);
    assert_eq!(coordinator.snapshot().updated_at, None);
}

#[tokio::test]
async fn refresh_without_reported_code_keeps_timestamp() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201).set_body_json(completion(2, None)),
    )
    .await;

    let coordinator = coordinator(&server);
    let state = coordinator.refresh().await.unwrap();

    assert_eq!(state, AlarmState::Pending);
    assert_eq!(coordinator.snapshot().updated_at, None);
}

// ── Status refresh ──────────────────────────────────────────────────

#[tokio::test]
async fn refresh_applies_reported_code() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(&server, "status", accepted("s1")).await;
    mount_poll(
        &server,
        "status",
        "s1",
        ResponseTemplate::new(200).set_body_json(completion(2, Some(100))),
    )
    .await;

    let coordinator = coordinator(&server);
    assert_eq!(coordinator.snapshot().updated_at, None);

    let state = coordinator.refresh().await.unwrap();

    assert_eq!(state, AlarmState::Disarmed);
    assert!(coordinator.snapshot().updated_at.is_some());
}

#[tokio::test]
async fn direct_completion_sets_error_code_as_state() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201)
            .set_body_json(json!({ "statusCode": 5, "errorCode": 42, "messageKey": "x" })),
    )
    .await;

    let coordinator = coordinator(&server);
    let state = coordinator.refresh().await.unwrap();

    assert_eq!(state, AlarmState::Code(42));
    assert_eq!(coordinator.alarm_status().code(), 42);
}

// ── Failure paths ───────────────────────────────────────────────────

#[tokio::test]
async fn rejected_credentials_still_log_out_once() {
    let server = MockServer::start().await;
    mount_login(&server, "no").await;
    mount_logout(&server, 1).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    let err = coordinator.set_alarm(AlarmCommand::Full).await.unwrap_err();

    assert_eq!(err.kind(), Some(FailureKind::Authentication));
    assert!(matches!(err, CoreError::CommandFailed { command: AlarmCommand::Full, .. }));
    assert_eq!(coordinator.alarm_status(), AlarmState::Pending);
}

#[tokio::test]
async fn credential_validation_logs_out_after_rejection() {
    let server = MockServer::start().await;
    mount_login(&server, "no").await;
    mount_logout(&server, 1).await;

    let err = Coordinator::validate_credentials(&config(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }), "got: {err:?}");
    assert_eq!(err.kind(), Some(FailureKind::Authentication));
}

#[tokio::test]
async fn credential_validation_succeeds_without_commands() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;

    Coordinator::validate_credentials(&config(&server))
        .await
        .unwrap();

    assert_eq!(count_requests(&server, "/go/home").await, 1);
}

#[tokio::test]
async fn too_long_forces_pending_and_fails() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 2).await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201).set_body_json(completion(2, Some(100))),
    )
    .await;
    mount_submit(&server, "arm", accepted("a1")).await;
    mount_poll(
        &server,
        "arm",
        "a1",
        ResponseTemplate::new(200).set_body_json(completion(6, None)),
    )
    .await;

    let coordinator = coordinator(&server);
    coordinator.refresh().await.unwrap();
    assert_eq!(coordinator.alarm_status(), AlarmState::Disarmed);

    let err = coordinator.set_alarm(AlarmCommand::Full).await.unwrap_err();

    assert_eq!(err.kind(), Some(FailureKind::UpdateFailed));
    assert!(matches!(
        err.command_error(),
        Some(tc20e_core::CommandError::UpdateFailed(UpdateFailure::TooLong))
    ));
    assert_eq!(coordinator.alarm_status(), AlarmState::Pending);
}

#[tokio::test]
async fn poll_transport_error_fails_and_keeps_state() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 2).await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201).set_body_json(completion(2, Some(100))),
    )
    .await;
    mount_submit(&server, "arm", accepted("loop")).await;
    // Endless redirect: the client gives up with a non-timeout transport error.
    let poll_path = format!("{COMMANDS}/arm/loop/status");
    mount_poll(
        &server,
        "arm",
        "loop",
        ResponseTemplate::new(302).insert_header("location", poll_path.as_str()),
    )
    .await;

    let coordinator = coordinator(&server);
    coordinator.refresh().await.unwrap();

    let err = coordinator.set_alarm(AlarmCommand::Full).await.unwrap_err();

    assert!(
        matches!(
            err.command_error(),
            Some(tc20e_core::CommandError::UpdateFailed(UpdateFailure::Transport(_)))
        ),
        "got: {err:?}"
    );
    assert_eq!(coordinator.alarm_status(), AlarmState::Disarmed);
}

#[tokio::test]
async fn submit_timeout_is_a_connect_failure() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(
        &server,
        "status",
        accepted("slow").set_delay(Duration::from_secs(3)),
    )
    .await;

    let mut config = config(&server);
    config.request_timeout = Duration::from_millis(500);
    let coordinator = Coordinator::new(config).unwrap();

    let err = coordinator.refresh().await.unwrap_err();

    assert!(matches!(err, CoreError::StatusUnavailable { .. }));
    assert_eq!(err.kind(), Some(FailureKind::CannotConnect));
}

#[tokio::test]
async fn login_timeout_is_a_connect_failure_and_logs_out_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("#1home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("homeSessionId='late';")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_logout(&server, 1).await;

    let mut config = config(&server);
    config.request_timeout = Duration::from_millis(500);
    let coordinator = Coordinator::new(config).unwrap();

    let err = coordinator.refresh().await.unwrap_err();

    assert!(matches!(err, CoreError::StatusUnavailable { .. }));
    assert_eq!(err.kind(), Some(FailureKind::CannotConnect));
    assert_eq!(count_requests(&server, &format!("{COMMANDS}/status")).await, 0);
}

#[tokio::test]
async fn unexpected_status_carries_body() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(
        &server,
        "disarm",
        ResponseTemplate::new(500).set_body_string("boom"),
    )
    .await;

    let coordinator = coordinator(&server);
    let err = coordinator.set_alarm(AlarmCommand::Disarm).await.unwrap_err();

    assert!(
        matches!(
            err.command_error(),
            Some(tc20e_core::CommandError::UpdateFailed(UpdateFailure::UnexpectedStatus {
                status: 500,
                body,
            })) if body == "boom"
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn endless_poll_is_bounded() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(&server, "status", accepted("stuck")).await;
    Mock::given(method("GET"))
        .and(path(format!("{COMMANDS}/status/stuck/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(1, None)))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.max_poll_attempts = 3;
    let coordinator = Coordinator::new(config).unwrap();

    let err = coordinator.refresh().await.unwrap_err();

    assert!(matches!(
        err.command_error(),
        Some(tc20e_core::CommandError::UpdateFailed(UpdateFailure::PollExhausted { attempts: 3 }))
    ));
}

#[tokio::test]
async fn optimistic_state_survives_failure() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(&server, "partialarm", ResponseTemplate::new(500)).await;

    let mut config = config(&server);
    config.optimistic_state = true;
    let coordinator = Coordinator::new(config).unwrap();

    assert!(coordinator.set_alarm(AlarmCommand::Partial).await.is_err());
    assert_eq!(coordinator.alarm_status(), AlarmState::ArmedHome);
}

// ── Single-flight gate ──────────────────────────────────────────────

#[tokio::test]
async fn concurrent_commands_never_overlap_sessions() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 2).await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201).set_body_json(completion(2, Some(100))),
    )
    .await;
    mount_submit(
        &server,
        "arm",
        ResponseTemplate::new(201).set_body_json(completion(2, None)),
    )
    .await;

    let coordinator = coordinator(&server);
    let other = coordinator.clone();
    let (armed, refreshed) = tokio::join!(coordinator.set_alarm(AlarmCommand::Full), other.refresh());
    armed.unwrap();
    refreshed.unwrap();

    let requests = server.received_requests().await.unwrap();
    let mut open = 0_i32;
    for request in &requests {
        match request.url.path() {
            "/" => {
                open += 1;
                assert!(open <= 1, "second login started before logout");
            }
            "/logout" => open -= 1,
            _ => {}
        }
    }
    assert_eq!(open, 0);
    assert_eq!(count_requests(&server, "/").await, 2);
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn dropped_refresh_still_logs_out() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    mount_logout(&server, 1).await;
    mount_submit(&server, "status", accepted("slow")).await;
    mount_poll(
        &server,
        "status",
        "slow",
        ResponseTemplate::new(200).set_body_json(completion(1, None)),
    )
    .await;

    let mut config = config(&server);
    config.max_poll_attempts = 60;
    let coordinator = Coordinator::new(config).unwrap();

    // The caller gives up while the command is still polling.
    let abandoned = tokio::time::timeout(Duration::from_millis(300), coordinator.refresh()).await;
    assert!(abandoned.is_err());
    assert!(coordinator.is_busy());

    // The session runs on to its logout and only then frees the gate.
    tokio::time::timeout(Duration::from_secs(5), async {
        while coordinator.is_busy() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(count_requests(&server, "/").await, 1);
    assert_eq!(count_requests(&server, "/logout").await, 1);
}

// ── Periodic refresh ────────────────────────────────────────────────

#[tokio::test]
async fn refresh_task_publishes_state_until_cancelled() {
    let server = MockServer::start().await;
    mount_login(&server, "#1home").await;
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    mount_submit(
        &server,
        "status",
        ResponseTemplate::new(201).set_body_json(completion(2, Some(102))),
    )
    .await;

    let coordinator = coordinator(&server);
    let mut rx = coordinator.subscribe();
    let cancel = CancellationToken::new();
    let handle = coordinator.spawn_refresh(cancel.clone());

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(rx.borrow().state, AlarmState::ArmedHome);
}
