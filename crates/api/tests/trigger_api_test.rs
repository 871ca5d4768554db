use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use autotest_api::{create_app, AppState};
use autotest_core::config::PlanConfig;
use autotest_dispatcher::{
    GateFailurePolicy, Orchestrator, PlanWorkflow, StationRunner, WorkflowTiming,
};
use autotest_testing_utils::{
    default_registry, RecordingNotifier, RemoteCall, ScriptedPlanService, StagingFixture,
};

struct TestApp {
    app: Router,
    fixture: StagingFixture,
    service: Arc<ScriptedPlanService>,
    notifier: Arc<RecordingNotifier>,
    orchestrator: Arc<Orchestrator>,
}

fn create_test_app() -> TestApp {
    let fixture = StagingFixture::new();
    let service = Arc::new(ScriptedPlanService::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let registry = Arc::new(default_registry());

    let timing = WorkflowTiming {
        busy_gate_interval: Duration::from_millis(1),
        progress_interval: Duration::from_millis(1),
        gate_policy: GateFailurePolicy::FailOpen,
    };
    let workflow = Arc::new(PlanWorkflow::new(
        service.clone(),
        notifier.clone(),
        PlanConfig::default(),
        timing,
    ));
    let runner = Arc::new(StationRunner::new(
        registry.clone(),
        workflow,
        fixture.workspace_root(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        registry.clone(),
        runner,
        fixture.staging_root(),
    ));

    let app = create_app(AppState {
        orchestrator: orchestrator.clone(),
        registry,
    });

    TestApp {
        app,
        fixture,
        service,
        notifier,
        orchestrator,
    }
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let test_app = create_test_app();

    let (status, body) = send(&test_app.app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stations"], 5);
    assert_eq!(body["in_flight"], 0);
}

#[tokio::test]
async fn test_monthly_trigger_launches_staged_stations() {
    let test_app = create_test_app();
    test_app.fixture.add_run("order_plan", "run1");
    test_app.fixture.add_run("s1_plan", "run1");

    let (status, body) = send(&test_app.app, "POST", "/autotest/monthly").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stage"], "monthly");
    assert_eq!(body["data"]["launched"], 2);

    test_app.orchestrator.wait_idle().await;
    assert_eq!(test_app.notifier.count(), 2);
}

#[tokio::test]
async fn test_monthly_trigger_with_nothing_staged() {
    let test_app = create_test_app();

    let (status, body) = send(&test_app.app, "POST", "/autotest/monthly").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["launched"], 0);
    test_app.orchestrator.wait_idle().await;
    assert_eq!(test_app.notifier.count(), 0);
}

#[tokio::test]
async fn test_push_trigger_filters_plan_type_and_forwards_image() {
    let test_app = create_test_app();
    test_app.fixture.add_run("order_plan", "run1");
    test_app.fixture.add_run("t1_plan", "run1");

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/autotest/push/job_plan?image_name=aps%3A2.4.0",
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["stage"], "push");
    assert_eq!(body["data"]["launched"], 1);

    test_app.orchestrator.wait_idle().await;
    assert_eq!(test_app.service.count_for("Order", "new_plan"), 0);

    let payload = test_app
        .service
        .calls_for("T1")
        .into_iter()
        .find_map(|call| match call {
            RemoteCall::NewPlan { payload, .. } => Some(payload),
            _ => None,
        })
        .unwrap();
    assert_eq!(payload["imageName"], "aps:2.4.0");
    assert_eq!(payload["autoTestStage"], "push");
}

#[tokio::test]
async fn test_push_trigger_requires_image_name() {
    let test_app = create_test_app();
    test_app.fixture.add_run("order_plan", "run1");

    let (status, body) = send(&test_app.app, "POST", "/autotest/push/order_plan").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("image_name"));
    assert_eq!(test_app.orchestrator.in_flight(), 0);
}

#[tokio::test]
async fn test_push_trigger_rejects_unknown_plan_type() {
    let test_app = create_test_app();

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/autotest/push/weekly_plan?image_name=aps:1",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("weekly_plan"));
}

#[tokio::test]
async fn test_merge_trigger() {
    let test_app = create_test_app();
    test_app.fixture.add_run("d2_plan", "run1");

    let (status, body) = send(&test_app.app, "POST", "/autotest/merge").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["stage"], "merge");
    assert_eq!(body["data"]["launched"], 1);

    test_app.orchestrator.wait_idle().await;
    assert!(test_app.notifier.messages()[0].contains("TestD2"));
}

#[tokio::test]
async fn test_trigger_requires_post() {
    let test_app = create_test_app();

    let response = test_app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/autotest/monthly")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
