use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use autotest::{Application, ShutdownManager};
use autotest_core::config::AppConfig;
use autotest_testing_utils::{FakeHttpServer, FakeRemoteService, FakeWebhook, StagingFixture};

struct RunningApp {
    app: Arc<Application>,
    address: String,
    shutdown: ShutdownManager,
    handle: JoinHandle<anyhow::Result<()>>,
    _remote_server: FakeHttpServer,
    _webhook_server: FakeHttpServer,
}

impl RunningApp {
    async fn start(
        fixture: &StagingFixture,
        remote: &FakeRemoteService,
        webhook: &FakeWebhook,
    ) -> Self {
        let remote_server = remote.spawn().await;
        let webhook_server = webhook.spawn().await;

        let mut config = AppConfig::default();
        config.remote.base_url = remote_server.base_url();
        config.notifier.webhook_url = Some(webhook_server.url("/webhook"));
        config.staging.staging_root = fixture.staging_root();
        config.staging.workspace_root = fixture.workspace_root();
        config.polling.busy_gate_interval_seconds = 1;
        config.polling.progress_interval_seconds = 1;
        config.validate().unwrap();

        let app = Arc::new(Application::new(config).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let shutdown = ShutdownManager::new();
        let shutdown_rx = shutdown.subscribe().await;
        let handle = {
            let app = app.clone();
            tokio::spawn(async move { app.serve(listener, shutdown_rx).await })
        };

        Self {
            app,
            address,
            shutdown,
            handle,
            _remote_server: remote_server,
            _webhook_server: webhook_server,
        }
    }

    async fn post(&self, path: &str) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}{}", self.address, path))
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn stop(self) {
        self.shutdown.shutdown().await;
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_monthly_trigger_drives_remote_and_notifies() {
    let fixture = StagingFixture::new();
    fixture.add_run("order_plan", "run1");
    fixture.add_run("s1_plan", "run1");
    let remote = FakeRemoteService::new();
    let webhook = FakeWebhook::new();
    let running = RunningApp::start(&fixture, &remote, &webhook).await;

    let (status, body) = running.post("/autotest/monthly").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["launched"], 2);

    running.app.orchestrator().wait_idle().await;

    let contents = webhook.contents();
    assert_eq!(contents.len(), 2);
    assert!(contents.iter().any(|c| c.contains("站点: Order") && c.contains("排程成功")));
    assert!(contents.iter().any(|c| c.contains("站点: S1") && c.contains("排程成功")));

    assert_eq!(
        remote.requests_to("newOrderPlan")[0].path,
        "/orderPlan/newOrderPlan"
    );
    assert_eq!(remote.requests_to("newJobPlan")[0].path, "/jobPlan/newJobPlan");
    assert_eq!(remote.requests_to("schedule").len(), 2);
    assert_eq!(remote.requests_to("getScheduledJobs").len(), 2);

    // 数据集已复制到站点工作区
    assert!(fixture.workspace_file("s1_plan", "config.json").exists());

    running.stop().await;
}

#[tokio::test]
async fn test_push_failure_is_reported_through_webhook() {
    let fixture = StagingFixture::new();
    fixture.add_run("d1_plan", "run1");
    let remote = FakeRemoteService::new().failing("schedule", 1001, "station locked");
    let webhook = FakeWebhook::new();
    let running = RunningApp::start(&fixture, &remote, &webhook).await;

    let (status, body) = running
        .post("/autotest/push/job_plan?image_name=aps:5.0.1")
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["launched"], 1);

    running.app.orchestrator().wait_idle().await;

    let contents = webhook.contents();
    assert_eq!(contents.len(), 1);
    assert!(contents[0].contains("触发排程失败"));
    assert!(contents[0].contains("station locked"));
    assert!(contents[0].contains("aps:5.0.1"));
    assert!(remote.requests_to("getScheduleStatus").is_empty());

    let schedule = &remote.requests_to("schedule")[0];
    assert_eq!(schedule.body["imageName"], "aps:5.0.1");
    assert_eq!(schedule.body["autoTestStage"], "push");

    running.stop().await;
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_stations() {
    let fixture = StagingFixture::new();
    fixture.add_run("t1_plan", "run1");
    let remote = FakeRemoteService::new().with_progress(&[40]);
    let webhook = FakeWebhook::new();
    let running = RunningApp::start(&fixture, &remote, &webhook).await;

    let (status, _) = running.post("/autotest/merge").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    running.stop().await;

    assert_eq!(webhook.contents().len(), 1);
    assert_eq!(remote.requests_to("getScheduleStatus").len(), 2);
}

#[tokio::test]
async fn test_bad_push_request_launches_nothing() {
    let fixture = StagingFixture::new();
    fixture.add_run("order_plan", "run1");
    let remote = FakeRemoteService::new();
    let webhook = FakeWebhook::new();
    let running = RunningApp::start(&fixture, &remote, &webhook).await;

    let (status, body) = running.post("/autotest/push/order_plan").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    running.app.orchestrator().wait_idle().await;
    assert!(remote.requests().is_empty());
    assert!(webhook.received().is_empty());

    running.stop().await;
}

#[tokio::test]
async fn test_published_batch_is_picked_up_by_next_trigger() {
    let fixture = StagingFixture::new();
    let batch = fixture.root().join("upload");
    for run in ["run1", "run2"] {
        std::fs::create_dir_all(batch.join(run)).unwrap();
        std::fs::write(batch.join(run).join("config.json"), run).unwrap();
        std::fs::write(batch.join(run).join("snapshot.h5"), run).unwrap();
    }
    let remote = FakeRemoteService::new();
    let webhook = FakeWebhook::new();
    let running = RunningApp::start(&fixture, &remote, &webhook).await;

    let runs = running.app.publish_dataset("d2_plan", &batch).await.unwrap();
    assert_eq!(runs, 2);
    assert!(running.app.publish_dataset("x9_plan", &batch).await.is_err());

    let (status, body) = running.post("/autotest/merge").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["launched"], 1);

    running.app.orchestrator().wait_idle().await;
    let contents = webhook.contents();
    assert_eq!(contents.len(), 2);
    assert!(contents.iter().all(|c| c.contains("站点: D2")));

    running.stop().await;
}
