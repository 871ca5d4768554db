//! In-process HTTP servers for integration tests
//!
//! [`FakeRemoteService`] imitates the remote scheduling service's JSON
//! envelope API; [`FakeWebhook`] records chat-bot webhook deliveries.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// An axum router served on an ephemeral local port
pub struct FakeHttpServer {
    address: SocketAddr,
    handle: JoinHandle<()>,
}

impl FakeHttpServer {
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let address = listener.local_addr().expect("failed to read local addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self { address, handle }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl Drop for FakeHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A request received by one of the fake servers
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequest {
    pub path: String,
    pub body: Value,
}

#[derive(Debug)]
struct RemoteState {
    next_id: u64,
    progress: VecDeque<u8>,
    progress_fallback: u8,
    jobs: Value,
    computing: Value,
    failures: HashMap<String, (i64, String)>,
    requests: Vec<ReceivedRequest>,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            next_id: 0,
            progress: VecDeque::new(),
            progress_fallback: 100,
            jobs: json!({"list": [{"jobId": 1}], "total": 1}),
            computing: json!({"list": [], "total": 0}),
            failures: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

/// Fake remote scheduling service
///
/// Every route is `POST` and answers with `{code, message, data}`. Responses
/// are chosen by the last path segment (the action name), so any station
/// endpoint prefix is accepted.
#[derive(Debug, Clone, Default)]
pub struct FakeRemoteService {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemoteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(self, values: &[u8]) -> Self {
        self.state.lock().unwrap().progress = values.iter().copied().collect();
        self
    }

    pub fn with_jobs(self, jobs: Value) -> Self {
        self.state.lock().unwrap().jobs = jobs;
        self
    }

    /// Data returned by the plan-list action used for busy checks
    pub fn with_computing(self, plans: Value) -> Self {
        self.state.lock().unwrap().computing = plans;
        self
    }

    /// Make an action answer with a non-zero code
    pub fn failing(self, action: &str, code: i64, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(action.to_string(), (code, message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, action: &str) -> Vec<ReceivedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.rsplit('/').next() == Some(action))
            .collect()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/{*path}", post(handle_remote))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> FakeHttpServer {
        FakeHttpServer::spawn(self.router()).await
    }
}

async fn handle_remote(
    State(service): State<FakeRemoteService>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Json<Value> {
    let path = uri.path().to_string();
    let action = path.rsplit('/').next().unwrap_or_default().to_string();

    let mut state = service.state.lock().unwrap();
    state.requests.push(ReceivedRequest {
        path: path.clone(),
        body,
    });

    if let Some((code, message)) = state.failures.get(&action) {
        return Json(json!({"code": code, "message": message, "data": null}));
    }

    let data = match action.as_str() {
        "newOrderPlan" => {
            state.next_id += 1;
            json!({"orderPlanId": state.next_id})
        }
        "newJobPlan" => {
            state.next_id += 1;
            json!({"jobPlanId": state.next_id})
        }
        "schedule" => Value::Null,
        "getScheduleStatus" => {
            let fallback = state.progress_fallback;
            json!({"progress": state.progress.pop_front().unwrap_or(fallback)})
        }
        "getScheduledJobs" => state.jobs.clone(),
        "getAllOrderPlans" | "getAllJobPlans" => state.computing.clone(),
        _ => return Json(json!({"code": 404, "message": format!("unknown action {action}")})),
    };

    Json(json!({"code": 0, "message": "success", "data": data}))
}

/// Recording chat-bot webhook
#[derive(Debug, Clone)]
pub struct FakeWebhook {
    received: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
    errcode: i64,
}

impl Default for FakeWebhook {
    fn default() -> Self {
        Self {
            received: Arc::default(),
            status: StatusCode::OK,
            errcode: 0,
        }
    }
}

impl FakeWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_errcode(mut self, errcode: i64) -> Self {
        self.errcode = errcode;
        self
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Text contents of every delivered message
    pub fn contents(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|m| m["text"]["content"].as_str().map(str::to_string))
            .collect()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handle_webhook))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> FakeHttpServer {
        FakeHttpServer::spawn(self.router()).await
    }
}

async fn handle_webhook(
    State(webhook): State<FakeWebhook>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    webhook.received.lock().unwrap().push(body);
    let errmsg = if webhook.errcode == 0 { "ok" } else { "invalid webhook" };
    (
        webhook.status,
        Json(json!({"errcode": webhook.errcode, "errmsg": errmsg})),
    )
}
