//! Mock implementations of the service traits
//!
//! In-memory test doubles for [`PlanService`] and [`Notifier`] that record every
//! call, so tests can assert on call order and message content without a real
//! remote scheduling service.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use autotest_core::{
    Notifier, PlanHandle, PlanService, PlanType, RemoteError, RemoteResult, ScheduleOptions,
};

/// A recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    NewPlan {
        station_code: String,
        plan_type: PlanType,
        endpoint: String,
        payload: Value,
    },
    IsBusy {
        station_code: String,
        plan_type: PlanType,
    },
    Schedule {
        station_code: String,
        handle: PlanHandle,
        options: ScheduleOptions,
    },
    GetProgress {
        station_code: String,
        handle: PlanHandle,
    },
    GetScheduledJobs {
        station_code: String,
        handle: PlanHandle,
    },
}

impl RemoteCall {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteCall::NewPlan { .. } => "new_plan",
            RemoteCall::IsBusy { .. } => "is_busy",
            RemoteCall::Schedule { .. } => "schedule",
            RemoteCall::GetProgress { .. } => "get_progress",
            RemoteCall::GetScheduledJobs { .. } => "get_scheduled_jobs",
        }
    }

    pub fn station_code(&self) -> &str {
        match self {
            RemoteCall::NewPlan { station_code, .. }
            | RemoteCall::IsBusy { station_code, .. }
            | RemoteCall::Schedule { station_code, .. }
            | RemoteCall::GetProgress { station_code, .. }
            | RemoteCall::GetScheduledJobs { station_code, .. } => station_code,
        }
    }
}

/// Scripted responses for one station
///
/// The default script succeeds on every call: progress 100 on the first poll
/// and one scheduled job. Busy checks answer from `busy` while it has entries.
#[derive(Debug, Clone)]
pub struct StationScript {
    pub new_plan: RemoteResult<()>,
    /// Consumed front to back; once exhausted the answer is whether any plan of
    /// the same type is computing
    pub busy: VecDeque<RemoteResult<bool>>,
    pub schedule: RemoteResult<()>,
    /// Consumed front to back; `Ok(progress_fallback)` once exhausted
    pub progress: VecDeque<RemoteResult<u8>>,
    pub progress_fallback: u8,
    pub jobs: RemoteResult<Vec<Value>>,
}

impl Default for StationScript {
    fn default() -> Self {
        Self {
            new_plan: Ok(()),
            busy: VecDeque::new(),
            schedule: Ok(()),
            progress: VecDeque::new(),
            progress_fallback: 100,
            jobs: Ok(vec![json!({"jobId": 1, "machine": "M01"})]),
        }
    }
}

impl StationScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_busy(mut self, responses: Vec<RemoteResult<bool>>) -> Self {
        self.busy = responses.into();
        self
    }

    pub fn with_progress(mut self, values: Vec<u8>) -> Self {
        self.progress = values.into_iter().map(Ok).collect();
        self
    }

    pub fn with_progress_results(mut self, results: Vec<RemoteResult<u8>>) -> Self {
        self.progress = results.into();
        self
    }

    /// Progress returned after the scripted values run out
    pub fn with_progress_fallback(mut self, progress: u8) -> Self {
        self.progress_fallback = progress;
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<Value>) -> Self {
        self.jobs = Ok(jobs);
        self
    }

    pub fn failing_new_plan(mut self, code: i64, message: &str) -> Self {
        self.new_plan = Err(RemoteError::api(code, message));
        self
    }

    pub fn failing_schedule(mut self, code: i64, message: &str) -> Self {
        self.schedule = Err(RemoteError::api(code, message));
        self
    }

    pub fn failing_jobs(mut self, error: RemoteError) -> Self {
        self.jobs = Err(error);
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    scripts: HashMap<String, StationScript>,
    handles: HashMap<String, String>,
    /// Scheduled plans whose progress has not reached 100 yet
    computing: HashMap<String, PlanType>,
    next_id: u64,
    calls: Vec<RemoteCall>,
}

impl ScriptState {
    fn script(&mut self, station_code: &str) -> &mut StationScript {
        self.scripts.entry(station_code.to_string()).or_default()
    }

    fn station_for(&self, handle: &PlanHandle) -> String {
        self.handles
            .get(&handle.to_string())
            .cloned()
            .unwrap_or_default()
    }
}

/// Scripted [`PlanService`] keyed by station code
///
/// The station code is read from the `stationCode` field of the new-plan
/// payload; later calls are attributed to it through the returned handle.
/// A plan counts as computing from a successful `schedule` until a poll
/// reports 100 or fails, mirroring the remote service's plan list.
#[derive(Debug, Default)]
pub struct ScriptedPlanService {
    state: Mutex<ScriptState>,
}

impl ScriptedPlanService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, station_code: &str, script: StationScript) -> Self {
        self.set_script(station_code, script);
        self
    }

    pub fn set_script(&self, station_code: &str, script: StationScript) {
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(station_code.to_string(), script);
    }

    /// Change the fallback progress of a running script, e.g. to release a
    /// workflow that is polling indefinitely
    pub fn set_progress_fallback(&self, station_code: &str, progress: u8) {
        let mut state = self.state.lock().unwrap();
        state.script(station_code).progress_fallback = progress;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, station_code: &str) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.station_code() == station_code)
            .collect()
    }

    pub fn call_kinds_for(&self, station_code: &str) -> Vec<&'static str> {
        self.calls_for(station_code)
            .iter()
            .map(RemoteCall::kind)
            .collect()
    }

    pub fn count_for(&self, station_code: &str, kind: &str) -> usize {
        self.calls_for(station_code)
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Number of plans currently computing
    pub fn computing_count(&self) -> usize {
        self.state.lock().unwrap().computing.len()
    }
}

#[async_trait]
impl PlanService for ScriptedPlanService {
    async fn new_plan(
        &self,
        plan_type: PlanType,
        endpoint: &str,
        payload: &Value,
    ) -> RemoteResult<PlanHandle> {
        let station_code = payload
            .get("stationCode")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::NewPlan {
            station_code: station_code.clone(),
            plan_type,
            endpoint: endpoint.to_string(),
            payload: payload.clone(),
        });
        state.script(&station_code).new_plan.clone()?;

        state.next_id += 1;
        let handle = PlanHandle::new(json!(state.next_id));
        state.handles.insert(handle.to_string(), station_code);
        Ok(handle)
    }

    async fn schedule(
        &self,
        plan_type: PlanType,
        handle: &PlanHandle,
        options: &ScheduleOptions,
    ) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        let station_code = state.station_for(handle);
        state.calls.push(RemoteCall::Schedule {
            station_code: station_code.clone(),
            handle: handle.clone(),
            options: options.clone(),
        });
        state.script(&station_code).schedule.clone()?;
        state.computing.insert(handle.to_string(), plan_type);
        Ok(())
    }

    async fn get_progress(&self, _plan_type: PlanType, handle: &PlanHandle) -> RemoteResult<u8> {
        let mut state = self.state.lock().unwrap();
        let station_code = state.station_for(handle);
        state.calls.push(RemoteCall::GetProgress {
            station_code: station_code.clone(),
            handle: handle.clone(),
        });
        let script = state.script(&station_code);
        let fallback = script.progress_fallback;
        let result = script.progress.pop_front().unwrap_or(Ok(fallback));
        if !matches!(result, Ok(progress) if progress < 100) {
            state.computing.remove(&handle.to_string());
        }
        result
    }

    async fn get_scheduled_jobs(
        &self,
        _plan_type: PlanType,
        handle: &PlanHandle,
    ) -> RemoteResult<Vec<Value>> {
        let mut state = self.state.lock().unwrap();
        let station_code = state.station_for(handle);
        state.calls.push(RemoteCall::GetScheduledJobs {
            station_code: station_code.clone(),
            handle: handle.clone(),
        });
        state.script(&station_code).jobs.clone()
    }

    async fn is_busy(&self, plan_type: PlanType, station_code: &str) -> RemoteResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::IsBusy {
            station_code: station_code.to_string(),
            plan_type,
        });
        if let Some(scripted) = state.script(station_code).busy.pop_front() {
            return scripted;
        }
        Ok(state.computing.values().any(|t| *t == plan_type))
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub message: String,
    pub recipients: Vec<String>,
}

/// [`Notifier`] that keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.message).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Wait until at least `count` notifications have been delivered
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.count() >= count
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, recipients: &[String]) {
        self.sent.lock().unwrap().push(SentNotification {
            message: message.to_string(),
            recipients: recipients.to_vec(),
        });
    }
}
