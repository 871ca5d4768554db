//! 远程排程服务HTTP客户端
//!
//! 所有接口都是 `POST` + JSON，响应统一为 `{code, message, data}`：
//! `code == 0` 表示成功并返回 `data`，否则归一化为 [`RemoteError::Api`]。
//! 客户端本身不做重试。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use autotest_core::{
    PlanHandle, PlanService, PlanType, RemoteError, RemoteResult, ScheduleOptions,
};

/// 忙碌检查时筛选的进度状态
const COMPUTING_PROGRESS: &str = "computing";

/// 远程服务响应信封
#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn into_result(self) -> RemoteResult<Value> {
        if self.code == 0 {
            Ok(self.data)
        } else {
            Err(RemoteError::api(self.code, self.message))
        }
    }
}

/// 远程排程服务客户端
#[derive(Debug, Clone)]
pub struct RemoteApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 调用远程接口并解析响应信封
    pub async fn call(&self, endpoint: &str, payload: &Value) -> RemoteResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("调用远程接口: url={}", url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        let envelope: ResponseEnvelope = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("{url} (HTTP {status}): {e}")))?;

        envelope.into_result().inspect_err(|e| {
            warn!("远程接口返回失败: url={}, error={}", url, e);
        })
    }

    /// 查询该计划类型下指定状态的全部计划，不区分站点
    pub async fn list_plans(
        &self,
        plan_type: PlanType,
        progress: &[&str],
    ) -> RemoteResult<Vec<Value>> {
        let endpoint = format!("/{}/{}", plan_type.path_segment(), plan_type.list_action());
        let data = self.call(&endpoint, &json!({ "progress": progress })).await?;
        extract_list(data)
    }

    fn plan_endpoint(plan_type: PlanType, action: &str) -> String {
        format!("/{}/{}", plan_type.path_segment(), action)
    }

    fn plan_body(plan_type: PlanType, handle: &PlanHandle) -> Value {
        json!({ plan_type.id_field(): handle.as_value() })
    }
}

#[async_trait]
impl PlanService for RemoteApiClient {
    async fn new_plan(
        &self,
        plan_type: PlanType,
        endpoint: &str,
        payload: &Value,
    ) -> RemoteResult<PlanHandle> {
        let endpoint = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            plan_type.new_plan_action()
        );
        let data = self.call(&endpoint, payload).await?;

        match data.get(plan_type.id_field()) {
            Some(id) if !id.is_null() => Ok(PlanHandle::new(id.clone())),
            _ => Err(RemoteError::Decode(format!(
                "创建计划响应缺少字段 {}",
                plan_type.id_field()
            ))),
        }
    }

    async fn schedule(
        &self,
        plan_type: PlanType,
        handle: &PlanHandle,
        options: &ScheduleOptions,
    ) -> RemoteResult<()> {
        let mut body = Self::plan_body(plan_type, handle);
        body["allowMultiThreads"] = json!(options.allow_multi_threads);
        body["autoTestStage"] = json!(options.stage.as_str());
        if let Some(image_name) = &options.image_name {
            body["imageName"] = json!(image_name);
        }

        self.call(&Self::plan_endpoint(plan_type, "schedule"), &body)
            .await
            .map(|_| ())
    }

    async fn get_progress(&self, plan_type: PlanType, handle: &PlanHandle) -> RemoteResult<u8> {
        let data = self
            .call(
                &Self::plan_endpoint(plan_type, "getScheduleStatus"),
                &Self::plan_body(plan_type, handle),
            )
            .await?;

        let progress = data
            .get("progress")
            .and_then(Value::as_f64)
            .ok_or_else(|| RemoteError::Decode("排程进度响应缺少字段 progress".to_string()))?;

        Ok(progress.clamp(0.0, 100.0) as u8)
    }

    async fn get_scheduled_jobs(
        &self,
        plan_type: PlanType,
        handle: &PlanHandle,
    ) -> RemoteResult<Vec<Value>> {
        let data = self
            .call(
                &Self::plan_endpoint(plan_type, "getScheduledJobs"),
                &Self::plan_body(plan_type, handle),
            )
            .await?;
        extract_list(data)
    }

    async fn is_busy(&self, plan_type: PlanType, station_code: &str) -> RemoteResult<bool> {
        let plans = self.list_plans(plan_type, &[COMPUTING_PROGRESS]).await?;
        if !plans.is_empty() {
            debug!(
                station = station_code,
                plan_type = %plan_type,
                computing = plans.len(),
                "同类型计划正在排程"
            );
        }
        Ok(!plans.is_empty())
    }
}

/// 列表类响应可能直接是数组，也可能包在 `list` 字段里
fn extract_list(data: Value) -> RemoteResult<Vec<Value>> {
    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("list") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(RemoteError::Decode(format!("list字段不是数组: {other}"))),
        },
        other => Err(RemoteError::Decode(format!("期望列表响应: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_returns_data() {
        let envelope: ResponseEnvelope =
            serde_json::from_value(json!({"code": 0, "message": "ok", "data": {"progress": 40}}))
                .unwrap();
        assert_eq!(envelope.into_result().unwrap(), json!({"progress": 40}));
    }

    #[test]
    fn test_envelope_failure_keeps_code_and_message() {
        let envelope: ResponseEnvelope =
            serde_json::from_value(json!({"code": 500, "message": "busy"})).unwrap();
        assert_eq!(
            envelope.into_result().unwrap_err(),
            RemoteError::api(500, "busy")
        );
    }

    #[test]
    fn test_extract_list_shapes() {
        assert!(extract_list(Value::Null).unwrap().is_empty());
        assert_eq!(extract_list(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(extract_list(json!({"list": [1], "total": 1})).unwrap().len(), 1);
        assert!(extract_list(json!({"total": 0})).unwrap().is_empty());
        assert!(extract_list(json!("oops")).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RemoteApiClient::new("http://aps.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://aps.test");
    }
}
