//! 远程排程服务接口定义
//!
//! 计划工作流只通过 [`PlanService`] 访问远程排程服务，
//! 生产环境由基于 reqwest 的客户端实现，测试中使用脚本化的替身。

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RemoteResult;
use crate::models::{PlanHandle, PlanType, ScheduleOptions};

/// 远程排程服务
///
/// 所有方法都只调用一次远程接口，不做任何自动重试；
/// 重试和轮询策略由工作流层决定。
#[async_trait]
pub trait PlanService: Send + Sync {
    /// 创建计划，返回远程计划ID
    async fn new_plan(
        &self,
        plan_type: PlanType,
        endpoint: &str,
        payload: &Value,
    ) -> RemoteResult<PlanHandle>;

    /// 触发异步排程
    async fn schedule(
        &self,
        plan_type: PlanType,
        handle: &PlanHandle,
        options: &ScheduleOptions,
    ) -> RemoteResult<()>;

    /// 查询排程进度，取值 0..=100
    async fn get_progress(&self, plan_type: PlanType, handle: &PlanHandle) -> RemoteResult<u8>;

    /// 查询排程结果
    async fn get_scheduled_jobs(
        &self,
        plan_type: PlanType,
        handle: &PlanHandle,
    ) -> RemoteResult<Vec<Value>>;

    /// 查询该计划类型是否有任何计划正处于计算中
    ///
    /// 同一计划类型同时只允许一个远程排程，因此不按站点过滤；
    /// `station_code` 是发起检查的站点，仅用于日志。
    /// 查询失败时返回错误，由忙碌闸门按策略决定如何处理。
    async fn is_busy(&self, plan_type: PlanType, station_code: &str) -> RemoteResult<bool>;
}
