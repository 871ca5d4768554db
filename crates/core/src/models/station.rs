use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AutotestError;

/// 远程排程服务的计划类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// 订单计划
    OrderPlan,
    /// 作业计划
    JobPlan,
}

impl PlanType {
    /// 远程接口路径中的计划类型段，例如 `/orderPlan/schedule`
    pub fn path_segment(&self) -> &'static str {
        match self {
            PlanType::OrderPlan => "orderPlan",
            PlanType::JobPlan => "jobPlan",
        }
    }

    /// 请求和响应中携带计划ID的字段名
    pub fn id_field(&self) -> &'static str {
        match self {
            PlanType::OrderPlan => "orderPlanId",
            PlanType::JobPlan => "jobPlanId",
        }
    }

    /// 创建计划的接口名
    pub fn new_plan_action(&self) -> &'static str {
        match self {
            PlanType::OrderPlan => "newOrderPlan",
            PlanType::JobPlan => "newJobPlan",
        }
    }

    /// 查询全部计划的接口名
    pub fn list_action(&self) -> &'static str {
        match self {
            PlanType::OrderPlan => "getAllOrderPlans",
            PlanType::JobPlan => "getAllJobPlans",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::OrderPlan => "order_plan",
            PlanType::JobPlan => "job_plan",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = AutotestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "order_plan" | "orderPlan" | "order" => Ok(PlanType::OrderPlan),
            "job_plan" | "jobPlan" | "job" => Ok(PlanType::JobPlan),
            _ => Err(AutotestError::InvalidPlanType(value.to_string())),
        }
    }
}

/// 站点路由信息
///
/// 启动时由配置构建，之后不可变。多个站点执行器可以通过 `Arc` 同时读取，
/// 不需要任何同步。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationProfile {
    /// 站点标识，同时是数据集落地目录名，例如 `s1_plan`
    pub station_id: String,
    /// 计划类型
    pub plan_type: PlanType,
    /// 站点代码，例如 `Order`、`S1`
    pub station_code: String,
    /// 创建计划的接口路径前缀
    pub endpoint: String,
    /// 是否允许远程服务内部并行排程
    pub allow_multi_threads: bool,
    /// 告警接收人（手机号）
    pub recipients: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_type_remote_names() {
        assert_eq!(PlanType::OrderPlan.path_segment(), "orderPlan");
        assert_eq!(PlanType::OrderPlan.new_plan_action(), "newOrderPlan");
        assert_eq!(PlanType::JobPlan.id_field(), "jobPlanId");
        assert_eq!(PlanType::JobPlan.list_action(), "getAllJobPlans");
    }

    #[test]
    fn test_plan_type_parse() {
        assert_eq!("order_plan".parse::<PlanType>().unwrap(), PlanType::OrderPlan);
        assert_eq!("jobPlan".parse::<PlanType>().unwrap(), PlanType::JobPlan);
        assert!("unknown".parse::<PlanType>().is_err());
    }

    #[test]
    fn test_plan_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&PlanType::JobPlan).unwrap();
        assert_eq!(json, "\"job_plan\"");
    }
}
