// ==========================================
// 看板补货调度 - 计划服务协作接口
// ==========================================
// 作业自动下达后需要的三项计划动作:
// - 需求重算 (recalculate, type=jobRequirements)
// - 物料需求计划 (mrp, type=job)
// - 排程 (scheduler, mode=initial, direction=backward)
// ==========================================

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const FUNCTION_RECALCULATE: &str = "recalculate";
pub const FUNCTION_MRP: &str = "mrp";
pub const FUNCTION_SCHEDULER: &str = "scheduler";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("计划服务请求失败 ({function}): {message}")]
    Request { function: String, message: String },

    #[error("计划服务返回错误状态 ({function}): {status} {body}")]
    Status {
        function: String,
        status: u16,
        body: String,
    },
}

pub type PlanningResult<T> = Result<T, PlanningError>;

/// 计划服务请求的作业标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningTarget {
    pub job_id: String,
    pub company_id: String,
    pub user_id: String,
}

#[async_trait]
pub trait PlanningServices: Send + Sync {
    async fn recalculate_requirements(&self, target: &PlanningTarget) -> PlanningResult<()>;

    async fn run_mrp(&self, target: &PlanningTarget) -> PlanningResult<()>;

    async fn schedule_job(&self, target: &PlanningTarget) -> PlanningResult<()>;
}

// ==========================================
// NoOpPlanningServices - 未配置计划服务时使用
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct NoOpPlanningServices;

#[async_trait]
impl PlanningServices for NoOpPlanningServices {
    async fn recalculate_requirements(&self, target: &PlanningTarget) -> PlanningResult<()> {
        tracing::info!(job_id = %target.job_id, "NoOpPlanningServices: 跳过需求重算");
        Ok(())
    }

    async fn run_mrp(&self, target: &PlanningTarget) -> PlanningResult<()> {
        tracing::info!(job_id = %target.job_id, "NoOpPlanningServices: 跳过 MRP");
        Ok(())
    }

    async fn schedule_job(&self, target: &PlanningTarget) -> PlanningResult<()> {
        tracing::info!(job_id = %target.job_id, "NoOpPlanningServices: 跳过排程");
        Ok(())
    }
}

// ==========================================
// RemoteFunctionClient - HTTP 调用计划服务
// ==========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecalculateRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    company_id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest<'a> {
    job_id: &'a str,
    company_id: &'a str,
    user_id: &'a str,
    mode: &'static str,
    direction: &'static str,
}

pub struct RemoteFunctionClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteFunctionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "HTTP 客户端构建失败，使用默认配置");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn function_url(&self, function: &str) -> String {
        format!("{}/{}", self.base_url, function)
    }

    async fn invoke<B: Serialize + Sync>(&self, function: &str, body: &B) -> PlanningResult<()> {
        let url = self.function_url(function);
        tracing::debug!(function, url = %url, "调用计划服务");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PlanningError::Request {
                function: function.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlanningError::Status {
                function: function.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PlanningServices for RemoteFunctionClient {
    async fn recalculate_requirements(&self, target: &PlanningTarget) -> PlanningResult<()> {
        let body = RecalculateRequest {
            kind: "jobRequirements",
            id: &target.job_id,
            company_id: &target.company_id,
            user_id: &target.user_id,
        };
        self.invoke(FUNCTION_RECALCULATE, &body).await
    }

    async fn run_mrp(&self, target: &PlanningTarget) -> PlanningResult<()> {
        let body = RecalculateRequest {
            kind: "job",
            id: &target.job_id,
            company_id: &target.company_id,
            user_id: &target.user_id,
        };
        self.invoke(FUNCTION_MRP, &body).await
    }

    async fn schedule_job(&self, target: &PlanningTarget) -> PlanningResult<()> {
        let body = ScheduleRequest {
            job_id: &target.job_id,
            company_id: &target.company_id,
            user_id: &target.user_id,
            mode: "initial",
            direction: "backward",
        };
        self.invoke(FUNCTION_SCHEDULER, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_url_strips_trailing_slash() {
        let client = RemoteFunctionClient::new("http://localhost:54321/functions/v1/");
        assert_eq!(
            client.function_url(FUNCTION_MRP),
            "http://localhost:54321/functions/v1/mrp"
        );
    }

    #[test]
    fn test_request_bodies() {
        let body = RecalculateRequest {
            kind: "jobRequirements",
            id: "job-1",
            company_id: "C001",
            user_id: "U001",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "jobRequirements");
        assert_eq!(json["companyId"], "C001");

        let body = ScheduleRequest {
            job_id: "job-1",
            company_id: "C001",
            user_id: "U001",
            mode: "initial",
            direction: "backward",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["jobId"], "job-1");
        assert_eq!(json["direction"], "backward");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_request_error() {
        // 端口 9 (discard) 通常不可连接
        let client = RemoteFunctionClient::new("http://127.0.0.1:9");
        let target = PlanningTarget {
            job_id: "job-1".to_string(),
            company_id: "C001".to_string(),
            user_id: "U001".to_string(),
        };
        let result = client.run_mrp(&target).await;
        assert!(matches!(result, Err(PlanningError::Request { .. })));
    }
}
