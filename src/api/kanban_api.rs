// ==========================================
// 看板补货调度 - 看板调度接口
// ==========================================
// GET /api/kanban/{id}
// 身份: 上游网关注入 x-company-id / x-user-id
// 响应: 始终 200, { "data": 跳转路径|null, "error": 错误文案|null }
// ==========================================

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::SharedState;
use crate::engine::DispatchContext;

pub const HEADER_COMPANY_ID: &str = "x-company-id";
pub const HEADER_USER_ID: &str = "x-user-id";

/// 调度结果: data 与 error 恰有一个非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub data: Option<String>,
    pub error: Option<String>,
}

impl DispatchResponse {
    pub fn success(path: String) -> Self {
        Self {
            data: Some(path),
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            data: None,
            error: Some(message),
        }
    }
}

impl From<ApiResult<String>> for DispatchResponse {
    fn from(result: ApiResult<String>) -> Self {
        match result {
            Ok(path) => DispatchResponse::success(path),
            Err(e) => DispatchResponse::failure(e.to_string()),
        }
    }
}

/// 请求身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub company_id: String,
    pub user_id: String,
}

impl RequestIdentity {
    pub fn from_headers(headers: &HeaderMap) -> ApiResult<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        match (read(HEADER_COMPANY_ID), read(HEADER_USER_ID)) {
            (Some(company_id), Some(user_id)) => Ok(Self {
                company_id,
                user_id,
            }),
            _ => Err(ApiError::Unauthorized),
        }
    }

    pub fn into_context(self) -> DispatchContext {
        DispatchContext::new(self.company_id, self.user_id)
    }
}

/// 执行一次调度（JSON 接口与 UI 壳页面共用）
pub async fn dispatch_kanban(state: &SharedState, kanban_id: &str, headers: &HeaderMap) -> ApiResult<String> {
    let result: ApiResult<String> = async {
        let ctx = RequestIdentity::from_headers(headers)?.into_context();
        Ok(state.dispatcher.dispatch(kanban_id, &ctx).await?)
    }
    .await;

    if let Err(e) = &result {
        tracing::debug!(kanban_id, code = e.code(), "调度请求返回错误");
    }
    result
}

/// 错误经 ApiError::into_response 转为 200 + {data: null, error}
pub async fn get_kanban_dispatch(
    State(state): State<SharedState>,
    Path(kanban_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<DispatchResponse>> {
    let path = dispatch_kanban(&state, &kanban_id, &headers).await?;
    Ok(Json(DispatchResponse::success(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_COMPANY_ID, HeaderValue::from_static("C001"));
        assert!(matches!(
            RequestIdentity::from_headers(&headers),
            Err(ApiError::Unauthorized)
        ));

        headers.insert(HEADER_USER_ID, HeaderValue::from_static("  "));
        assert!(RequestIdentity::from_headers(&headers).is_err());

        headers.insert(HEADER_USER_ID, HeaderValue::from_static("U001"));
        let identity = RequestIdentity::from_headers(&headers).unwrap();
        assert_eq!(identity.company_id, "C001");
        assert_eq!(identity.user_id, "U001");
    }

    #[test]
    fn test_response_serialization() {
        let json = serde_json::to_value(DispatchResponse::success("/x/job/1".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"data": "/x/job/1", "error": null}));

        let json = serde_json::to_value(DispatchResponse::from(Err::<String, _>(ApiError::Unauthorized)))
            .unwrap();
        assert_eq!(json, serde_json::json!({"data": null, "error": "Unauthorized"}));
    }
}
