// ==========================================
// 看板补货调度 - API层错误类型
// ==========================================
// 职责: 汇总 HTTP 层可见的错误
// 约定: 调度接口始终返回 200 + {data, error}, 错误文案即 Display
// ==========================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::kanban_api::DispatchResponse;
use crate::engine::DispatchError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 缺少操作身份（公司 / 用户）
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Dispatch(e) => e.code(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(DispatchResponse::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            ApiError::from(DispatchError::MissingSupplier).to_string(),
            "Kanban does not have a supplier"
        );
        assert_eq!(ApiError::from(DispatchError::KanbanNotActive).code(), "KANBAN_NOT_ACTIVE");
    }

    #[tokio::test]
    async fn test_error_response_is_ok_with_message() {
        use http_body_util::BodyExt;

        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"data": null, "error": "Unauthorized"}));
    }
}
