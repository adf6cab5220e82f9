use serde::{Deserialize, Serialize};
use ts_rs::TS;

use actix_web::{HttpResponse, http::StatusCode};

use crate::models::ErrorCode;

// 统一的API响应结构，错误时 message 携带原始错误文本
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    /// 错误响应的简写
    pub fn error_response(
        status: StatusCode,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> HttpResponse {
        HttpResponse::build(status).json(Self::error_empty(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_has_code_and_no_data() {
        let body = serde_json::to_value(ApiResponse::error_empty(
            ErrorCode::ClassroomArchived,
            "classroom is archived",
        ))
        .expect("serializable");
        assert_eq!(body["code"], 3002);
        assert_eq!(body["message"], "classroom is archived");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn error_response_uses_status() {
        let resp = ApiResponse::error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
            "forbidden",
        );
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
