//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러를 `AppError` 하나로 모읍니다.
//!
//! | variant | 의미 | HTTP |
//! |---------|------|------|
//! | `Validation` | 잘못되었거나 누락된 입력 | 400 |
//! | `NotFound` | 존재하지 않는 학생/세션 | 404 |
//! | `Conflict` | 중복 이메일 | 409 |
//! | `Database` / `Io` | 저장소(DB, 사진 디렉토리) 실패 | 500 |
//! | `Internal` | 그 밖의 예상하지 못한 오류 | 500 |
//!
//! 모든 에러 응답의 본문은 `{ "success": false, "error": "..." }` 형태입니다.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 `IntoResponse`를 호출하여 JSON 에러 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 입력 검증 실패 (HTTP 400). 쓰기 작업 전에 감지됩니다.
    #[error("{0}")]
    Validation(String),

    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("{0}")]
    NotFound(String),

    /// 리소스 충돌 (HTTP 409)
    #[error("{0}")]
    Conflict(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// `?`로 sqlx::Error가 그대로 전파됩니다. 재시도하지 않습니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 사진 저장소 입출력 오류 (HTTP 500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    /// 이 에러가 변환될 HTTP 상태 코드
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// 요청 본문/쿼리 파싱 실패는 모두 400 Validation으로 통일합니다.
// (Axum 기본값은 415/422와 일반 텍스트 본문)
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(err.body_text())
    }
}

impl IntoResponse for AppError {
    /// 내부 에러(Database, Io, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg,
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                "An IO error occurred".to_string()
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
