//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 라우터 구성을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `students`: 학생 등록부 CRUD와 학생별 통계
//! - `validation`: 성적 입력, 세션 저장, 분류 계산, 전체 통계
//! - `sessions`: 저장된 세션 조회/삭제
//! - `health`: 서버 상태 확인 (헬스체크)
//!
//! 모든 응답 본문은 `{ "success": true, ... }` 또는 `{ "success": false, "error": "..." }`입니다.

pub mod health;
pub mod sessions;
pub mod students;
pub mod validation;

pub use health::*;
pub use sessions::*;
pub use students::*;
pub use validation::*;

use crate::{db::Database, error::AppError, services::PhotoStore};
use axum::{
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// 요청 본문 최대 크기. 사진(2 MiB)과 텍스트 필드가 들어갈 여유를 둡니다.
pub const BODY_LIMIT_BYTES: usize = 3 * 1024 * 1024;

/// 세션 목록의 기본 개수
pub const DEFAULT_SESSION_LIMIT: i64 = 50;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
#[derive(Clone)]
pub struct AppState {
    /// 저장소 게이트웨이 (내부적으로 Arc로 공유되는 풀)
    pub db: Database,
    /// 학생 사진 저장소
    pub photos: PhotoStore,
}

/// `axum::Json`과 같지만 파싱 실패를 `AppError`(400, JSON 본문)로 돌려줍니다.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query`와 같지만 파싱 실패를 `AppError`로 돌려줍니다.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `?limit=N` 쿼리. 숫자가 아니거나 1보다 작으면 기본값을 씁니다.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SESSION_LIMIT)
    }
}

/// 세션 ID 경로 파라미터. 숫자가 아니면 그런 세션은 없는 것으로 봅니다.
pub(crate) fn parse_session_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::not_found("Session not found"))
}

/// `/api` 라우트, `/uploads` 정적 파일, CORS와 요청 로깅을 묶은 라우터
///
/// 프론트엔드 정적 파일(fallback)은 `main`에서 붙입니다.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.photos.root());

    let api_routes = Router::new()
        // 학생 등록부
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/{id}/statistics", get(student_statistics))
        // 성적 검증
        .route("/validation/add-grade", post(add_grade))
        .route("/validation/save-session", post(save_session))
        .route("/validation/sessions", get(list_validation_sessions))
        .route("/validation/sessions/{id}", get(get_validation_session))
        .route("/validation/statistics", get(overall_statistics))
        .route("/validation/calculate", post(calculate))
        // 세션 관리
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/health", get(health_check))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
