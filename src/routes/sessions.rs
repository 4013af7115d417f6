//! # 세션 관리 라우트 핸들러
//!
//! 저장된 검증 세션을 조회하고 삭제합니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/sessions?limit= | `list_sessions` | 최근 세션 목록 (기본 50개) |
//! | GET | /api/sessions/{id} | `get_session` | 세션 + `students` |
//! | DELETE | /api/sessions/{id} | `delete_session` | 세션과 상세 행 삭제 |
//!
//! `/api/validation/sessions/{id}`와 같은 데이터를 돌려주지만, 상세 행은 `students` 키 아래에 있습니다.

use super::{parse_session_id, ApiQuery, AppState, LimitQuery};
use crate::{db, error::AppError, services::sessions};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

pub async fn list_sessions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Value>, AppError> {
    let sessions = db::list_sessions(&state.db, query.limit()).await?;
    Ok(Json(json!({
        "success": true,
        "count": sessions.len(),
        "sessions": sessions,
    })))
}

/// 존재하지 않는 세션은 404
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = sessions::get_session(&state.db, parse_session_id(&id)?).await?;
    Ok(Json(json!({
        "success": true,
        "session": session.as_students(),
    })))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    sessions::delete_session(&state.db, parse_session_id(&id)?).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Session deleted successfully",
    })))
}
