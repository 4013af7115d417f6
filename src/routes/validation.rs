//! # 성적 검증 라우트 핸들러
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/validation/add-grade | `add_grade` | 성적 한 건 기록 |
//! | POST | /api/validation/save-session | `save_session` | 입력 목록을 세션으로 저장 |
//! | GET | /api/validation/sessions?limit= | `list_validation_sessions` | 최근 세션 목록 |
//! | GET | /api/validation/sessions/{id} | `get_validation_session` | 세션 + `details` |
//! | GET | /api/validation/statistics | `overall_statistics` | 전체 통계 |
//! | POST | /api/validation/calculate | `calculate` | 점수 분류만 (저장 없음) |
//!
//! ## 세션 저장 요청 예시
//! ```json
//! {
//!   "session_name": "Semester 1",
//!   "students_data": [
//!     { "id": "STU-100001", "avg": "15.00", "status": "Validé" },
//!     { "student_id": "STU-100002", "average": 7 }
//!   ]
//! }
//! ```

use super::{parse_session_id, ApiJson, ApiQuery, AppState, LimitQuery};
use crate::{
    db,
    error::AppError,
    models::{AddGradeRequest, CalculateRequest, SaveSessionRequest},
    services::{registry, sessions, validation},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

/// `POST /validation/add-grade`
pub async fn add_grade(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddGradeRequest>,
) -> Result<Json<Value>, AppError> {
    let status = registry::add_grade(
        &state.db,
        req.student_id.as_deref(),
        req.subject.as_deref(),
        req.grade,
        req.semester.as_deref(),
        req.academic_year.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Grade added successfully",
        "status": status,
    })))
}

/// `POST /validation/save-session`
///
/// 항목 검증이 모두 끝난 뒤에만 쓰기를 시작합니다.
pub async fn save_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let entries = sessions::validate_entries(req.students_data)?;
    let session_id = sessions::save_session(&state.db, req.session_name, entries).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Session saved successfully",
        "session_id": session_id,
    })))
}

pub async fn list_validation_sessions(
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

pub async fn get_validation_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = sessions::get_session(&state.db, parse_session_id(&id)?).await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

/// `GET /validation/statistics`: 활성 학생 수, 세션 수, 성적 집계
pub async fn overall_statistics(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let total_students = db::count_active_students(&state.db).await?;
    let total_sessions = db::count_sessions(&state.db).await?;
    let grades = db::grade_overview(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "statistics": {
            "total_students": total_students,
            "total_sessions": total_sessions,
            "grades": grades,
        },
    })))
}

/// `POST /validation/calculate`: `{ "grade": 9.5 }` → `{ "grade": 9.5, "status": "Ratt" }`
pub async fn calculate(ApiJson(req): ApiJson<CalculateRequest>) -> Result<Json<Value>, AppError> {
    let grade = req
        .grade
        .ok_or_else(|| AppError::validation("Grade is required"))?;
    let grade = validation::check_grade(grade)?;

    Ok(Json(json!({
        "success": true,
        "grade": grade,
        "status": validation::classify(grade),
    })))
}
