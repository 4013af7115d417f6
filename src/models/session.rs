//! # 검증 세션 모델 정의
//!
//! 세션은 교사가 한 번에 입력한 학생 목록의 평가 결과입니다.
//!
//! ## 구조체 역할
//! - `ValidationSession`: `validation_sessions` 한 행 (미리 계산된 개수 포함)
//! - `SessionDetail`: `session_details` 한 행 + 현재 등록부의 이름/이메일 (LEFT JOIN)
//! - `SaveSessionRequest` / `SessionEntryInput`: 저장 요청 본문
//! - `SessionEntry`: 검증을 통과한 학생 한 명의 결과

use super::lenient;
use crate::services::validation::Status;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValidationSession {
    pub id: i64,
    pub session_name: String,
    pub total_students: i64,
    pub valide_count: i64,
    pub ratt_count: i64,
    pub nv_count: i64,
    pub created_at: String,
}

/// 세션 상세 행
///
/// 학생이 나중에 등록부에서 삭제되었거나, 입력 화면에서 만든 임시 ID라면
/// `full_name`과 `email`은 `None`입니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionDetail {
    pub id: i64,
    pub session_id: i64,
    pub student_id: String,
    pub average_grade: f64,
    pub status: String,
    pub created_at: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// `/api/validation/sessions/{id}` 응답: 세션 필드 + `details`
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithDetails {
    #[serde(flatten)]
    pub session: ValidationSession,
    pub details: Vec<SessionDetail>,
}

/// `/api/sessions/{id}` 응답: 같은 데이터를 `students` 키로 내보냅니다.
#[derive(Debug, Serialize)]
pub struct SessionWithStudents<'a> {
    #[serde(flatten)]
    pub session: &'a ValidationSession,
    pub students: &'a [SessionDetail],
}

impl SessionWithDetails {
    pub fn as_students(&self) -> SessionWithStudents<'_> {
        SessionWithStudents {
            session: &self.session,
            students: &self.details,
        }
    }
}

/// `POST /api/validation/save-session` 요청 본문
#[derive(Debug, Deserialize)]
pub struct SaveSessionRequest {
    pub session_name: Option<String>,
    pub students_data: Option<Vec<SessionEntryInput>>,
}

/// 저장 요청의 학생 한 명
///
/// 입력 화면은 `id`/`avg`로, 다른 클라이언트는 `student_id`/`average`로 보냅니다.
/// 그 밖의 필드(name, subject, timestamp 등)는 무시합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionEntryInput {
    #[serde(alias = "id")]
    pub student_id: Option<String>,
    #[serde(alias = "avg", default, deserialize_with = "lenient::option_f64")]
    pub average: Option<f64>,
    pub status: Option<String>,
}

/// 검증된 세션 항목. `status`는 항상 `classify(average)`와 같습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEntry {
    pub student_id: String,
    pub average: f64,
    pub status: Status,
}
