//! # 학생 모델 정의
//!
//! - `Student`: `students` 테이블 한 행
//! - `StudentWithGrades`: 상세 조회 응답 (학생 + 성적 이력)
//! - `StudentFields`: 등록(POST)·수정(PUT) 요청 본문
//! - `StudentStatistics`: `student_statistics` 뷰 한 행

use super::Grade;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 학생 엔티티: DB의 `students` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    /// `STU-` + 숫자 6자리, 전역 고유
    pub student_id: String,
    pub full_name: String,
    /// 고유
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub program: String,
    /// 예: "/uploads/photos/photo-0190....png"
    pub photo_url: Option<String>,
    /// "active" 또는 "inactive"
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentWithGrades {
    #[serde(flatten)]
    pub student: Student,
    pub grades: Vec<Grade>,
}

/// 학생 등록/수정 요청 본문
///
/// 필수 필드도 `Option`으로 받습니다. 누락 시 Axum의 422 대신
/// `validate()`에서 400 Validation 에러를 돌려주기 위해서입니다.
///
/// 수정(PUT)은 부분 업데이트를 지원하지 않습니다. 빠진 선택 필드는 NULL로 덮어씁니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFields {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub program: Option<String>,
}

/// 검증을 통과한 학생 필드
#[derive(Debug, Clone, PartialEq)]
pub struct ValidStudentFields {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub program: String,
}

/// 앞뒤 공백을 제거하고, 비어 있으면 `None`
fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl StudentFields {
    /// 이름, 이메일, 전공이 비어 있으면 Validation 에러를 반환합니다.
    pub fn validate(self) -> Result<ValidStudentFields, AppError> {
        let (Some(full_name), Some(email), Some(program)) = (
            non_blank(self.full_name),
            non_blank(self.email),
            non_blank(self.program),
        ) else {
            return Err(AppError::validation(
                "Full name, email, and program are required",
            ));
        };

        Ok(ValidStudentFields {
            full_name,
            email,
            phone: non_blank(self.phone),
            date_of_birth: non_blank(self.date_of_birth),
            address: non_blank(self.address),
            program,
        })
    }
}

/// 학생별 성적 통계: `student_statistics` 뷰
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StudentStatistics {
    pub student_id: String,
    pub full_name: String,
    pub program: String,
    pub total_grades: i64,
    /// 성적이 없으면 NULL
    pub average_grade: Option<f64>,
    pub valide_count: i64,
    pub ratt_count: i64,
    pub nv_count: i64,
}
