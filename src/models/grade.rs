use super::lenient;
use serde::{Deserialize, Serialize};

/// `grades` 테이블 한 행. 생성 후에는 바뀌지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grade {
    pub id: i64,
    pub student_id: String,
    pub subject: String,
    pub grade: f64,
    pub status: String,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct AddGradeRequest {
    pub student_id: Option<String>,
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub grade: Option<f64>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub grade: Option<f64>,
}

/// 전체 성적 통계
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GradeOverview {
    pub total_grades: i64,
    pub average_grade: Option<f64>,
    pub valide_count: i64,
    pub ratt_count: i64,
    pub nv_count: i64,
}
