use super::Database;
use crate::error::AppError;
use crate::models::{GradeOverview, StudentStatistics};

/// `student_statistics` 뷰에서 학생 한 명의 통계를 조회합니다.
pub async fn student_statistics(
    db: &Database,
    student_id: &str,
) -> Result<Option<StudentStatistics>, AppError> {
    db.run_one(
        r#"
        SELECT student_id, full_name, program, total_grades, average_grade,
               valide_count, ratt_count, nv_count
        FROM student_statistics
        WHERE student_id = ?
        "#,
        &[student_id.into()],
    )
    .await
}

pub async fn count_active_students(db: &Database) -> Result<i64, AppError> {
    let (count,): (i64,) = db
        .run_one("SELECT COUNT(*) FROM students WHERE status = 'active'", &[])
        .await?
        .unwrap_or((0,));
    Ok(count)
}

pub async fn count_sessions(db: &Database) -> Result<i64, AppError> {
    let (count,): (i64,) = db
        .run_one("SELECT COUNT(*) FROM validation_sessions", &[])
        .await?
        .unwrap_or((0,));
    Ok(count)
}

/// 전체 성적의 개수, 평균, 상태별 개수
pub async fn grade_overview(db: &Database) -> Result<GradeOverview, AppError> {
    let overview = db
        .run_one(
            r#"
            SELECT COUNT(*) AS total_grades,
                   AVG(grade) AS average_grade,
                   COALESCE(SUM(CASE WHEN status = 'Validé' THEN 1 ELSE 0 END), 0) AS valide_count,
                   COALESCE(SUM(CASE WHEN status = 'Ratt' THEN 1 ELSE 0 END), 0) AS ratt_count,
                   COALESCE(SUM(CASE WHEN status = 'NV' THEN 1 ELSE 0 END), 0) AS nv_count
            FROM grades
            "#,
            &[],
        )
        .await?;

    Ok(overview.unwrap_or(GradeOverview {
        total_grades: 0,
        average_grade: None,
        valide_count: 0,
        ratt_count: 0,
        nv_count: 0,
    }))
}
