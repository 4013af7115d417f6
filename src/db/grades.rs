use super::{Database, Param};
use crate::error::AppError;
use crate::models::Grade;
use crate::services::validation::Status;

/// 학생의 성적 이력을 최신순으로 조회합니다.
pub async fn list_grades(db: &Database, student_id: &str) -> Result<Vec<Grade>, AppError> {
    db.run(
        r#"
        SELECT id, student_id, subject, grade, status, semester, academic_year, created_at
        FROM grades
        WHERE student_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
        &[student_id.into()],
    )
    .await
}

/// 성적 한 건을 저장하고 생성된 ID를 반환합니다.
pub async fn insert_grade(
    db: &Database,
    student_id: &str,
    subject: &str,
    grade: f64,
    status: Status,
    semester: Option<&str>,
    academic_year: Option<&str>,
) -> Result<i64, AppError> {
    let result = db
        .execute(
            r#"
            INSERT INTO grades (student_id, subject, grade, status, semester, academic_year)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            &[
                Param::from(student_id),
                Param::from(subject),
                Param::from(grade),
                Param::from(status.as_str()),
                Param::from(semester),
                Param::from(academic_year),
            ],
        )
        .await?;

    Ok(result.last_insert_rowid())
}
