//! # 학생 등록부 쿼리 모듈
//!
//! `students` 테이블에 대한 CRUD 쿼리입니다.
//!
//! ## 학생 ID 할당
//! `STU-` + 숫자 6자리 형식을 유지하면서, 무작위 추첨 대신 단조 증가 카운터를 씁니다.
//! 카운터(`student_id_seq`)는 지금까지 쓰인 가장 큰 번호이고, 삽입 트리거가 올리며 삭제로는 줄지 않습니다.
//! 따라서 지운 학생의 ID는 다시 할당되지 않습니다.
//! 첫 번호는 `STU-100001`, 마지막은 `STU-999999`입니다.

use super::{Database, Param};
use crate::error::AppError;
use crate::models::{Student, ValidStudentFields};

const STUDENT_COLUMNS: &str = "student_id, full_name, email, phone, date_of_birth, address, \
                               program, photo_url, status, created_at";

/// 학생 목록을 조회합니다.
///
/// - 검색어가 없으면: 최근 등록순
/// - 검색어가 있으면: 이름/이메일/학생 ID 부분 일치, 이름순
pub async fn list_students(db: &Database, search: Option<&str>) -> Result<Vec<Student>, AppError> {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{}%", term);
            db.run(
                &format!(
                    "SELECT {} FROM students \
                     WHERE full_name LIKE ? OR email LIKE ? OR student_id LIKE ? \
                     ORDER BY full_name",
                    STUDENT_COLUMNS
                ),
                &[pattern.as_str().into(), pattern.as_str().into(), pattern.into()],
            )
            .await
        }
        None => {
            db.run(
                &format!(
                    "SELECT {} FROM students ORDER BY created_at DESC, rowid DESC",
                    STUDENT_COLUMNS
                ),
                &[],
            )
            .await
        }
    }
}

/// 학생 ID로 한 명을 조회합니다.
pub async fn get_student(db: &Database, student_id: &str) -> Result<Option<Student>, AppError> {
    db.run_one(
        &format!("SELECT {} FROM students WHERE student_id = ?", STUDENT_COLUMNS),
        &[student_id.into()],
    )
    .await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Student>, AppError> {
    db.run_one(
        &format!("SELECT {} FROM students WHERE email = ?", STUDENT_COLUMNS),
        &[email.into()],
    )
    .await
}

/// 새 학생을 저장하고 할당된 학생 ID를 반환합니다.
///
/// 번호 계산, INSERT, 카운터 갱신(트리거)이 한 문장 안에서 원자적으로 실행됩니다.
/// 번호가 소진되면(`STU-999999` 이후) 아무 행도 삽입되지 않고 Internal 에러를 반환합니다.
pub async fn insert_student(
    db: &Database,
    fields: &ValidStudentFields,
    photo_url: Option<&str>,
) -> Result<String, AppError> {
    let inserted: Vec<(String,)> = db
        .run(
            r#"
            INSERT INTO students (student_id, full_name, email, phone, date_of_birth, address, program, photo_url)
            SELECT printf('STU-%06d', next_id), ?, ?, ?, ?, ?, ?, ?
            FROM (SELECT last_id + 1 AS next_id FROM student_id_seq WHERE id = 1)
            WHERE next_id <= 999999
            RETURNING student_id
            "#,
            &[
                Param::from(&fields.full_name),
                Param::from(&fields.email),
                Param::from(fields.phone.as_deref()),
                Param::from(fields.date_of_birth.as_deref()),
                Param::from(fields.address.as_deref()),
                Param::from(&fields.program),
                Param::from(photo_url),
            ],
        )
        .await?;

    inserted
        .into_iter()
        .next()
        .map(|(id,)| id)
        .ok_or_else(|| AppError::Internal("Student ID space exhausted".to_string()))
}

/// 학생 정보를 전부 덮어씁니다 (PUT, 부분 업데이트 없음).
///
/// ## 반환값
/// - `true`: 수정됨
/// - `false`: 해당 학생 없음
pub async fn update_student(
    db: &Database,
    student_id: &str,
    fields: &ValidStudentFields,
) -> Result<bool, AppError> {
    let result = db
        .execute(
            r#"
            UPDATE students
            SET full_name = ?, email = ?, phone = ?, date_of_birth = ?, address = ?, program = ?
            WHERE student_id = ?
            "#,
            &[
                Param::from(&fields.full_name),
                Param::from(&fields.email),
                Param::from(fields.phone.as_deref()),
                Param::from(fields.date_of_birth.as_deref()),
                Param::from(fields.address.as_deref()),
                Param::from(&fields.program),
                Param::from(student_id),
            ],
        )
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 학생을 삭제합니다. 성적은 `ON DELETE CASCADE`로 함께 삭제됩니다.
pub async fn delete_student(db: &Database, student_id: &str) -> Result<bool, AppError> {
    let result = db
        .execute("DELETE FROM students WHERE student_id = ?", &[student_id.into()])
        .await?;

    Ok(result.rows_affected() > 0)
}
