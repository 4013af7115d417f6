//! # 검증 세션 쿼리 모듈
//!
//! `validation_sessions`와 `session_details`에 대한 쿼리입니다.
//!
//! 세션 저장은 여러 INSERT로 이루어지므로, 쓰기 함수는 풀 대신
//! 트랜잭션 핸들(`Tx`)을 받습니다. 트랜잭션 경계는 `services::sessions`가 정합니다.

use super::{Database, Param, Tx};
use crate::error::AppError;
use crate::models::{SessionDetail, SessionEntry, ValidationSession};
use crate::services::validation::Summary;

/// 세션 행을 삽입하고 생성된 세션 ID를 반환합니다.
pub async fn insert_session(tx: &mut Tx, session_name: &str, summary: &Summary) -> Result<i64, AppError> {
    let result = tx
        .execute(
            r#"
            INSERT INTO validation_sessions (session_name, total_students, valide_count, ratt_count, nv_count)
            VALUES (?, ?, ?, ?, ?)
            "#,
            &[
                Param::from(session_name),
                Param::from(summary.total),
                Param::from(summary.valide),
                Param::from(summary.ratt),
                Param::from(summary.nv),
            ],
        )
        .await?;

    Ok(result.last_insert_rowid())
}

/// 세션 상세 한 행을 삽입합니다.
pub async fn insert_session_detail(
    tx: &mut Tx,
    session_id: i64,
    entry: &SessionEntry,
) -> Result<(), AppError> {
    tx.execute(
        r#"
        INSERT INTO session_details (session_id, student_id, average_grade, status)
        VALUES (?, ?, ?, ?)
        "#,
        &[
            Param::from(session_id),
            Param::from(&entry.student_id),
            Param::from(entry.average),
            Param::from(entry.status.as_str()),
        ],
    )
    .await?;

    Ok(())
}

/// 최근 세션부터 최대 `limit`개를 조회합니다.
pub async fn list_sessions(db: &Database, limit: i64) -> Result<Vec<ValidationSession>, AppError> {
    db.run(
        r#"
        SELECT id, session_name, total_students, valide_count, ratt_count, nv_count, created_at
        FROM validation_sessions
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
        &[limit.into()],
    )
    .await
}

pub async fn get_session(db: &Database, id: i64) -> Result<Option<ValidationSession>, AppError> {
    db.run_one(
        r#"
        SELECT id, session_name, total_students, valide_count, ratt_count, nv_count, created_at
        FROM validation_sessions
        WHERE id = ?
        "#,
        &[id.into()],
    )
    .await
}

/// 세션 상세를 현재 등록부와 LEFT JOIN 하여 조회합니다.
///
/// 등록부에 없는 학생도 결과에 남고, 이름/이메일만 NULL이 됩니다.
pub async fn list_session_details(db: &Database, session_id: i64) -> Result<Vec<SessionDetail>, AppError> {
    db.run(
        r#"
        SELECT sd.id, sd.session_id, sd.student_id, sd.average_grade, sd.status, sd.created_at,
               s.full_name, s.email
        FROM session_details sd
        LEFT JOIN students s ON sd.student_id = s.student_id
        WHERE sd.session_id = ?
        ORDER BY sd.id
        "#,
        &[session_id.into()],
    )
    .await
}

/// 세션을 삭제합니다. 상세 행은 `ON DELETE CASCADE`로 함께 삭제됩니다.
pub async fn delete_session(db: &Database, id: i64) -> Result<bool, AppError> {
    let result = db
        .execute("DELETE FROM validation_sessions WHERE id = ?", &[id.into()])
        .await?;

    Ok(result.rows_affected() > 0)
}
