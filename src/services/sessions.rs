//! # 세션 저장 워크플로
//!
//! 교사가 입력한 학생 목록을 하나의 검증 세션으로 저장합니다.
//!
//! ## 처리 흐름
//! 1. 입력 검증: 목록이 비어 있지 않은지, 각 항목의 ID/평균/상태가 올바른지
//! 2. `aggregate()`로 상태별 개수 계산
//! 3. 트랜잭션 안에서 세션 행 1개 + 상세 행 N개 삽입
//!
//! 3단계의 어느 INSERT가 실패해도 트랜잭션 전체가 롤백되므로
//! 일부만 저장된 세션은 보이지 않습니다.

use crate::db::{self, Database};
use crate::error::AppError;
use crate::models::{SessionEntry, SessionEntryInput, SessionWithDetails};
use crate::services::validation::{aggregate, check_grade, classify, Status};

/// 입력 항목 하나를 검증합니다.
///
/// `status`가 없으면 평균으로 계산하고, 있으면 분류 결과와 같아야 합니다.
pub fn validate_entry(index: usize, input: SessionEntryInput) -> Result<SessionEntry, AppError> {
    let position = index + 1;

    let student_id = input
        .student_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation(format!("Student #{} is missing an id", position)))?;

    let average = input
        .average
        .ok_or_else(|| AppError::validation(format!("Student #{} is missing an average", position)))
        .and_then(|avg| {
            check_grade(avg).map_err(|_| {
                AppError::validation(format!(
                    "Student #{} average must be between 0 and 20",
                    position
                ))
            })
        })?;

    let expected = classify(average);
    if let Some(label) = input.status.as_deref() {
        let given: Status = label.parse()?;
        if given != expected {
            return Err(AppError::validation(format!(
                "Student #{} status {} does not match average {} ({})",
                position, given, average, expected
            )));
        }
    }

    Ok(SessionEntry {
        student_id,
        average,
        status: expected,
    })
}

/// 요청 본문의 `students_data` 전체를 검증합니다. 하나라도 틀리면 아무것도 쓰지 않습니다.
pub fn validate_entries(inputs: Option<Vec<SessionEntryInput>>) -> Result<Vec<SessionEntry>, AppError> {
    let inputs = inputs
        .filter(|list| !list.is_empty())
        .ok_or_else(|| AppError::validation("Invalid students data"))?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| validate_entry(i, input))
        .collect()
}

/// 이름을 지정하지 않은 세션의 기본 이름
pub fn default_session_name() -> String {
    format!("Session {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
}

/// 세션을 저장하고 생성된 세션 ID를 반환합니다.
pub async fn save_session(
    db: &Database,
    session_name: Option<String>,
    entries: Vec<SessionEntry>,
) -> Result<i64, AppError> {
    if entries.is_empty() {
        return Err(AppError::validation("Invalid students data"));
    }

    let summary = aggregate(entries.iter().map(|e| e.status));
    let session_name = session_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(default_session_name);

    let session_id = db
        .with_transaction(move |tx| {
            Box::pin(async move {
                let session_id = db::insert_session(tx, &session_name, &summary).await?;
                for entry in &entries {
                    db::insert_session_detail(tx, session_id, entry).await?;
                }
                Ok::<_, AppError>(session_id)
            })
        })
        .await?;

    tracing::info!(
        session_id,
        total = summary.total,
        valide = summary.valide,
        ratt = summary.ratt,
        nv = summary.nv,
        "Validation session saved"
    );
    Ok(session_id)
}

/// 세션과 상세 행을 조회합니다. 없으면 NotFound.
pub async fn get_session(db: &Database, id: i64) -> Result<SessionWithDetails, AppError> {
    let session = db::get_session(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Session not found"))?;
    let details = db::list_session_details(db, id).await?;
    Ok(SessionWithDetails { session, details })
}

pub async fn delete_session(db: &Database, id: i64) -> Result<(), AppError> {
    if !db::delete_session(db, id).await? {
        return Err(AppError::not_found("Session not found"));
    }
    tracing::info!(session_id = id, "Validation session deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    fn input(id: &str, avg: f64, status: Option<&str>) -> SessionEntryInput {
        SessionEntryInput {
            student_id: Some(id.to_string()),
            average: Some(avg),
            status: status.map(str::to_string),
        }
    }

    async fn row_counts(db: &Database) -> (i64, i64) {
        let (sessions,): (i64,) = db
            .run_one("SELECT COUNT(*) FROM validation_sessions", &[])
            .await
            .unwrap()
            .unwrap();
        let (details,): (i64,) = db
            .run_one("SELECT COUNT(*) FROM session_details", &[])
            .await
            .unwrap()
            .unwrap();
        (sessions, details)
    }

    #[tokio::test]
    async fn saves_counts_and_details() {
        let db = memory_db().await;
        let entries = validate_entries(Some(vec![
            input("STU-100001", 15.0, Some("Validé")),
            input("STU-100002", 7.0, Some("NV")),
        ]))
        .unwrap();

        let id = save_session(&db, Some("Semester 1".into()), entries).await.unwrap();
        let saved = get_session(&db, id).await.unwrap();

        assert_eq!(saved.session.session_name, "Semester 1");
        assert_eq!(saved.session.total_students, 2);
        assert_eq!(saved.session.valide_count, 1);
        assert_eq!(saved.session.ratt_count, 0);
        assert_eq!(saved.session.nv_count, 1);
        assert_eq!(saved.details.len(), 2);
        assert_eq!(saved.details[0].status, "Validé");
        assert_eq!(saved.details[1].average_grade, 7.0);
        assert!(saved.details.iter().all(|d| d.full_name.is_none()));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_writes() {
        let db = memory_db().await;
        assert!(matches!(validate_entries(Some(vec![])), Err(AppError::Validation(_))));
        assert!(matches!(validate_entries(None), Err(AppError::Validation(_))));
        assert!(matches!(
            save_session(&db, None, vec![]).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn failure_on_second_detail_rolls_back_everything() {
        let db = memory_db().await;
        db.execute(
            r#"
            CREATE TRIGGER fail_second_detail BEFORE INSERT ON session_details
            WHEN (SELECT COUNT(*) FROM session_details WHERE session_id = NEW.session_id) >= 1
            BEGIN
                SELECT RAISE(ABORT, 'injected failure');
            END
            "#,
            &[],
        )
        .await
        .unwrap();

        let entries = validate_entries(Some(vec![
            input("STU-100001", 12.0, None),
            input("STU-100002", 9.0, None),
            input("STU-100003", 3.0, None),
        ]))
        .unwrap();

        let err = save_session(&db, Some("Doomed".into()), entries).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn default_name_is_timestamped() {
        let db = memory_db().await;
        let entries = validate_entries(Some(vec![input("x", 10.0, None)])).unwrap();
        let id = save_session(&db, Some("   ".into()), entries).await.unwrap();
        let saved = get_session(&db, id).await.unwrap();
        assert!(saved.session.session_name.starts_with("Session "));
    }

    #[test]
    fn status_is_derived_or_checked() {
        let derived = validate_entry(0, input("a", 9.5, None)).unwrap();
        assert_eq!(derived.status, Status::Ratt);

        let mismatch = validate_entry(0, input("a", 9.5, Some("Validé")));
        assert!(matches!(mismatch, Err(AppError::Validation(_))));

        let unknown = validate_entry(0, input("a", 9.5, Some("Other")));
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let out_of_range = validate_entry(0, input("a", 21.0, None));
        assert!(matches!(out_of_range, Err(AppError::Validation(_))));

        let no_id = validate_entry(0, input("  ", 12.0, None));
        assert!(matches!(no_id, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn details_join_current_registry_best_effort() {
        let db = memory_db().await;
        db.execute(
            "INSERT INTO students (student_id, full_name, email, program) VALUES ('STU-100001', 'Amina K.', 'amina@example.com', 'CS')",
            &[],
        )
        .await
        .unwrap();

        let entries = validate_entries(Some(vec![
            input("STU-100001", 14.0, None),
            input("STU-555555", 8.0, None),
        ]))
        .unwrap();
        let id = save_session(&db, None, entries).await.unwrap();

        let saved = get_session(&db, id).await.unwrap();
        assert_eq!(saved.details[0].full_name.as_deref(), Some("Amina K."));
        assert_eq!(saved.details[1].full_name, None);

        db.execute("DELETE FROM students WHERE student_id = 'STU-100001'", &[])
            .await
            .unwrap();
        let after = get_session(&db, id).await.unwrap();
        assert_eq!(after.details.len(), 2);
        assert_eq!(after.details[0].full_name, None);
    }

    #[tokio::test]
    async fn delete_cascades_and_reports_missing() {
        let db = memory_db().await;
        let entries = validate_entries(Some(vec![input("x", 10.0, None)])).unwrap();
        let id = save_session(&db, None, entries).await.unwrap();

        delete_session(&db, id).await.unwrap();
        assert_eq!(row_counts(&db).await, (0, 0));
        assert!(matches!(delete_session(&db, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(get_session(&db, id).await, Err(AppError::NotFound(_))));
    }
}
