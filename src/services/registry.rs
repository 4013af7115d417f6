//! # 학생 등록부 워크플로
//!
//! 학생 등록/수정/삭제와 성적 입력을 담당합니다.
//! 라우트 핸들러는 요청을 파싱한 뒤 이 모듈의 함수를 호출합니다.
//!
//! ## 에러 규칙
//! - 필수 필드 누락, 범위 밖 점수 → `Validation` (쓰기 전에 검사)
//! - 없는 학생 → `NotFound`
//! - 다른 학생이 이미 쓰는 이메일 → `Conflict`

use crate::db::{self, Database};
use crate::error::AppError;
use crate::models::{StudentFields, StudentStatistics, StudentWithGrades};
use crate::services::photos::{PhotoStore, UploadedPhoto};
use crate::services::validation::{check_grade, classify, Status};

/// 과목을 지정하지 않은 성적의 과목 이름
pub const DEFAULT_SUBJECT: &str = "General";

const DUPLICATE_EMAIL: &str = "Email already exists";

/// UNIQUE 제약 위반을 Conflict로 바꿉니다. 사전 검사와 INSERT 사이의 경합을 덮습니다.
fn unique_violation_as_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(sqlx::Error::Database(ref e)) if e.is_unique_violation() => {
            AppError::conflict(DUPLICATE_EMAIL)
        }
        other => other,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 학생을 등록하고 할당된 학생 ID를 반환합니다.
///
/// 사진이 있으면 먼저 파일로 저장하고, INSERT가 실패하면 파일을 다시 지웁니다.
pub async fn register(
    db: &Database,
    photos: &PhotoStore,
    fields: StudentFields,
    photo: Option<UploadedPhoto>,
) -> Result<String, AppError> {
    let fields = fields.validate()?;
    if let Some(photo) = &photo {
        photo.checked_extension()?;
    }

    if db::find_by_email(db, &fields.email).await?.is_some() {
        return Err(AppError::conflict(DUPLICATE_EMAIL));
    }

    let photo_url = match &photo {
        Some(photo) => Some(photos.save(photo).await?),
        None => None,
    };

    match db::insert_student(db, &fields, photo_url.as_deref()).await {
        Ok(student_id) => {
            tracing::info!(%student_id, email = %fields.email, "Student registered");
            Ok(student_id)
        }
        Err(err) => {
            if let Some(url) = &photo_url {
                if let Err(cleanup) = photos.remove(url).await {
                    tracing::warn!("Failed to remove orphaned photo {}: {}", url, cleanup);
                }
            }
            Err(unique_violation_as_conflict(err))
        }
    }
}

/// 학생 정보를 전부 덮어씁니다. 사진과 상태는 바꾸지 않습니다.
pub async fn update(db: &Database, student_id: &str, fields: StudentFields) -> Result<(), AppError> {
    let fields = fields.validate()?;

    if db::get_student(db, student_id).await?.is_none() {
        return Err(AppError::not_found("Student not found"));
    }

    if let Some(owner) = db::find_by_email(db, &fields.email).await? {
        if owner.student_id != student_id {
            return Err(AppError::conflict(DUPLICATE_EMAIL));
        }
    }

    let updated = db::update_student(db, student_id, &fields)
        .await
        .map_err(unique_violation_as_conflict)?;
    if !updated {
        return Err(AppError::not_found("Student not found"));
    }

    tracing::info!(%student_id, "Student updated");
    Ok(())
}

/// 학생을 삭제합니다. 사진 파일을 먼저 지우고(이미 없으면 무시) 행을 삭제합니다.
/// 성적은 cascade로 함께 삭제됩니다.
pub async fn delete(db: &Database, photos: &PhotoStore, student_id: &str) -> Result<(), AppError> {
    let student = db::get_student(db, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    if let Some(url) = student.photo_url.as_deref() {
        photos.remove(url).await?;
    }

    if !db::delete_student(db, student_id).await? {
        return Err(AppError::not_found("Student not found"));
    }

    tracing::info!(%student_id, "Student deleted");
    Ok(())
}

/// 성적 한 건을 기록하고 분류된 상태를 반환합니다.
pub async fn add_grade(
    db: &Database,
    student_id: Option<&str>,
    subject: Option<&str>,
    grade: Option<f64>,
    semester: Option<&str>,
    academic_year: Option<&str>,
) -> Result<Status, AppError> {
    let student_id = non_blank(student_id)
        .ok_or_else(|| AppError::validation("Student ID and grade are required"))?;
    let grade = grade.ok_or_else(|| AppError::validation("Student ID and grade are required"))?;
    let grade = check_grade(grade)?;

    if db::get_student(db, student_id).await?.is_none() {
        return Err(AppError::not_found("Student not found"));
    }

    let subject = non_blank(subject).unwrap_or(DEFAULT_SUBJECT);

    let status = classify(grade);
    db::insert_grade(
        db,
        student_id,
        subject,
        grade,
        status,
        non_blank(semester),
        non_blank(academic_year),
    )
    .await?;

    tracing::debug!(%student_id, grade, %status, "Grade recorded");
    Ok(status)
}

/// 학생과 성적 이력(최신순)
pub async fn get_student_with_grades(
    db: &Database,
    student_id: &str,
) -> Result<StudentWithGrades, AppError> {
    let student = db::get_student(db, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;
    let grades = db::list_grades(db, student_id).await?;
    Ok(StudentWithGrades { student, grades })
}

pub async fn statistics(db: &Database, student_id: &str) -> Result<StudentStatistics, AppError> {
    db::student_statistics(db, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store() -> (PhotoStore, PathBuf) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("gradebook-registry-{}", nanos));
        (PhotoStore::new(&root), root)
    }

    fn amina() -> StudentFields {
        StudentFields {
            full_name: Some("Amina K.".into()),
            email: Some("amina@example.com".into()),
            program: Some("CS".into()),
            ..Default::default()
        }
    }

    async fn student_count(db: &Database) -> i64 {
        let (n,): (i64,) = db
            .run_one("SELECT COUNT(*) FROM students", &[])
            .await
            .unwrap()
            .unwrap();
        n
    }

    #[tokio::test]
    async fn amina_scenario() {
        let db = memory_db().await;
        let (photos, _) = temp_store();

        let id = register(&db, &photos, amina(), None).await.unwrap();
        assert!(id.starts_with("STU-"));
        assert_eq!(id.len(), 10);
        assert!(id[4..].chars().all(|c| c.is_ascii_digit()));

        let status = add_grade(&db, Some(&id), None, Some(9.0), None, None).await.unwrap();
        assert_eq!(status, Status::Ratt);

        let detail = get_student_with_grades(&db, &id).await.unwrap();
        assert_eq!(detail.grades.len(), 1);
        assert_eq!(detail.grades[0].subject, DEFAULT_SUBJECT);
        assert_eq!(detail.grades[0].status, "Ratt");

        let stats = statistics(&db, &id).await.unwrap();
        assert_eq!(stats.total_grades, 1);
        assert_eq!(stats.ratt_count, 1);
        assert_eq!(stats.average_grade, Some(9.0));
    }

    #[tokio::test]
    async fn deleted_student_id_is_not_reused_by_later_registrations() {
        let db = memory_db().await;
        let (photos, _) = temp_store();

        let first = register(&db, &photos, amina(), None).await.unwrap();
        let session_id = crate::services::sessions::save_session(
            &db,
            Some("Semester 1".into()),
            vec![crate::models::SessionEntry {
                student_id: first.clone(),
                average: 12.0,
                status: Status::Valide,
            }],
        )
        .await
        .unwrap();
        delete(&db, &photos, &first).await.unwrap();

        let bob = StudentFields {
            full_name: Some("Bob Other".into()),
            email: Some("bob@example.com".into()),
            program: Some("Math".into()),
            ..Default::default()
        };
        let second = register(&db, &photos, bob, None).await.unwrap();
        assert_ne!(first, second);

        let session = crate::services::sessions::get_session(&db, session_id).await.unwrap();
        assert_eq!(session.details.len(), 1);
        assert_eq!(session.details[0].student_id, first);
        assert_eq!(session.details[0].full_name, None);
    }

    #[tokio::test]
    async fn bad_photo_is_rejected_before_the_email_check() {
        let db = memory_db().await;
        let (photos, root) = temp_store();
        register(&db, &photos, amina(), None).await.unwrap();

        let gif = UploadedPhoto {
            file_name: "me.gif".into(),
            content_type: Some("image/gif".into()),
            bytes: vec![1, 2, 3],
        };
        let err = register(&db, &photos, amina(), Some(gif)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(student_count(&db).await, 1);
        assert!(!root.join("photos").exists());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_and_writes_nothing() {
        let db = memory_db().await;
        let (photos, _) = temp_store();
        register(&db, &photos, amina(), None).await.unwrap();

        let mut again = amina();
        again.full_name = Some("Someone Else".into());
        let err = register(&db, &photos, again, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(student_count(&db).await, 1);
    }

    #[tokio::test]
    async fn missing_required_fields_fail_before_any_write() {
        let db = memory_db().await;
        let (photos, _) = temp_store();
        let mut fields = amina();
        fields.program = None;
        assert!(matches!(
            register(&db, &photos, fields, None).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(student_count(&db).await, 0);
    }

    #[tokio::test]
    async fn delete_cascades_grades_and_removes_photo() {
        let db = memory_db().await;
        let (photos, root) = temp_store();
        let photo = UploadedPhoto {
            file_name: "me.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };

        let id = register(&db, &photos, amina(), Some(photo)).await.unwrap();
        let url = db::get_student(&db, &id).await.unwrap().unwrap().photo_url.unwrap();
        let path = photos.path_for(&url).unwrap();
        assert!(path.exists());

        add_grade(&db, Some(&id), Some("Math"), Some(14.0), Some("S1"), Some("2024-2025"))
            .await
            .unwrap();
        add_grade(&db, Some(&id), Some("Physics"), Some(0.0), None, None).await.unwrap();

        delete(&db, &photos, &id).await.unwrap();
        assert!(!path.exists());
        assert!(db::list_grades(&db, &id).await.unwrap().is_empty());
        assert!(matches!(
            delete(&db, &photos, &id).await,
            Err(AppError::NotFound(_))
        ));

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn delete_tolerates_missing_photo_file() {
        let db = memory_db().await;
        let (photos, _) = temp_store();
        db.execute(
            "INSERT INTO students (student_id, full_name, email, program, photo_url) \
             VALUES ('STU-100001', 'A', 'a@example.com', 'CS', '/uploads/photos/photo-gone.png')",
            &[],
        )
        .await
        .unwrap();

        delete(&db, &photos, "STU-100001").await.unwrap();
        assert_eq!(student_count(&db).await, 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_photo() {
        let db = memory_db().await;
        let (photos, root) = temp_store();
        db.execute(
            "INSERT INTO students (student_id, full_name, email, program) VALUES ('STU-999999', 'X', 'x@example.com', 'CS')",
            &[],
        )
        .await
        .unwrap();

        let photo = UploadedPhoto {
            file_name: "me.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        };
        let err = register(&db, &photos, amina(), Some(photo)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let leftovers = std::fs::read_dir(photos.dir()).unwrap().count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn update_checks_existence_and_email_owner() {
        let db = memory_db().await;
        let (photos, _) = temp_store();
        let first = register(&db, &photos, amina(), None).await.unwrap();
        let second = register(
            &db,
            &photos,
            StudentFields {
                full_name: Some("Bilal".into()),
                email: Some("bilal@example.com".into()),
                program: Some("Math".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        // 자기 이메일을 그대로 두는 수정은 허용
        let mut same = amina();
        same.phone = Some("0600000000".into());
        update(&db, &first, same).await.unwrap();

        let mut stolen = amina();
        stolen.full_name = Some("Bilal".into());
        assert!(matches!(
            update(&db, &second, stolen).await,
            Err(AppError::Conflict(_))
        ));

        assert!(matches!(
            update(&db, "STU-000001", amina()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn add_grade_rejects_bad_input() {
        let db = memory_db().await;
        let (photos, _) = temp_store();
        let id = register(&db, &photos, amina(), None).await.unwrap();

        assert!(matches!(
            add_grade(&db, Some(&id), None, Some(20.5), None, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            add_grade(&db, Some(&id), None, None, None, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            add_grade(&db, Some("STU-000001"), None, Some(12.0), None, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(db::list_grades(&db, &id).await.unwrap().is_empty());
    }
}
