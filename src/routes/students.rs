//! # 학생 등록부 라우트 핸들러
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/students?search= | `list_students` | 목록 / 검색 |
//! | POST | /api/students | `create_student` | 등록 (JSON 또는 multipart + 사진) |
//! | GET | /api/students/{id} | `get_student` | 학생 + 성적 이력 |
//! | PUT | /api/students/{id} | `update_student` | 전체 덮어쓰기 |
//! | DELETE | /api/students/{id} | `delete_student` | 삭제 (사진, 성적 포함) |
//! | GET | /api/students/{id}/statistics | `student_statistics` | 학생별 통계 |

use super::{ApiJson, ApiQuery, AppState};
use crate::{
    db,
    error::AppError,
    models::StudentFields,
    services::{registry, UploadedPhoto},
};
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// 학생 등록 요청
///
/// `Content-Type`이 `multipart/form-data`이면 텍스트 필드와 `photo` 파일 파트를 읽고,
/// 그 밖에는 JSON 본문으로 읽습니다.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub fields: StudentFields,
    pub photo: Option<UploadedPhoto>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl<S> FromRequest<S> for RegistrationForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let ApiJson(fields) = ApiJson::<StudentFields>::from_request(req, state).await?;
            return Ok(Self { fields, photo: None });
        }

        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = RegistrationForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "photo" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // 파일을 고르지 않은 브라우저 폼은 빈 파트를 보냅니다.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.photo = Some(UploadedPhoto {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field.text().await?;
            let slot = match name.as_str() {
                "full_name" => &mut form.fields.full_name,
                "email" => &mut form.fields.email,
                "phone" => &mut form.fields.phone,
                "date_of_birth" => &mut form.fields.date_of_birth,
                "address" => &mut form.fields.address,
                "program" => &mut form.fields.program,
                _ => continue,
            };
            *slot = Some(value);
        }

        Ok(form)
    }
}

/// `GET /students`: 전체 목록(최근 등록순) 또는 검색 결과(이름순)
pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let students = db::list_students(&state.db, query.search.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "count": students.len(),
        "students": students,
    })))
}

/// `GET /students/{id}`: 학생 정보와 성적 이력
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let student = registry::get_student_with_grades(&state.db, &id).await?;
    Ok(Json(json!({ "success": true, "student": student })))
}

/// `POST /students`: 학생 등록. 성공 시 201과 할당된 학생 ID를 반환합니다.
pub async fn create_student(
    State(state): State<AppState>,
    form: RegistrationForm,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let student_id = registry::register(&state.db, &state.photos, form.fields, form.photo).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Student registered successfully",
            "student_id": student_id,
        })),
    ))
}

/// `PUT /students/{id}`: 모든 필드를 덮어씁니다. 빠진 선택 필드는 비워집니다.
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<StudentFields>,
) -> Result<Json<Value>, AppError> {
    registry::update(&state.db, &id, fields).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Student updated successfully",
    })))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    registry::delete(&state.db, &state.photos, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Student deleted successfully",
    })))
}

/// `GET /students/{id}/statistics`: `student_statistics` 뷰 한 행
pub async fn student_statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let statistics = registry::statistics(&state.db, &id).await?;
    Ok(Json(json!({ "success": true, "statistics": statistics })))
}
