//! # 학생 사진 저장소
//!
//! 등록 요청에 첨부된 사진을 `<uploads_path>/photos` 아래에 저장하고,
//! 학생 삭제 시 함께 지웁니다.
//!
//! - 허용 형식: jpeg, jpg, png (확장자와 Content-Type 모두 검사)
//! - 최대 크기: 2 MiB
//! - 파일 이름: `photo-<UUID v7>.<확장자>` (원본 파일 이름은 저장하지 않음)
//! - 공개 URL: `/uploads/photos/<파일 이름>`

use crate::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// 사진 파일 최대 크기 (2 MiB)
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// 사진 URL의 공통 접두사. `/uploads`는 `ServeDir`로 서빙됩니다.
pub const PHOTO_URL_PREFIX: &str = "/uploads/photos/";

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// 요청에서 받은 사진 파일
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    /// 클라이언트가 보낸 원본 파일 이름 (확장자 확인용)
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedPhoto {
    /// 형식과 크기를 검사하고 저장할 확장자(소문자)를 반환합니다.
    pub fn checked_extension(&self) -> Result<String, AppError> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

        let content_type_ok = self
            .content_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct.as_str()));

        let Some(extension) = extension.filter(|_| content_type_ok) else {
            return Err(AppError::validation(
                "Only image files (jpeg, jpg, png) are allowed",
            ));
        };

        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::validation("Photo must be at most 2MB"));
        }

        Ok(extension)
    }
}

/// 사진 디렉토리 핸들. clone해도 같은 디렉토리를 가리킵니다.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    dir: PathBuf,
}

impl PhotoStore {
    /// `uploads_root` 아래의 `photos` 디렉토리를 사용합니다.
    pub fn new(uploads_root: impl AsRef<Path>) -> Self {
        let root = uploads_root.as_ref().to_path_buf();
        Self {
            dir: root.join("photos"),
            root,
        }
    }

    /// `/uploads`로 서빙되는 업로드 루트
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 사진 디렉토리가 없으면 만듭니다.
    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// 사진을 검사하고 저장한 뒤 공개 URL을 반환합니다.
    pub async fn save(&self, photo: &UploadedPhoto) -> Result<String, AppError> {
        let extension = photo.checked_extension()?;
        let file_name = format!("photo-{}.{}", Uuid::now_v7(), extension);

        self.ensure_dir().await?;
        fs::write(self.dir.join(&file_name), &photo.bytes).await?;
        tracing::debug!("Stored photo {} ({} bytes)", file_name, photo.bytes.len());

        Ok(format!("{}{}", PHOTO_URL_PREFIX, file_name))
    }

    /// `photo_url`이 가리키는 파일을 삭제합니다.
    ///
    /// URL의 마지막 경로 구성 요소만 사용하므로 사진 디렉토리 밖의 파일은 지울 수 없습니다.
    /// 파일이 이미 없으면 성공으로 처리합니다.
    pub async fn remove(&self, photo_url: &str) -> Result<(), AppError> {
        let Some(file_name) = Path::new(photo_url).file_name() else {
            return Ok(());
        };

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Photo already gone: {}", photo_url);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 공개 URL에 대응하는 디스크 경로
    pub fn path_for(&self, photo_url: &str) -> Option<PathBuf> {
        Path::new(photo_url)
            .file_name()
            .map(|file_name| self.dir.join(file_name))
    }
}
