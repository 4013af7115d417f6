//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어옵니다. `.env` 파일은 `main`에서 먼저 로딩됩니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `UPLOADS_PATH`: 업로드 사진 저장 디렉토리
//! - `PUBLIC_PATH`: 프론트엔드 정적 파일 디렉토리
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `DB_MAX_CONNECTIONS`: 연결 풀 크기

use std::env;

/// 애플리케이션 전체 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/gradebook.db?mode=rwc")
    pub database_url: String,
    /// 업로드 루트 디렉토리. 사진은 `<uploads_path>/photos`에 저장됩니다.
    pub uploads_path: String,
    /// 정적 프론트엔드 디렉토리
    pub public_path: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 연결 풀의 최대 연결 수 (기본값: 10)
    pub db_max_connections: u32,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`이 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            uploads_path: env::var("UPLOADS_PATH").unwrap_or_else(|_| "data/uploads".to_string()),
            public_path: env::var("PUBLIC_PATH").unwrap_or_else(|_| "public".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10),
        })
    }
}
