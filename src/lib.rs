//! # Gradebook
//!
//! 학생 성적 검증 서버입니다. 교사가 입력한 평균을 `Validé` / `Ratt` / `NV`로 분류해
//! 세션으로 저장하고, 사진과 성적 이력을 가진 학생 등록부를 관리합니다.
//!
//! 모듈 구성:
//! - `config`: 환경변수 설정
//! - `error`: `AppError`와 HTTP 응답 변환
//! - `db`: 저장소 게이트웨이와 테이블별 쿼리
//! - `models`: 행 구조체와 요청 본문
//! - `services`: 분류/집계, 세션 저장, 등록부, 사진 저장소, 입력 흐름
//! - `routes`: axum 핸들러와 라우터

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::{app, AppState};
