//! # 비즈니스 로직 모듈
//!
//! HTTP와 무관한 도메인 규칙을 모아둔 모듈입니다. 라우트 핸들러는 요청을 파싱하고
//! 여기의 함수를 호출한 뒤 결과를 JSON으로 감쌉니다.
//!
//! 각 하위 모듈:
//! - `validation`: 점수 → 상태 분류, 상태 집계
//! - `sessions`: 검증 세션 저장/조회/삭제 (트랜잭션)
//! - `registry`: 학생 등록부와 성적 입력
//! - `photos`: 학생 사진 파일 저장소
//! - `entry`: 순차 입력 화면의 상태 기계와 내보내기

pub mod entry;
pub mod photos;
pub mod registry;
pub mod sessions;
pub mod validation;

pub use photos::{PhotoStore, UploadedPhoto};
pub use validation::{aggregate, classify, Status, Summary};
