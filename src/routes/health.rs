//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/health` → `{ "success": true, "status": "ok" }`
//!
//! 컨테이너 헬스체크와 모니터링에서 사용합니다. 데이터베이스는 확인하지 않습니다.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: 서버 상태를 확인합니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "ok"
    }))
}
