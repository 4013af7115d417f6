//! # 성적 분류기와 세션 집계
//!
//! 0~20점 평균을 세 가지 상태 중 하나로 분류하고,
//! 여러 학생의 상태를 모아 개수와 합격률을 계산합니다.
//!
//! | 상태 | 조건 |
//! |------|------|
//! | `Validé` | 점수 ≥ 10 |
//! | `Ratt` (재시험) | 8 ≤ 점수 < 10 |
//! | `NV` | 점수 < 8 |
//!
//! 반올림 없이 입력값 그대로 비교합니다. 0~20 범위 검사는 호출하는 쪽의 책임이며,
//! 그 검사는 `check_grade()`가 담당합니다.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 20.0;

/// 검증 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Validé")]
    Valide,
    #[serde(rename = "Ratt")]
    Ratt,
    #[serde(rename = "NV")]
    Nv,
}

impl Status {
    /// 화면 표시·차트 순서
    pub const ALL: [Status; 3] = [Status::Valide, Status::Ratt, Status::Nv];

    /// DB와 JSON에 저장되는 라벨
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Valide => "Validé",
            Status::Ratt => "Ratt",
            Status::Nv => "NV",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 라벨은 Validation 에러입니다. "기타" 분류는 없습니다.
impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Validé" => Ok(Status::Valide),
            "Ratt" => Ok(Status::Ratt),
            "NV" => Ok(Status::Nv),
            other => Err(AppError::validation(format!("Unknown status: {}", other))),
        }
    }
}

/// 점수를 상태로 분류합니다.
pub fn classify(grade: f64) -> Status {
    if grade >= 10.0 {
        Status::Valide
    } else if grade >= 8.0 {
        Status::Ratt
    } else {
        Status::Nv
    }
}

/// 점수가 [0, 20] 범위의 유한한 값인지 확인합니다. NaN도 여기서 걸러집니다.
pub fn check_grade(grade: f64) -> Result<f64, AppError> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(grade)
    } else {
        Err(AppError::validation("Grade must be between 0 and 20"))
    }
}

/// 상태별 집계 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: i64,
    pub valide: i64,
    pub ratt: i64,
    pub nv: i64,
    /// 합격(Validé) 비율, 소수점 첫째 자리까지. 학생이 없으면 0.
    pub success_rate: f64,
}

/// 상태 목록을 집계합니다. 입력은 읽기만 합니다.
pub fn aggregate<I>(statuses: I) -> Summary
where
    I: IntoIterator<Item = Status>,
{
    let (mut valide, mut ratt, mut nv) = (0i64, 0i64, 0i64);
    for status in statuses {
        match status {
            Status::Valide => valide += 1,
            Status::Ratt => ratt += 1,
            Status::Nv => nv += 1,
        }
    }

    let total = valide + ratt + nv;
    let success_rate = if total > 0 {
        (valide as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Summary {
        total,
        valide,
        ratt,
        nv,
        success_rate,
    }
}
