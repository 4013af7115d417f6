//! # 데이터 모델 모듈
//!
//! - `student`: 학생 등록부 구조체
//! - `grade`: 성적 이력과 성적 관련 요청
//! - `session`: 검증 세션과 세션 상세

pub mod grade;
pub mod session;
pub mod student;

pub use grade::*;
pub use session::*;
pub use student::*;

/// 숫자 또는 숫자 문자열을 모두 받는 역직렬화 도우미
///
/// HTML 폼과 입력 화면은 평균을 `"15.00"` 같은 문자열로 보내기도 합니다.
pub(crate) mod lenient {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    /// 빈 문자열은 `None`, 숫자로 읽을 수 없는 문자열은 역직렬화 에러입니다.
    pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid number: {}", s))),
        }
    }

}
