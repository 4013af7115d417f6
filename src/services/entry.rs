//! # 순차 입력 흐름 (Entry Flow)
//!
//! 교사가 학생 수를 정하고 한 명씩 이름과 평균을 입력하는 화면의 상태 기계입니다.
//! 서버에는 아무것도 쓰지 않으며, 마지막에 `session_entries()`로 세션 저장 요청을 만듭니다.
//!
//! 상태는 값(`EntryFlow`)이고, 모든 전이(`add`, `skip`, `edit`, `delete`, `reset`)는
//! 현재 상태를 소비해 다음 상태를 반환합니다.
//!
//! ```text
//! start(n) ──add/skip──▶ ... ──(consumed == total)──▶ 완료: summary / distribution / export
//!     ▲                                                        │
//!     └──────────────────────────── reset ─────────────────────┘
//! ```
//!
//! 빈 칸마다 `STU-` + 6자리 후보 ID를 `RngCore`로 뽑습니다.
//! 후보 ID는 등록부와 대조하지 않으므로 고유하다는 보장이 없습니다.

use crate::error::AppError;
use crate::models::SessionEntry;
use crate::services::validation::{aggregate, check_grade, classify, Status, Summary};
use chrono::{DateTime, SecondsFormat, Utc};
use rand_core::RngCore;
use serde::Serialize;
use serde_json::{json, Value};

pub const MIN_TOTAL: usize = 1;
pub const MAX_TOTAL: usize = 100;

/// CSV 내보내기 헤더
pub const CSV_HEADER: &str = "Student ID,Name,Average,Status,Subject,Timestamp";

const DEFAULT_SUBJECT: &str = "General";
const UNNAMED_SESSION: &str = "Unnamed Session";

/// 입력된 학생 한 명
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnteredStudent {
    pub id: String,
    pub name: String,
    /// 입력된 그대로의 평균. 표시와 내보내기에서만 둘째 자리로 맞춥니다.
    pub average: f64,
    pub subject: String,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
}

impl EnteredStudent {
    fn average_text(&self) -> String {
        format!("{:.2}", self.average)
    }

    fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// 입력 폼 한 장
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub name: String,
    pub average: Option<f64>,
    pub subject: Option<String>,
}

/// 입력 흐름 상태
///
/// `Default`는 아직 시작하지 않은(또는 reset된) 상태입니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFlow {
    total: usize,
    consumed: usize,
    candidate_id: Option<String>,
    students: Vec<EnteredStudent>,
}

/// `STU-100000` ~ `STU-999999` 범위의 후보 ID
pub fn candidate_id<R: RngCore + ?Sized>(rng: &mut R) -> String {
    format!("STU-{}", rng.next_u32() % 900_000 + 100_000)
}

/// 0~20 범위 검사. 값은 바꾸지 않습니다.
fn checked_average(average: Option<f64>) -> Result<f64, AppError> {
    let average = average
        .ok_or_else(|| AppError::validation("Please enter a valid average between 0 and 20"))?;
    check_grade(average)
        .map_err(|_| AppError::validation("Please enter a valid average between 0 and 20"))
}

fn csv_quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl EntryFlow {
    /// 학생 수를 정하고 첫 번째 칸을 엽니다.
    pub fn start<R: RngCore + ?Sized>(total: usize, rng: &mut R) -> Result<Self, AppError> {
        if !(MIN_TOTAL..=MAX_TOTAL).contains(&total) {
            return Err(AppError::validation(format!(
                "Number of students must be between {} and {}",
                MIN_TOTAL, MAX_TOTAL
            )));
        }

        Ok(Self {
            total,
            consumed: 0,
            candidate_id: Some(candidate_id(rng)),
            students: Vec::new(),
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 추가하거나 건너뛴 칸의 수
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn students(&self) -> &[EnteredStudent] {
        &self.students
    }

    /// 현재 열린 칸의 후보 ID. 입력이 끝났으면 `None`.
    pub fn candidate(&self) -> Option<&str> {
        self.candidate_id.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.consumed >= self.total
    }

    fn open_slot(&self) -> Result<String, AppError> {
        match (&self.candidate_id, self.is_finished()) {
            (Some(id), false) => Ok(id.clone()),
            _ => Err(AppError::validation("All students have been entered")),
        }
    }

    fn advance<R: RngCore + ?Sized>(mut self, rng: &mut R) -> Self {
        self.consumed += 1;
        self.candidate_id = if self.is_finished() {
            None
        } else {
            Some(candidate_id(rng))
        };
        self
    }

    /// 현재 칸에 학생을 추가합니다. 이름이 비었거나 평균이 범위 밖이면 상태는 그대로입니다.
    pub fn add<R: RngCore + ?Sized>(mut self, form: EntryForm, rng: &mut R) -> Result<Self, AppError> {
        let id = self.open_slot()?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Please enter student name"));
        }
        let average = checked_average(form.average)?;
        let subject = form
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT)
            .to_string();

        self.students.push(EnteredStudent {
            id,
            name: name.to_string(),
            average,
            subject,
            status: classify(average),
            timestamp: Utc::now(),
        });
        Ok(self.advance(rng))
    }

    /// 현재 칸을 건너뜁니다. 학생은 추가되지 않습니다.
    pub fn skip<R: RngCore + ?Sized>(self, rng: &mut R) -> Result<Self, AppError> {
        self.open_slot()?;
        Ok(self.advance(rng))
    }

    /// 이미 입력한 학생의 이름이나 평균을 고칩니다.
    ///
    /// 빈 이름은 무시합니다. 평균을 바꾸면 상태도 다시 분류합니다.
    pub fn edit(mut self, id: &str, name: Option<&str>, average: Option<f64>) -> Result<Self, AppError> {
        let new_average = average.map(|a| checked_average(Some(a))).transpose()?;

        let student = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::not_found("Student not found"))?;

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            student.name = name.to_string();
        }
        if let Some(avg) = new_average {
            student.average = avg;
            student.status = classify(avg);
        }
        Ok(self)
    }

    /// 학생을 목록에서 지우고 전체 학생 수를 하나 줄입니다.
    pub fn delete(mut self, id: &str) -> Result<Self, AppError> {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        if self.students.len() == before {
            return Err(AppError::not_found("Student not found"));
        }

        self.total = self.total.saturating_sub(1);
        if self.is_finished() {
            self.candidate_id = None;
        }
        Ok(self)
    }

    /// 모든 입력을 버리고 시작 전 상태로 돌아갑니다.
    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn summary(&self) -> Summary {
        aggregate(self.students.iter().map(|s| s.status))
    }

    /// 차트용 상태별 개수 (Validé, Ratt, NV 순)
    pub fn distribution(&self) -> [(Status, i64); 3] {
        let summary = self.summary();
        [
            (Status::Valide, summary.valide),
            (Status::Ratt, summary.ratt),
            (Status::Nv, summary.nv),
        ]
    }

    pub fn sorted_by_name(&self) -> Vec<&EnteredStudent> {
        let mut sorted: Vec<_> = self.students.iter().collect();
        sorted.sort_by_key(|s| s.name.to_lowercase());
        sorted
    }

    /// 평균 내림차순
    pub fn sorted_by_average(&self) -> Vec<&EnteredStudent> {
        let mut sorted: Vec<_> = self.students.iter().collect();
        sorted.sort_by(|a, b| b.average.total_cmp(&a.average));
        sorted
    }

    /// ID, 이름, 평균, 상태 중 하나에 검색어가 포함된 학생 (대소문자 무시)
    pub fn filter(&self, term: &str) -> Vec<&EnteredStudent> {
        let term = term.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                term.is_empty()
                    || [s.id.clone(), s.name.clone(), s.average_text(), s.status.to_string()]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// CSV 텍스트. 이름·과목·시각은 따옴표로 감쌉니다.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');
        for s in &self.students {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                s.id,
                csv_quoted(&s.name),
                s.average_text(),
                s.status,
                csv_quoted(&s.subject),
                csv_quoted(&s.timestamp_text()),
            ));
        }
        csv
    }

    /// JSON 내보내기 문서
    pub fn to_json(&self, session_name: Option<&str>) -> Value {
        let summary = self.summary();
        let session_name = session_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_SESSION);

        let students: Vec<Value> = self
            .students
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "avg": s.average_text(),
                    "subject": s.subject,
                    "status": s.status,
                    "timestamp": s.timestamp_text(),
                })
            })
            .collect();

        json!({
            "session_name": session_name,
            "date": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "total_students": summary.total,
            "statistics": {
                "valide": summary.valide,
                "ratt": summary.ratt,
                "nv": summary.nv,
            },
            "students": students,
        })
    }

    /// `save-session`에 보낼 항목들
    pub fn session_entries(&self) -> Vec<SessionEntry> {
        self.students
            .iter()
            .map(|s| SessionEntry {
                student_id: s.id.clone(),
                average: s.average,
                status: s.status,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 미리 정한 값을 차례로 돌려주는 난수원
    struct Sequence(Vec<u32>, usize);

    impl Sequence {
        fn new(values: &[u32]) -> Self {
            Sequence(values.to_vec(), 0)
        }
    }

    impl RngCore for Sequence {
        fn next_u32(&mut self) -> u32 {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            rand_core::impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn form(name: &str, average: f64) -> EntryForm {
        EntryForm {
            name: name.to_string(),
            average: Some(average),
            subject: None,
        }
    }

    fn three_students() -> EntryFlow {
        let mut rng = Sequence::new(&[1, 2, 3, 4]);
        EntryFlow::start(3, &mut rng)
            .and_then(|f| f.add(form("Zoe", 15.0), &mut rng))
            .and_then(|f| f.add(form("amina", 9.0), &mut rng))
            .and_then(|f| f.add(form("Bilal", 4.5), &mut rng))
            .unwrap()
    }

    #[test]
    fn start_is_bounded() {
        let mut rng = Sequence::new(&[0]);
        assert!(EntryFlow::start(0, &mut rng).is_err());
        assert!(EntryFlow::start(101, &mut rng).is_err());
        assert!(EntryFlow::start(1, &mut rng).is_ok());
        assert!(EntryFlow::start(100, &mut rng).is_ok());
    }

    #[test]
    fn candidate_ids_have_six_digits() {
        let mut rng = Sequence::new(&[0, 899_999, u32::MAX]);
        assert_eq!(candidate_id(&mut rng), "STU-100000");
        assert_eq!(candidate_id(&mut rng), "STU-999999");
        let last = candidate_id(&mut rng);
        assert_eq!(last.len(), 10);
    }

    #[test]
    fn add_and_skip_consume_slots_until_finished() {
        let mut rng = Sequence::new(&[5, 6, 7]);
        let flow = EntryFlow::start(2, &mut rng).unwrap();
        assert_eq!(flow.candidate(), Some("STU-100005"));

        let flow = flow.add(form("Amina", 12.0), &mut rng).unwrap();
        assert_eq!(flow.students()[0].id, "STU-100005");
        assert_eq!(flow.candidate(), Some("STU-100006"));

        let flow = flow.skip(&mut rng).unwrap();
        assert!(flow.is_finished());
        assert_eq!(flow.candidate(), None);
        assert_eq!(flow.students().len(), 1);

        let err = flow.clone().add(form("Late", 10.0), &mut rng);
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert!(flow.skip(&mut rng).is_err());
    }

    #[test]
    fn add_rejects_invalid_form() {
        let mut rng = Sequence::new(&[1]);
        let flow = EntryFlow::start(2, &mut rng).unwrap();
        assert!(flow.clone().add(form("  ", 10.0), &mut rng).is_err());
        assert!(flow.clone().add(form("A", 20.01), &mut rng).is_err());
        let no_average = EntryForm {
            name: "A".into(),
            ..Default::default()
        };
        assert!(flow.add(no_average, &mut rng).is_err());
    }

    #[test]
    fn status_uses_raw_average_and_exports_show_two_decimals() {
        let mut rng = Sequence::new(&[1, 2, 3]);
        let flow = EntryFlow::start(2, &mut rng)
            .unwrap()
            .add(form("A", 9.996), &mut rng)
            .and_then(|f| f.add(form("B", 7.996), &mut rng))
            .unwrap();

        let a = &flow.students()[0];
        assert_eq!(a.average, 9.996);
        assert_eq!(a.status, Status::Ratt);
        assert_eq!(a.subject, "General");
        assert_eq!(flow.students()[1].status, Status::Nv);

        assert!(flow.to_csv().contains(",10.00,Ratt,"));
        assert_eq!(flow.to_json(None)["students"][0]["avg"], "10.00");

        let entries = flow.session_entries();
        assert_eq!(entries[0].average, 9.996);
        assert!(entries.iter().all(|e| classify(e.average) == e.status));
    }

    #[test]
    fn edit_reclassifies_from_raw_average() {
        let mut rng = Sequence::new(&[1, 2]);
        let flow = EntryFlow::start(1, &mut rng)
            .unwrap()
            .add(form("A", 12.0), &mut rng)
            .unwrap();
        let id = flow.students()[0].id.clone();

        let flow = flow.edit(&id, None, Some(7.999)).unwrap();
        assert_eq!(flow.students()[0].average, 7.999);
        assert_eq!(flow.students()[0].status, Status::Nv);
    }

    #[test]
    fn summary_and_distribution() {
        let flow = three_students();
        let summary = flow.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.success_rate, 33.3);
        assert_eq!(
            flow.distribution(),
            [(Status::Valide, 1), (Status::Ratt, 1), (Status::Nv, 1)]
        );
    }

    #[test]
    fn edit_reclassifies_and_delete_shrinks_total() {
        let flow = three_students();
        let bilal = flow.students()[2].id.clone();

        let flow = flow.edit(&bilal, Some(" "), Some(11.0)).unwrap();
        assert_eq!(flow.students()[2].name, "Bilal");
        assert_eq!(flow.students()[2].status, Status::Valide);
        assert!(flow.clone().edit(&bilal, None, Some(-1.0)).is_err());
        assert!(matches!(
            flow.clone().edit("STU-000000", Some("X"), None),
            Err(AppError::NotFound(_))
        ));

        let flow = flow.delete(&bilal).unwrap();
        assert_eq!(flow.total(), 2);
        assert_eq!(flow.students().len(), 2);
        assert!(matches!(flow.delete(&bilal), Err(AppError::NotFound(_))));
    }

    #[test]
    fn sorting_and_filtering() {
        let flow = three_students();
        let names: Vec<_> = flow.sorted_by_name().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["amina", "Bilal", "Zoe"]);

        let by_avg: Vec<_> = flow.sorted_by_average().iter().map(|s| s.average).collect();
        assert_eq!(by_avg, [15.0, 9.0, 4.5]);

        assert_eq!(flow.filter("ZO").len(), 1);
        assert_eq!(flow.filter("ratt")[0].name, "amina");
        assert_eq!(flow.filter("").len(), 3);
    }

    #[test]
    fn csv_export_quotes_text_fields() {
        let mut rng = Sequence::new(&[1, 2]);
        let flow = EntryFlow::start(1, &mut rng)
            .unwrap()
            .add(form("Amina \"Mimi\" K.", 15.0), &mut rng)
            .unwrap();

        let csv = flow.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        let row = lines.next().unwrap();
        assert!(row.starts_with("STU-100001,\"Amina \"\"Mimi\"\" K.\",15.00,Validé,\"General\",\""));
        assert!(row.ends_with("Z\""));
    }

    #[test]
    fn json_export_and_session_entries() {
        let flow = three_students();
        let doc = flow.to_json(None);
        assert_eq!(doc["session_name"], "Unnamed Session");
        assert_eq!(doc["total_students"], 3);
        assert_eq!(doc["statistics"]["ratt"], 1);
        assert_eq!(doc["students"][0]["avg"], "15.00");
        assert_eq!(doc["students"][1]["status"], "Ratt");

        let entries = flow.session_entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| classify(e.average) == e.status));
    }

    #[test]
    fn reset_discards_everything() {
        let flow = three_students().reset();
        assert_eq!(flow, EntryFlow::default());
        assert!(flow.is_finished());
        assert!(flow.students().is_empty());
    }
}
