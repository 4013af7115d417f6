//! # 데이터베이스 접근 계층 (Persistence Gateway)
//!
//! 라우트와 서비스는 SQL을 직접 실행하지 않고 이 모듈의 `Database`를 거칩니다.
//!
//! - `run` / `run_one` / `execute`: 파라미터 바인딩된 단일 쿼리. 호출마다 풀에서
//!   연결을 하나 빌리고 쿼리가 끝나면 반납합니다.
//! - `with_transaction`: 트랜잭션 핸들(`Tx`)을 받는 함수를 실행합니다.
//!   함수가 `Ok`를 반환하면 커밋, `Err`를 반환하면 롤백한 뒤 에러를 그대로 돌려줍니다.
//!   어느 경로든 연결은 풀로 반납됩니다.
//!
//! 저장소 에러는 가공하지 않고 `AppError::Database`로 전파하며, 재시도하지 않습니다.
//!
//! 각 하위 모듈:
//! - `students`: 학생 등록부 쿼리
//! - `grades`: 성적 이력 쿼리
//! - `sessions`: 검증 세션/세션 상세 쿼리
//! - `statistics`: 집계 뷰와 전체 통계 쿼리

pub mod grades;
pub mod sessions;
pub mod statistics;
pub mod students;

pub use grades::*;
pub use sessions::*;
pub use statistics::*;
pub use students::*;

use crate::error::AppError;
use sqlx::{
    query::{Query, QueryAs},
    sqlite::{SqliteArguments, SqlitePool, SqliteQueryResult, SqliteRow},
    FromRow, Sqlite, SqliteConnection, Transaction,
};
use std::{future::Future, pin::Pin};

/// SQL의 `?` 자리에 바인딩할 값
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Real(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

/// `None`은 SQL NULL로 바인딩됩니다.
impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

fn bind_query<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Param],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<String>),
            Param::Int(v) => query.bind(*v),
            Param::Real(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

fn bind_query_as<'q, T>(
    mut query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    params: &'q [Param],
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<String>),
            Param::Int(v) => query.bind(*v),
            Param::Real(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// `with_transaction`에 넘기는 함수가 반환하는 Future
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 't>>;

/// 연결 풀을 감싼 저장소 게이트웨이
///
/// `SqlitePool`은 내부적으로 Arc를 사용하므로 clone해도 같은 풀을 가리킵니다.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 쿼리를 실행하고 모든 행을 `T`로 변환해 반환합니다.
    pub async fn run<T>(&self, sql: &str, params: &[Param]) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let rows = bind_query_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// 첫 번째 행만 반환합니다. 결과가 없으면 `None`.
    pub async fn run_one<T>(&self, sql: &str, params: &[Param]) -> Result<Option<T>, AppError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let row = bind_query_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// 결과 행이 없는 쓰기 쿼리(INSERT/UPDATE/DELETE)를 실행합니다.
    pub async fn execute(&self, sql: &str, params: &[Param]) -> Result<SqliteQueryResult, AppError> {
        let result = bind_query(sqlx::query(sql), params)
            .execute(&self.pool)
            .await?;
        Ok(result)
    }

    /// `f`를 하나의 트랜잭션 안에서 실행합니다.
    ///
    /// - `f`가 `Ok`를 반환하면 커밋합니다. 커밋 실패도 에러로 전파됩니다.
    /// - `f`가 `Err`를 반환하면 롤백한 뒤 같은 에러를 반환합니다.
    ///
    /// 클로저가 빌린 값을 캡처하면 수명 제약에 걸리므로, 필요한 데이터는 move로 넘깁니다.
    ///
    /// ```ignore
    /// let id = db.with_transaction(move |tx| Box::pin(async move {
    ///     let result = tx.execute("INSERT INTO ...", &[name.into()]).await?;
    ///     Ok::<_, AppError>(result.last_insert_rowid())
    /// })).await?;
    /// ```
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Tx) -> TxFuture<'t, T> + Send,
    {
        let mut tx = Tx {
            inner: self.pool.begin().await?,
        };

        let outcome = f(&mut tx).await;
        match outcome {
            Ok(value) => {
                tx.inner.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.inner.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                tracing::warn!("Transaction rolled back: {}", err);
                Err(err)
            }
        }
    }
}

/// 진행 중인 트랜잭션 핸들
///
/// `Database::with_transaction` 안에서만 만들어집니다.
/// 이 핸들로 실행한 쿼리는 모두 같은 연결, 같은 트랜잭션에서 실행됩니다.
pub struct Tx {
    inner: Transaction<'static, Sqlite>,
}

impl Tx {
    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.inner
    }

    pub async fn run<T>(&mut self, sql: &str, params: &[Param]) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let rows = bind_query_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    pub async fn run_one<T>(&mut self, sql: &str, params: &[Param]) -> Result<Option<T>, AppError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let row = bind_query_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    pub async fn execute(&mut self, sql: &str, params: &[Param]) -> Result<SqliteQueryResult, AppError> {
        let result = bind_query(sqlx::query(sql), params)
            .execute(self.conn())
            .await?;
        Ok(result)
    }
}

/// `./migrations`의 스키마를 적용합니다. 이미 적용된 마이그레이션은 건너뜁니다.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// 테스트용 인메모리 데이터베이스 (연결 1개, 마이그레이션 적용 완료)
#[cfg(test)]
pub(crate) async fn memory_db() -> Database {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    migrate(&pool).await.expect("apply migrations");
    Database::new(pool)
}
