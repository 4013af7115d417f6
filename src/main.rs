//! # Gradebook 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. 사진 저장 디렉토리 생성
//! 5. 라우터 구성 (API + 업로드 + 프론트엔드 정적 파일)
//! 6. HTTP 서버 시작, Ctrl+C / SIGTERM에서 정상 종료

use anyhow::Result;
use gradebook::{app, config::Config, db, services::PhotoStore, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use tokio::signal;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // RUST_LOG가 없으면 gradebook, tower_http, axum을 debug 레벨로
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradebook=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Gradebook server on {}:{}", config.host, config.port);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Running database migrations...");
    db::migrate(&pool).await?;

    let photos = PhotoStore::new(&config.uploads_path);
    photos.ensure_dir().await?;
    tracing::info!("Photo directory: {}", photos.dir().display());

    let state = AppState {
        db: db::Database::new(pool),
        photos,
    };

    // 정적 프론트엔드가 있으면 API에 매칭되지 않는 요청을 그쪽으로 보냅니다.
    let public_path = Path::new(&config.public_path);
    let router = if public_path.exists() {
        tracing::info!("Serving front end from {}", config.public_path);
        let serve_dir = ServeDir::new(public_path)
            .not_found_service(ServeFile::new(public_path.join("index.html")));
        app(state).fallback_service(serve_dir)
    } else {
        tracing::warn!("Public directory {} not found, serving API only", config.public_path);
        app(state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 기다립니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
