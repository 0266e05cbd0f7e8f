use school_library_loans::adapter::database_error::DatabaseError;
use school_library_loans::adapter::driven::{
    ConsoleEventPublisher, ConsoleLogger, InMemoryBookRepository, InMemoryLoanRepository,
    MySqlBookRepository, MySqlLoanRepository,
};
use school_library_loans::adapter::driver::rest_api::{create_router, AppState};
use school_library_loans::adapter::{DatabaseConfig, DatabaseMigration, ServerConfig, StorageBackend};
use school_library_loans::domain::port::{BookRepository, LoanRepository, Logger};

use sqlx::mysql::MySqlPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

const COMPONENT: &str = "Server";

type Repositories = (Arc<dyn BookRepository>, Arc<dyn LoanRepository>);

/// 設定に応じてリポジトリを組み立てる
/// MySQLの場合は接続プールの作成とマイグレーションも行う
async fn build_repositories(
    config: &DatabaseConfig,
    logger: Arc<dyn Logger>,
) -> Result<Repositories, Box<dyn std::error::Error>> {
    logger.info(
        COMPONENT,
        "データベース設定を読み込みました",
        None,
        Some(config.log_context()),
    );

    match config.backend {
        StorageBackend::InMemory => {
            logger.warn(
                COMPONENT,
                "インメモリストレージを使用します（再起動でデータは消えます）",
                None,
                None,
            );
            let book_repository: Arc<dyn BookRepository> = Arc::new(InMemoryBookRepository::new());
            let loan_repository: Arc<dyn LoanRepository> = Arc::new(InMemoryLoanRepository::new());
            Ok((book_repository, loan_repository))
        }
        StorageBackend::MySql => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect(&config.connection_string())
                .await
                .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

            DatabaseMigration::new(pool.clone(), logger.clone()).run().await?;

            let book_repository: Arc<dyn BookRepository> =
                Arc::new(MySqlBookRepository::new(pool.clone()));
            let loan_repository: Arc<dyn LoanRepository> = Arc::new(MySqlLoanRepository::new(pool));
            Ok((book_repository, loan_repository))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let server_config = ServerConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::with_min_level(server_config.log_level));
    logger.info(COMPONENT, "学校図書館 貸出・在庫管理 REST API を起動します", None, None);

    let (book_repository, loan_repository) =
        build_repositories(&database_config, logger.clone()).await?;

    let event_publisher = Arc::new(ConsoleEventPublisher::new(logger.clone()));
    let app_state = AppState::new(
        book_repository,
        loan_repository,
        event_publisher,
        logger.clone(),
        server_config.stock_policy,
    );

    let app = create_router()
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(app_state);

    let bind_address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    let mut context = HashMap::new();
    context.insert("address".to_string(), bind_address);
    context.insert(
        "stock_policy".to_string(),
        server_config.stock_policy.as_str().to_string(),
    );
    logger.info(COMPONENT, "REST APIサーバーが起動しました", None, Some(context));

    axum::serve(listener, app).await?;

    Ok(())
}
