use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    CreateBookRequest, CreateLoanRequest, LoansQueryParams, RegisterReturnRequest,
    SchoolQueryParams, UpdateCopiesRequest,
};
use crate::adapter::driver::response_dto::{
    BookResponse, BookStockResponse, LoanResponse, LoanStatisticsResponse, StockSummaryResponse,
};
use crate::application::service::{
    BookApplicationService, LoanApplicationService, LoanQueryService, StockQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{BookId, LoanId, SchoolId};
use crate::domain::port::{BookRepository, EventPublisher, LoanRepository, Logger};
use crate::domain::service::LoanStockPolicy;

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub book_service: Arc<BookApplicationService>,
    pub loan_service: Arc<LoanApplicationService>,
    pub stock_query_service: Arc<StockQueryService>,
    pub loan_query_service: Arc<LoanQueryService>,
}

impl AppState {
    /// リポジトリとポートの実装からサービス一式を組み立てる
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
        stock_policy: LoanStockPolicy,
    ) -> Self {
        Self {
            book_service: Arc::new(BookApplicationService::new(
                book_repository.clone(),
                logger.clone(),
            )),
            loan_service: Arc::new(LoanApplicationService::new(
                book_repository.clone(),
                loan_repository.clone(),
                event_publisher,
                logger,
                stock_policy,
            )),
            stock_query_service: Arc::new(StockQueryService::new(
                book_repository,
                loan_repository.clone(),
            )),
            loan_query_service: Arc::new(LoanQueryService::new(loan_repository)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // 書籍カタログ
        .route("/books", post(register_book).get(list_books))
        .route("/books/:book_id", get(get_book).delete(delete_book))
        .route("/books/:book_id/copies", put(update_total_copies))
        .route("/books/:book_id/stock", get(get_book_stock))
        // 在庫
        .route("/stock/summary", get(get_stock_summary))
        .route("/stock/low", get(get_low_stock_books))
        // 貸出台帳
        .route("/loans", post(create_loan).get(list_loans))
        .route("/loans/statistics", get(get_loan_statistics))
        .route("/loans/:loan_id", get(get_loan).delete(delete_loan))
        .route("/loans/:loan_id/returns", post(register_return))
}

// ヘルスチェックエンドポイント
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "stock_policy": state.loan_service.stock_policy().as_str(),
    }))
}

// 書籍登録エンドポイント
async fn register_book(
    State(state): State<AppState>,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookResponse>)> {
    let request = parse_json(body)?;
    let total_copies = request.total_copies();
    let book = state
        .book_service
        .register_book(SchoolId::from_uuid(request.school_id), request.title, total_copies)
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(BookResponse::from_book(&book))))
}

// 書籍一覧取得エンドポイント
async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<SchoolQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let params = parse_query(query)?;
    let books = state
        .book_service
        .list_books(params.school_id.map(SchoolId::from_uuid))
        .await
        .map_err(map_application_error)?;

    Ok(Json(books.iter().map(BookResponse::from_book).collect()))
}

// 書籍詳細取得エンドポイント
async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookResponse>> {
    let book = state
        .book_service
        .get_book(BookId::from_uuid(book_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookResponse::from_book(&book)))
}

// 所蔵数変更エンドポイント
async fn update_total_copies(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    body: Result<Json<UpdateCopiesRequest>, JsonRejection>,
) -> ApiResult<Json<BookResponse>> {
    let request = parse_json(body)?;
    let book = state
        .book_service
        .update_total_copies(BookId::from_uuid(book_id), request.total_copies)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookResponse::from_book(&book)))
}

// 書籍削除エンドポイント
async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .book_service
        .delete_book(BookId::from_uuid(book_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// 書籍在庫取得エンドポイント
async fn get_book_stock(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookStockResponse>> {
    let (book, stock) = state
        .stock_query_service
        .get_book_stock(BookId::from_uuid(book_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookStockResponse::from_stock(&book, &stock)))
}

// 在庫サマリー取得エンドポイント
async fn get_stock_summary(
    State(state): State<AppState>,
    query: Result<Query<SchoolQueryParams>, QueryRejection>,
) -> ApiResult<Json<StockSummaryResponse>> {
    let params = parse_query(query)?;
    let summary = state
        .stock_query_service
        .get_stock_summary(params.school_id.map(SchoolId::from_uuid))
        .await
        .map_err(map_application_error)?;

    Ok(Json(summary.into()))
}

// 低在庫書籍一覧取得エンドポイント
async fn get_low_stock_books(
    State(state): State<AppState>,
    query: Result<Query<SchoolQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BookStockResponse>>> {
    let params = parse_query(query)?;
    let stocks = state
        .stock_query_service
        .get_low_stock_books(params.school_id.map(SchoolId::from_uuid))
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        stocks
            .iter()
            .map(|(book, stock)| BookStockResponse::from_stock(book, stock))
            .collect(),
    ))
}

// 貸出登録エンドポイント
async fn create_loan(
    State(state): State<AppState>,
    body: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LoanResponse>)> {
    let request = parse_json(body)?;
    let borrower = request.borrower().map_err(map_domain_error)?;
    let loan_date = request.loan_date.unwrap_or_else(|| Utc::now().date_naive());

    let loan = state
        .loan_service
        .create_loan(
            BookId::from_uuid(request.book_id),
            borrower,
            request.taken_quantity,
            loan_date,
        )
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from_loan(&loan))))
}

// 貸出一覧取得エンドポイント
// 借り手を指定した場合はその借り手の全貸出、指定しない場合は未返却の貸出を返す
async fn list_loans(
    State(state): State<AppState>,
    query: Result<Query<LoansQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<LoanResponse>>> {
    let params = parse_query(query)?;
    let borrower = params.borrower().map_err(map_domain_error)?;

    let loans = match borrower {
        Some(borrower) => state.loan_query_service.list_loans_by_borrower(borrower).await,
        None => {
            state
                .loan_query_service
                .list_active_loans(params.school_id.map(SchoolId::from_uuid))
                .await
        }
    }
    .map_err(map_application_error)?;

    Ok(Json(loans.iter().map(LoanResponse::from_loan).collect()))
}

// 貸出統計取得エンドポイント
async fn get_loan_statistics(
    State(state): State<AppState>,
    query: Result<Query<SchoolQueryParams>, QueryRejection>,
) -> ApiResult<Json<LoanStatisticsResponse>> {
    let params = parse_query(query)?;
    let statistics = state
        .loan_query_service
        .get_loan_statistics(params.school_id.map(SchoolId::from_uuid))
        .await
        .map_err(map_application_error)?;

    Ok(Json(statistics.into()))
}

// 貸出詳細取得エンドポイント
async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> ApiResult<Json<LoanResponse>> {
    let loan = state
        .loan_query_service
        .get_loan(LoanId::from_uuid(loan_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(LoanResponse::from_loan(&loan)))
}

// 返却登録エンドポイント
async fn register_return(
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
    body: Result<Json<RegisterReturnRequest>, JsonRejection>,
) -> ApiResult<Json<LoanResponse>> {
    let request = parse_json(body)?;
    let return_date = request
        .return_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let loan = state
        .loan_service
        .register_return(LoanId::from_uuid(loan_id), request.returned_quantity, return_date)
        .await
        .map_err(map_application_error)?;

    Ok(Json(LoanResponse::from_loan(&loan)))
}

// 貸出削除エンドポイント
async fn delete_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .loan_service
        .delete_loan(LoanId::from_uuid(loan_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query.map(|Query(params)| params).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "無効なクエリパラメータです".to_string(),
        )
    })
}

// リクエストボディの形式・型の誤りはINVALID_BODY(400)として返す
fn parse_json<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(request)| request).map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_BODY",
            format!("無効なリクエストボディです: {}", rejection.body_text()),
        )
    })
}

fn api_error(status: StatusCode, code: &str, error: String) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REPOSITORY_ERROR",
            repo_err.to_string(),
        ),
        ApplicationError::EventPublishingFailed(msg) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "PUBLISHER_ERROR", msg)
        }
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
// 入力の誤りは400、台帳の状態と矛盾する操作は409
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let message = domain_err.to_string();
    match domain_err {
        DomainError::InvalidQuantity => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_QUANTITY", message)
        }
        DomainError::InvalidReturnQuantity { .. } => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_RETURN_QUANTITY", message)
        }
        DomainError::MissingBorrower => {
            api_error(StatusCode::BAD_REQUEST, "MISSING_BORROWER", message)
        }
        DomainError::AmbiguousBorrower => {
            api_error(StatusCode::BAD_REQUEST, "AMBIGUOUS_BORROWER", message)
        }
        DomainError::InvalidValue(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_VALUE", message),
        DomainError::InsufficientStock { .. } => {
            api_error(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message)
        }
        DomainError::InvalidLoanState(_) => {
            api_error(StatusCode::CONFLICT, "INVALID_LOAN_STATE", message)
        }
    }
}
