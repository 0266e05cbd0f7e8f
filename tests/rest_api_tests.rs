use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use school_library_loans::adapter::driven::{
    ConsoleEventPublisher, InMemoryBookRepository, InMemoryLoanRepository,
};
use school_library_loans::adapter::driver::rest_api::{create_router, AppState};
use school_library_loans::domain::port::Logger;
use school_library_loans::domain::service::LoanStockPolicy;

// テスト用のロガー（何も出力しない）
struct SilentLogger;

impl Logger for SilentLogger {
    fn debug(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn info(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn warn(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn error(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
}

fn server(policy: LoanStockPolicy) -> TestServer {
    let logger: Arc<dyn Logger> = Arc::new(SilentLogger);
    let state = AppState::new(
        Arc::new(InMemoryBookRepository::new()),
        Arc::new(InMemoryLoanRepository::new()),
        Arc::new(ConsoleEventPublisher::new(logger.clone())),
        logger,
        policy,
    );
    TestServer::new(create_router().with_state(state)).unwrap()
}

async fn create_book(server: &TestServer, school_id: Uuid, total_copies: u32) -> String {
    let response = server
        .post("/books")
        .json(&json!({
            "school_id": school_id,
            "title": "エルマーのぼうけん",
            "total_copies": total_copies,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["book_id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_loan(server: &TestServer, book_id: &str, taken_quantity: u32) -> Value {
    let response = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "student_id": Uuid::new_v4(),
            "taken_quantity": taken_quantity,
            "loan_date": "2024-04-01",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_check() {
    let server = server(LoanStockPolicy::Strict);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["stock_policy"], "strict");
}

#[tokio::test]
async fn test_loan_and_return_flow() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 5).await;

    let loan = create_loan(&server, &book_id, 3).await;
    assert_eq!(loan["status"], "Loaned");
    assert_eq!(loan["borrower_kind"], "student");
    assert_eq!(loan["pending_quantity"], 3);

    let stock = server
        .get(&format!("/books/{}/stock", book_id))
        .await
        .json::<Value>();
    assert_eq!(stock["available_copies"], 2);
    assert_eq!(stock["loaned_copies"], 3);
    assert_eq!(stock["low_stock"], true);

    let loan_id = loan["loan_id"].as_str().unwrap();
    let response = server
        .post(&format!("/loans/{}/returns", loan_id))
        .json(&json!({ "returned_quantity": 2, "return_date": "2024-04-08" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let returned = response.json::<Value>();
    assert_eq!(returned["status"], "Pending");
    assert_eq!(returned["returned_quantity"], 2);
    assert_eq!(returned["pending_quantity"], 1);
    assert_eq!(returned["return_date"], "2024-04-08");

    let stock = server
        .get(&format!("/books/{}/stock", book_id))
        .await
        .json::<Value>();
    assert_eq!(stock["available_copies"], 4);
    assert_eq!(stock["loaned_copies"], 1);
}

#[tokio::test]
async fn test_create_loan_validation_errors() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 5).await;

    let zero = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "teacher_id": Uuid::new_v4(),
            "taken_quantity": 0,
        }))
        .await;
    assert_eq!(zero.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(zero.json::<Value>()["code"], "INVALID_QUANTITY");

    let both = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "student_id": Uuid::new_v4(),
            "teacher_id": Uuid::new_v4(),
            "taken_quantity": 1,
        }))
        .await;
    assert_eq!(both.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(both.json::<Value>()["code"], "AMBIGUOUS_BORROWER");

    let neither = server
        .post("/loans")
        .json(&json!({ "book_id": book_id, "taken_quantity": 1 }))
        .await;
    assert_eq!(neither.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(neither.json::<Value>()["code"], "MISSING_BORROWER");
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 2).await;

    let response = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "student_id": Uuid::new_v4(),
            "taken_quantity": 3,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "INSUFFICIENT_STOCK");
}

#[tokio::test]
async fn test_return_above_taken_is_bad_request() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 5).await;
    let loan = create_loan(&server, &book_id, 2).await;
    let loan_id = loan["loan_id"].as_str().unwrap();

    let response = server
        .post(&format!("/loans/{}/returns", loan_id))
        .json(&json!({ "returned_quantity": 3 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_RETURN_QUANTITY");

    let stored = server
        .get(&format!("/loans/{}", loan_id))
        .await
        .json::<Value>();
    assert_eq!(stored["returned_quantity"], 0);
    assert_eq!(stored["status"], "Loaned");
}

#[tokio::test]
async fn test_not_found_responses() {
    let server = server(LoanStockPolicy::Strict);
    let missing = Uuid::new_v4();

    let book = server.get(&format!("/books/{}", missing)).await;
    assert_eq!(book.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(book.json::<Value>()["code"], "NOT_FOUND");

    let loan = server.delete(&format!("/loans/{}", missing)).await;
    assert_eq!(loan.status_code(), StatusCode::NOT_FOUND);

    let ret = server
        .post(&format!("/loans/{}/returns", missing))
        .json(&json!({ "returned_quantity": 1 }))
        .await;
    assert_eq!(ret.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stock_summary_and_low_stock_by_school() {
    let server = server(LoanStockPolicy::Strict);
    let school_id = Uuid::new_v4();
    create_book(&server, school_id, 3).await;
    create_book(&server, school_id, 10).await;
    create_book(&server, Uuid::new_v4(), 1).await;

    let summary = server
        .get("/stock/summary")
        .add_query_param("school_id", school_id)
        .await
        .json::<Value>();
    assert_eq!(summary["total_books"], 2);
    assert_eq!(summary["total_stock"], 13);
    assert_eq!(summary["total_available"], 13);
    assert_eq!(summary["total_loaned"], 0);
    assert_eq!(summary["low_stock_count"], 1);

    let low = server
        .get("/stock/low")
        .add_query_param("school_id", school_id)
        .await
        .json::<Vec<Value>>();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["total_copies"], 3);

    let invalid = server
        .get("/stock/summary")
        .add_query_param("school_id", "not-a-uuid")
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<Value>()["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_list_loans_and_statistics() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 10).await;
    let teacher_id = Uuid::new_v4();

    let teacher_loan = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "teacher_id": teacher_id,
            "taken_quantity": 4,
        }))
        .await;
    assert_eq!(teacher_loan.status_code(), StatusCode::CREATED);
    let student_loan = create_loan(&server, &book_id, 1).await;
    server
        .post(&format!(
            "/loans/{}/returns",
            student_loan["loan_id"].as_str().unwrap()
        ))
        .json(&json!({ "returned_quantity": 1 }))
        .await;

    let active = server.get("/loans").await.json::<Vec<Value>>();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["borrower_kind"], "teacher");

    let by_teacher = server
        .get("/loans")
        .add_query_param("teacher_id", teacher_id)
        .await
        .json::<Vec<Value>>();
    assert_eq!(by_teacher.len(), 1);
    assert_eq!(by_teacher[0]["borrower_id"], teacher_id.to_string());

    let statistics = server.get("/loans/statistics").await.json::<Value>();
    assert_eq!(statistics["total_loans"], 2);
    assert_eq!(statistics["loaned_count"], 1);
    assert_eq!(statistics["returned_count"], 1);
    assert_eq!(statistics["outstanding_copies"], 4);
}

#[tokio::test]
async fn test_update_copies_and_delete_book() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 2).await;

    let updated = server
        .put(&format!("/books/{}/copies", book_id))
        .json(&json!({ "total_copies": 7 }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(updated.json::<Value>()["total_copies"], 7);

    let deleted = server.delete(&format!("/books/{}", book_id)).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let books = server.get("/books").await.json::<Vec<Value>>();
    assert!(books.is_empty());
}

#[tokio::test]
async fn test_delete_loan_frees_stock() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 3).await;
    let loan = create_loan(&server, &book_id, 3).await;

    let response = server
        .delete(&format!("/loans/{}", loan["loan_id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let stock = server
        .get(&format!("/books/{}/stock", book_id))
        .await
        .json::<Value>();
    assert_eq!(stock["available_copies"], 3);
    assert_eq!(stock["loaned_copies"], 0);
}

#[tokio::test]
async fn test_malformed_bodies_return_json_error() {
    let server = server(LoanStockPolicy::Strict);
    let book_id = create_book(&server, Uuid::new_v4(), 5).await;
    let loan = create_loan(&server, &book_id, 2).await;
    let loan_id = loan["loan_id"].as_str().unwrap();

    let negative = server
        .post("/loans")
        .json(&json!({
            "book_id": book_id,
            "student_id": Uuid::new_v4(),
            "taken_quantity": -1,
        }))
        .await;
    assert_eq!(negative.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(negative.json::<Value>()["code"], "INVALID_BODY");

    let wrong_type = server
        .post("/books")
        .json(&json!({
            "school_id": Uuid::new_v4(),
            "title": "はらぺこあおむし",
            "total_copies": "many",
        }))
        .await;
    assert_eq!(wrong_type.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.json::<Value>()["code"], "INVALID_BODY");

    let truncated = server
        .post(&format!("/loans/{}/returns", loan_id))
        .text("{\"returned_quantity\": ")
        .content_type("application/json")
        .await;
    assert_eq!(truncated.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(truncated.json::<Value>()["code"], "INVALID_BODY");

    let missing_field = server
        .put(&format!("/books/{}/copies", book_id))
        .json(&json!({}))
        .await;
    assert_eq!(missing_field.status_code(), StatusCode::BAD_REQUEST);
    let body = missing_field.json::<Value>();
    assert_eq!(body["code"], "INVALID_BODY");
    assert!(body["error"].as_str().unwrap().contains("total_copies"));

    let stored = server
        .get(&format!("/loans/{}", loan_id))
        .await
        .json::<Value>();
    assert_eq!(stored["returned_quantity"], 0);
}
