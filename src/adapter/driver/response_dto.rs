use crate::domain::model::{Book, Loan};
use crate::domain::service::{BookStock, LoanStatistics, StockSummary};
use serde::Serialize;

/// 書籍用のレスポンスDTO
#[derive(Serialize)]
pub struct BookResponse {
    pub book_id: String,
    pub school_id: String,
    pub title: String,
    pub total_copies: u32,
}

/// 書籍在庫用のレスポンスDTO
/// 貸出可能数・貸出中数は台帳から導出した値
#[derive(Serialize)]
pub struct BookStockResponse {
    pub book_id: String,
    pub school_id: String,
    pub title: String,
    pub total_copies: u32,
    pub available_copies: u32,
    pub loaned_copies: u32,
    pub low_stock: bool,
}

/// 貸出用のレスポンスDTO
#[derive(Serialize)]
pub struct LoanResponse {
    pub loan_id: String,
    pub book_id: String,
    pub school_id: String,
    pub borrower_kind: String,
    pub borrower_id: String,
    pub taken_quantity: u32,
    pub returned_quantity: u32,
    pub pending_quantity: u32,
    pub status: String,
    pub loan_date: String,
    pub return_date: Option<String>,
}

/// 在庫サマリー用のレスポンスDTO
#[derive(Serialize)]
pub struct StockSummaryResponse {
    pub total_books: u32,
    pub total_stock: u64,
    pub total_available: u64,
    pub total_loaned: u64,
    pub low_stock_count: u32,
    pub total_overcommitted: u64,
}

/// 貸出統計用のレスポンスDTO
#[derive(Serialize)]
pub struct LoanStatisticsResponse {
    pub total_loans: u32,
    pub loaned_count: u32,
    pub pending_count: u32,
    pub returned_count: u32,
    pub outstanding_copies: u64,
}

impl BookResponse {
    /// ドメインオブジェクトからBookResponseを作成
    pub fn from_book(book: &Book) -> Self {
        Self {
            book_id: book.id().to_string(),
            school_id: book.school_id().to_string(),
            title: book.title().to_string(),
            total_copies: book.total_copies(),
        }
    }
}

impl BookStockResponse {
    /// 書籍と導出済みの在庫からBookStockResponseを作成
    pub fn from_stock(book: &Book, stock: &BookStock) -> Self {
        Self {
            book_id: book.id().to_string(),
            school_id: book.school_id().to_string(),
            title: book.title().to_string(),
            total_copies: book.total_copies(),
            available_copies: stock.available,
            loaned_copies: stock.loaned,
            low_stock: stock.is_low_stock(),
        }
    }
}

impl LoanResponse {
    /// ドメインオブジェクトからLoanResponseを作成
    pub fn from_loan(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id().to_string(),
            book_id: loan.book_id().to_string(),
            school_id: loan.school_id().to_string(),
            borrower_kind: loan.borrower().kind().to_string(),
            borrower_id: loan.borrower().id().to_string(),
            taken_quantity: loan.taken_quantity(),
            returned_quantity: loan.returned_quantity(),
            pending_quantity: loan.pending_quantity(),
            status: loan.status().to_string(),
            loan_date: loan.loan_date().format("%Y-%m-%d").to_string(),
            return_date: loan
                .return_date()
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<StockSummary> for StockSummaryResponse {
    fn from(summary: StockSummary) -> Self {
        Self {
            total_books: summary.total_books,
            total_stock: summary.total_stock,
            total_available: summary.total_available,
            total_loaned: summary.total_loaned,
            low_stock_count: summary.low_stock_count,
            total_overcommitted: summary.total_overcommitted,
        }
    }
}

impl From<LoanStatistics> for LoanStatisticsResponse {
    fn from(statistics: LoanStatistics) -> Self {
        Self {
            total_loans: statistics.total_loans,
            loaned_count: statistics.loaned_count,
            pending_count: statistics.pending_count,
            returned_count: statistics.returned_count,
            outstanding_copies: statistics.outstanding_copies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BookId, Borrower, LoanId, SchoolId, StudentId};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_loan_response_from_loan() {
        let student_id = StudentId::new();
        let mut loan = Loan::new(
            LoanId::new(),
            BookId::new(),
            SchoolId::new(),
            Borrower::Student(student_id),
            3,
            date(1),
        )
        .unwrap();
        loan.register_return(2, date(8)).unwrap();

        let response = LoanResponse::from_loan(&loan);

        assert_eq!(response.borrower_kind, "student");
        assert_eq!(response.borrower_id, student_id.to_string());
        assert_eq!(response.returned_quantity, 2);
        assert_eq!(response.pending_quantity, 1);
        assert_eq!(response.status, "Pending");
        assert_eq!(response.loan_date, "2024-06-01");
        assert_eq!(response.return_date.as_deref(), Some("2024-06-08"));
    }

    #[test]
    fn test_book_stock_response_marks_low_stock() {
        let book = Book::new(BookId::new(), SchoolId::new(), "モモ".to_string(), 5).unwrap();
        let stock = BookStock {
            available: 2,
            loaned: 3,
        };

        let response = BookStockResponse::from_stock(&book, &stock);

        assert_eq!(response.title, "モモ");
        assert_eq!(response.available_copies, 2);
        assert_eq!(response.loaned_copies, 3);
        assert!(response.low_stock);
    }

    #[test]
    fn test_stock_summary_response_serialization() {
        let summary = StockSummary {
            total_books: 2,
            total_stock: 15,
            total_available: 13,
            total_loaned: 2,
            low_stock_count: 1,
            total_overcommitted: 0,
        };

        let json = serde_json::to_value(StockSummaryResponse::from(summary)).unwrap();

        assert_eq!(json["total_stock"], 15);
        assert_eq!(json["low_stock_count"], 1);
        assert_eq!(json["total_overcommitted"], 0);
    }

    #[test]
    fn test_large_totals_serialize_without_truncation() {
        let summary = StockSummary {
            total_books: 2,
            total_stock: 6_000_000_000,
            total_available: 6_000_000_000,
            ..StockSummary::default()
        };
        let statistics = LoanStatistics {
            outstanding_copies: 5_000_000_000,
            ..LoanStatistics::default()
        };

        let summary_json = serde_json::to_value(StockSummaryResponse::from(summary)).unwrap();
        let statistics_json =
            serde_json::to_value(LoanStatisticsResponse::from(statistics)).unwrap();

        assert_eq!(summary_json["total_stock"], 6_000_000_000u64);
        assert_eq!(statistics_json["outstanding_copies"], 5_000_000_000u64);
    }
}
