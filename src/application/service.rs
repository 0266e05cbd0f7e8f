mod loan_query_service;
mod stock_query_service;

pub use loan_query_service::LoanQueryService;
pub use stock_query_service::StockQueryService;

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Book, BookId, Borrower, Loan, LoanId, SchoolId};
use crate::domain::port::{BookRepository, EventPublisher, LoanRepository, Logger};
use crate::domain::service::{compute_book_stock, LoanStockPolicy};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// ログのコンテキストを組み立てるヘルパー関数
pub(crate) fn log_context(pairs: &[(&str, String)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    )
}

/// 貸出アプリケーションサービス
/// 貸出の登録・返却・削除を、書籍カタログと貸出台帳に照らして検証してから確定する
pub struct LoanApplicationService {
    book_repository: Arc<dyn BookRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    logger: Arc<dyn Logger>,
    stock_policy: LoanStockPolicy,
}

impl LoanApplicationService {
    const COMPONENT: &'static str = "LoanApplicationService";

    /// 新しい貸出アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `book_repository` - 書籍リポジトリ
    /// * `loan_repository` - 貸出リポジトリ
    /// * `event_publisher` - イベント発行者
    /// * `logger` - ロガー
    /// * `stock_policy` - 貸出登録時の在庫チェック方針
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
        stock_policy: LoanStockPolicy,
    ) -> Self {
        Self {
            book_repository,
            loan_repository,
            event_publisher,
            logger,
            stock_policy,
        }
    }

    /// 在庫チェック方針を取得
    pub fn stock_policy(&self) -> LoanStockPolicy {
        self.stock_policy
    }

    /// 貸出を登録する
    /// 貸出は書籍と同じ学校に属する
    ///
    /// # Arguments
    /// * `book_id` - 書籍ID
    /// * `borrower` - 借り手（生徒または教師）
    /// * `taken_quantity` - 貸出数（1以上）
    /// * `loan_date` - 貸出日
    ///
    /// # Returns
    /// * `Ok(Loan)` - 登録された貸出
    /// * `Err(ApplicationError)` - 登録失敗
    pub async fn create_loan(
        &self,
        book_id: BookId,
        borrower: Borrower,
        taken_quantity: u32,
        loan_date: NaiveDate,
    ) -> Result<Loan, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        self.logger.info(
            Self::COMPONENT,
            "Creating loan",
            Some(correlation_id),
            log_context(&[
                ("book_id", book_id.to_string()),
                ("borrower", borrower.to_string()),
                ("taken_quantity", taken_quantity.to_string()),
            ]),
        );

        let result = self
            .try_create_loan(book_id, borrower, taken_quantity, loan_date, correlation_id)
            .await;
        self.log_outcome("Loan created", &result, correlation_id);
        result
    }

    async fn try_create_loan(
        &self,
        book_id: BookId,
        borrower: Borrower,
        taken_quantity: u32,
        loan_date: NaiveDate,
        correlation_id: Uuid,
    ) -> Result<Loan, ApplicationError> {
        if taken_quantity == 0 {
            return Err(DomainError::InvalidQuantity.into());
        }

        let book = self.find_book(book_id).await?;

        if self.stock_policy == LoanStockPolicy::Strict {
            let active_loans = self.loan_repository.find_active_by_book(book_id).await?;
            let stock = compute_book_stock(&book, &active_loans);
            self.stock_policy.check(taken_quantity, stock)?;
        }

        let mut loan = Loan::new(
            self.loan_repository.next_identity(),
            book.id(),
            book.school_id(),
            borrower,
            taken_quantity,
            loan_date,
        )?;
        self.loan_repository.save(&loan).await?;
        self.publish_events(&mut loan, correlation_id)?;

        Ok(loan)
    }

    /// 返却を登録する
    /// 返却数は累計値として上書きする（差分ではない）
    ///
    /// # Arguments
    /// * `loan_id` - 貸出ID
    /// * `returned_quantity` - 累計返却数（1以上、貸出数以下）
    /// * `return_date` - 返却日
    ///
    /// # Returns
    /// * `Ok(Loan)` - 更新後の貸出（未返却数は `pending_quantity()` で取得できる）
    /// * `Err(ApplicationError)` - 登録失敗
    pub async fn register_return(
        &self,
        loan_id: LoanId,
        returned_quantity: u32,
        return_date: NaiveDate,
    ) -> Result<Loan, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        self.logger.info(
            Self::COMPONENT,
            "Registering return",
            Some(correlation_id),
            log_context(&[
                ("loan_id", loan_id.to_string()),
                ("returned_quantity", returned_quantity.to_string()),
            ]),
        );

        let result = self
            .try_register_return(loan_id, returned_quantity, return_date, correlation_id)
            .await;
        self.log_outcome("Return registered", &result, correlation_id);
        result
    }

    async fn try_register_return(
        &self,
        loan_id: LoanId,
        returned_quantity: u32,
        return_date: NaiveDate,
        correlation_id: Uuid,
    ) -> Result<Loan, ApplicationError> {
        let mut loan = self.find_loan(loan_id).await?;
        loan.register_return(returned_quantity, return_date)?;
        self.loan_repository.save(&loan).await?;
        self.publish_events(&mut loan, correlation_id)?;
        Ok(loan)
    }

    /// 貸出を削除する
    /// 在庫は台帳から導出するため、在庫の補正は行わない
    ///
    /// # Returns
    /// * `Ok(())` - 削除成功
    /// * `Err(ApplicationError::NotFound)` - 貸出が存在しない
    pub async fn delete_loan(&self, loan_id: LoanId) -> Result<(), ApplicationError> {
        let correlation_id = Uuid::new_v4();
        self.logger.info(
            Self::COMPONENT,
            "Deleting loan",
            Some(correlation_id),
            log_context(&[("loan_id", loan_id.to_string())]),
        );

        let result = self.try_delete_loan(loan_id, correlation_id).await;
        self.log_outcome("Loan deleted", &result, correlation_id);
        result.map(|_| ())
    }

    async fn try_delete_loan(
        &self,
        loan_id: LoanId,
        correlation_id: Uuid,
    ) -> Result<Loan, ApplicationError> {
        let mut loan = self.find_loan(loan_id).await?;
        if !self.loan_repository.delete(loan_id).await? {
            return Err(Self::loan_not_found(loan_id));
        }
        loan.mark_deleted();
        self.publish_events(&mut loan, correlation_id)?;
        Ok(loan)
    }

    async fn find_book(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id))
            })
    }

    async fn find_loan(&self, loan_id: LoanId) -> Result<Loan, ApplicationError> {
        self.loan_repository
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| Self::loan_not_found(loan_id))
    }

    fn loan_not_found(loan_id: LoanId) -> ApplicationError {
        ApplicationError::NotFound(format!("貸出が見つかりません: {}", loan_id))
    }

    fn publish_events(&self, loan: &mut Loan, correlation_id: Uuid) -> Result<(), ApplicationError> {
        for event in loan.take_domain_events() {
            let event = event.with_correlation_id(correlation_id);
            self.event_publisher
                .publish(&event)
                .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn log_outcome(
        &self,
        message: &str,
        result: &Result<Loan, ApplicationError>,
        correlation_id: Uuid,
    ) {
        match result {
            Ok(loan) => self.logger.info(
                Self::COMPONENT,
                message,
                Some(correlation_id),
                log_context(&[
                    ("loan_id", loan.id().to_string()),
                    ("status", loan.status().to_string()),
                    ("pending_quantity", loan.pending_quantity().to_string()),
                ]),
            ),
            Err(ApplicationError::RepositoryError(err)) => self.logger.error(
                Self::COMPONENT,
                "Loan operation failed",
                Some(correlation_id),
                log_context(&[("error", err.to_string())]),
            ),
            Err(err) => self.logger.warn(
                Self::COMPONENT,
                "Loan operation rejected",
                Some(correlation_id),
                log_context(&[("reason", err.to_string())]),
            ),
        }
    }
}

/// 書籍アプリケーションサービス
/// 書籍カタログの登録・所蔵数の変更・削除を担当する
pub struct BookApplicationService {
    book_repository: Arc<dyn BookRepository>,
    logger: Arc<dyn Logger>,
}

impl BookApplicationService {
    const COMPONENT: &'static str = "BookApplicationService";

    /// 新しい書籍アプリケーションサービスを作成
    pub fn new(book_repository: Arc<dyn BookRepository>, logger: Arc<dyn Logger>) -> Self {
        Self {
            book_repository,
            logger,
        }
    }

    /// 書籍を登録する
    ///
    /// # Returns
    /// * `Ok(Book)` - 登録された書籍
    /// * `Err(ApplicationError)` - 登録失敗（書名が空など）
    pub async fn register_book(
        &self,
        school_id: SchoolId,
        title: String,
        total_copies: u32,
    ) -> Result<Book, ApplicationError> {
        let book = Book::new(
            self.book_repository.next_identity(),
            school_id,
            title,
            total_copies,
        )?;
        self.book_repository.save(&book).await?;

        self.logger.info(
            Self::COMPONENT,
            "Book registered",
            None,
            log_context(&[
                ("book_id", book.id().to_string()),
                ("school_id", school_id.to_string()),
                ("total_copies", total_copies.to_string()),
            ]),
        );
        Ok(book)
    }

    /// 所蔵数を変更する
    /// 貸出可能数は次回の在庫計算で新しい所蔵数から導出される
    pub async fn update_total_copies(
        &self,
        book_id: BookId,
        total_copies: u32,
    ) -> Result<Book, ApplicationError> {
        let mut book = self.find_book(book_id).await?;
        book.change_total_copies(total_copies);
        self.book_repository.save(&book).await?;

        self.logger.info(
            Self::COMPONENT,
            "Total copies updated",
            None,
            log_context(&[
                ("book_id", book_id.to_string()),
                ("total_copies", total_copies.to_string()),
            ]),
        );
        Ok(book)
    }

    /// 書籍を削除する
    /// 書籍を参照する貸出はそのまま残る
    pub async fn delete_book(&self, book_id: BookId) -> Result<(), ApplicationError> {
        if !self.book_repository.delete(book_id).await? {
            return Err(Self::book_not_found(book_id));
        }
        self.logger.info(
            Self::COMPONENT,
            "Book deleted",
            None,
            log_context(&[("book_id", book_id.to_string())]),
        );
        Ok(())
    }

    /// 書籍IDで書籍を取得
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.find_book(book_id).await
    }

    /// 書籍の一覧を取得
    /// 書名の昇順で並べて返す
    pub async fn list_books(
        &self,
        school_id: Option<SchoolId>,
    ) -> Result<Vec<Book>, ApplicationError> {
        self.book_repository
            .find_all(school_id)
            .await
            .map_err(ApplicationError::from)
    }

    async fn find_book(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| Self::book_not_found(book_id))
    }

    fn book_not_found(book_id: BookId) -> ApplicationError {
        ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id))
    }
}
