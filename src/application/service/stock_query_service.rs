use crate::application::ApplicationError;
use crate::domain::model::{Book, BookId, SchoolId};
use crate::domain::port::{BookRepository, LoanRepository};
use crate::domain::service::{
    compute_book_stock, compute_stock_summary, compute_stocks, BookStock, StockSummary,
};
use std::sync::Arc;

/// 在庫クエリサービス
/// 在庫は保存せず、書籍の所蔵数と未返却の貸出から毎回導出する
pub struct StockQueryService {
    book_repository: Arc<dyn BookRepository>,
    loan_repository: Arc<dyn LoanRepository>,
}

impl StockQueryService {
    /// 新しい在庫クエリサービスを作成
    ///
    /// # Arguments
    /// * `book_repository` - 書籍リポジトリ
    /// * `loan_repository` - 貸出リポジトリ
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        loan_repository: Arc<dyn LoanRepository>,
    ) -> Self {
        Self {
            book_repository,
            loan_repository,
        }
    }

    /// 書籍の在庫状況を取得
    ///
    /// # Returns
    /// * `Ok((Book, BookStock))` - 書籍とその在庫状況
    /// * `Err(ApplicationError::NotFound)` - 書籍が存在しない
    pub async fn get_book_stock(
        &self,
        book_id: BookId,
    ) -> Result<(Book, BookStock), ApplicationError> {
        let book = self
            .book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id))
            })?;
        let active_loans = self.loan_repository.find_active_by_book(book_id).await?;
        let stock = compute_book_stock(&book, &active_loans);
        Ok((book, stock))
    }

    /// 在庫集計を取得
    /// 学校IDが指定された場合はその学校の書籍と貸出のみを集計する
    pub async fn get_stock_summary(
        &self,
        school_id: Option<SchoolId>,
    ) -> Result<StockSummary, ApplicationError> {
        let books = self.book_repository.find_all(school_id).await?;
        let active_loans = self.loan_repository.find_active(school_id).await?;
        Ok(compute_stock_summary(&books, &active_loans))
    }

    /// 低在庫（貸出可能数が5以下）の書籍を取得
    /// 書名の昇順で並べて返す
    pub async fn get_low_stock_books(
        &self,
        school_id: Option<SchoolId>,
    ) -> Result<Vec<(Book, BookStock)>, ApplicationError> {
        let books = self.book_repository.find_all(school_id).await?;
        let active_loans = self.loan_repository.find_active(school_id).await?;

        Ok(compute_stocks(&books, &active_loans)
            .into_iter()
            .filter(|(_, stock)| stock.is_low_stock())
            .map(|(book, stock)| (book.clone(), stock))
            .collect())
    }
}
