use crate::domain::model::{Book, BookId, Borrower, Loan, LoanId, SchoolId};
use crate::domain::port::{BookRepository, LoanRepository, RepositoryError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// インメモリ書籍リポジトリ
/// ローカル開発とテストで使用する
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: RwLock<HashMap<BookId, Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        let mut books = self.books.write().await;
        books.insert(book.id(), book.clone());
        Ok(())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError> {
        let books = self.books.read().await;
        Ok(books.get(&book_id).cloned())
    }

    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Book>, RepositoryError> {
        let books = self.books.read().await;
        let mut result: Vec<Book> = books
            .values()
            .filter(|book| school_id.map_or(true, |id| book.school_id() == id))
            .cloned()
            .collect();
        // 書名の昇順でソート
        result.sort_by(|a, b| a.title().cmp(b.title()).then(a.id().cmp(&b.id())));
        Ok(result)
    }

    async fn delete(&self, book_id: BookId) -> Result<bool, RepositoryError> {
        let mut books = self.books.write().await;
        Ok(books.remove(&book_id).is_some())
    }
}

/// インメモリ貸出リポジトリ
/// ローカル開発とテストで使用する
#[derive(Default)]
pub struct InMemoryLoanRepository {
    loans: RwLock<HashMap<LoanId, Loan>>,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Loan>
    where
        F: Fn(&Loan) -> bool,
    {
        let loans = self.loans.read().await;
        let mut result: Vec<Loan> = loans.values().filter(|loan| predicate(loan)).cloned().collect();
        // 貸出日の降順でソート
        result.sort_by(|a, b| b.loan_date().cmp(&a.loan_date()).then(a.id().cmp(&b.id())));
        result
    }
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn save(&self, loan: &Loan) -> Result<(), RepositoryError> {
        let mut loans = self.loans.write().await;
        loans.insert(loan.id(), loan.clone());
        Ok(())
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>, RepositoryError> {
        let loans = self.loans.read().await;
        Ok(loans.get(&loan_id).cloned())
    }

    async fn find_active_by_book(&self, book_id: BookId) -> Result<Vec<Loan>, RepositoryError> {
        Ok(self
            .select(|loan| loan.book_id() == book_id && loan.is_active())
            .await)
    }

    async fn find_active(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError> {
        Ok(self
            .select(|loan| {
                loan.is_active() && school_id.map_or(true, |id| loan.school_id() == id)
            })
            .await)
    }

    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError> {
        Ok(self
            .select(|loan| school_id.map_or(true, |id| loan.school_id() == id))
            .await)
    }

    async fn find_by_borrower(&self, borrower: Borrower) -> Result<Vec<Loan>, RepositoryError> {
        Ok(self.select(|loan| loan.borrower() == borrower).await)
    }

    async fn delete(&self, loan_id: LoanId) -> Result<bool, RepositoryError> {
        let mut loans = self.loans.write().await;
        Ok(loans.remove(&loan_id).is_some())
    }
}
