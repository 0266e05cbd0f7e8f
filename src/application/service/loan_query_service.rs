use crate::application::ApplicationError;
use crate::domain::model::{Borrower, Loan, LoanId, SchoolId};
use crate::domain::port::LoanRepository;
use crate::domain::service::{compute_loan_statistics, LoanStatistics};
use std::sync::Arc;

/// 貸出クエリサービス
/// 読み取り専用の貸出操作を提供する
pub struct LoanQueryService {
    loan_repository: Arc<dyn LoanRepository>,
}

impl LoanQueryService {
    /// 新しい貸出クエリサービスを作成
    pub fn new(loan_repository: Arc<dyn LoanRepository>) -> Self {
        Self { loan_repository }
    }

    /// 貸出IDで貸出を取得
    pub async fn get_loan(&self, loan_id: LoanId) -> Result<Loan, ApplicationError> {
        self.loan_repository
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("貸出が見つかりません: {}", loan_id))
            })
    }

    /// 未返却の貸出を取得
    /// 貸出日の降順で並べて返す
    pub async fn list_active_loans(
        &self,
        school_id: Option<SchoolId>,
    ) -> Result<Vec<Loan>, ApplicationError> {
        self.loan_repository
            .find_active(school_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 借り手の貸出履歴（返却済みを含む）を取得
    pub async fn list_loans_by_borrower(
        &self,
        borrower: Borrower,
    ) -> Result<Vec<Loan>, ApplicationError> {
        self.loan_repository
            .find_by_borrower(borrower)
            .await
            .map_err(ApplicationError::from)
    }

    /// 貸出の統計を取得
    pub async fn get_loan_statistics(
        &self,
        school_id: Option<SchoolId>,
    ) -> Result<LoanStatistics, ApplicationError> {
        let loans = self.loan_repository.find_all(school_id).await?;
        Ok(compute_loan_statistics(&loans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryLoanRepository;
    use crate::domain::model::{BookId, LoanStatus, StudentId, TeacherId};
    use chrono::NaiveDate;

    async fn add_loan(
        repository: &InMemoryLoanRepository,
        school_id: SchoolId,
        borrower: Borrower,
        taken: u32,
        returned: u32,
    ) -> Loan {
        let loan = Loan::reconstruct(
            LoanId::new(),
            BookId::new(),
            school_id,
            borrower,
            taken,
            returned,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            None,
        )
        .unwrap();
        repository.save(&loan).await.unwrap();
        loan
    }

    #[tokio::test]
    async fn test_get_loan_found_and_not_found() {
        let repository = Arc::new(InMemoryLoanRepository::new());
        let service = LoanQueryService::new(repository.clone());
        let loan = add_loan(
            &repository,
            SchoolId::new(),
            Borrower::Student(StudentId::new()),
            2,
            0,
        )
        .await;

        let found = service.get_loan(loan.id()).await.unwrap();
        assert_eq!(found.id(), loan.id());

        let result = service.get_loan(LoanId::new()).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_active_loans_excludes_returned() {
        let repository = Arc::new(InMemoryLoanRepository::new());
        let service = LoanQueryService::new(repository.clone());
        let school_id = SchoolId::new();
        let borrower = Borrower::Student(StudentId::new());
        add_loan(&repository, school_id, borrower, 2, 0).await;
        add_loan(&repository, school_id, borrower, 2, 2).await;
        add_loan(&repository, SchoolId::new(), borrower, 1, 0).await;

        let loans = service.list_active_loans(Some(school_id)).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].status(), LoanStatus::Loaned);
    }

    #[tokio::test]
    async fn test_list_loans_by_borrower() {
        let repository = Arc::new(InMemoryLoanRepository::new());
        let service = LoanQueryService::new(repository.clone());
        let school_id = SchoolId::new();
        let teacher = Borrower::Teacher(TeacherId::new());
        add_loan(&repository, school_id, teacher, 1, 1).await;
        add_loan(&repository, school_id, teacher, 3, 0).await;
        add_loan(&repository, school_id, Borrower::Student(StudentId::new()), 1, 0).await;

        let loans = service.list_loans_by_borrower(teacher).await.unwrap();
        assert_eq!(loans.len(), 2);
        assert!(loans.iter().all(|loan| loan.borrower() == teacher));
    }

    #[tokio::test]
    async fn test_get_loan_statistics() {
        let repository = Arc::new(InMemoryLoanRepository::new());
        let service = LoanQueryService::new(repository.clone());
        let school_id = SchoolId::new();
        let borrower = Borrower::Student(StudentId::new());
        add_loan(&repository, school_id, borrower, 3, 0).await;
        add_loan(&repository, school_id, borrower, 3, 1).await;
        add_loan(&repository, school_id, borrower, 2, 2).await;

        let stats = service.get_loan_statistics(Some(school_id)).await.unwrap();
        assert_eq!(stats.total_loans, 3);
        assert_eq!(stats.loaned_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.returned_count, 1);
        assert_eq!(stats.outstanding_copies, 5);
    }
}
