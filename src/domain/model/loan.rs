use chrono::NaiveDate;

use crate::domain::error::DomainError;
use crate::domain::event::{DomainEvent, LoanDeleted, LoanRegistered, ReturnRegistered};
use crate::domain::model::{BookId, Borrower, LoanId, LoanStatus, SchoolId};

/// Loan集約
/// 1件の貸出の状態遷移を管理する
///
/// 状態は Loaned → Pending → Returned の順にしか進まない。
/// 返却数は呼び出し側が指定する累計値で上書きされる（加算ではない）。
#[derive(Debug, Clone)]
pub struct Loan {
    id: LoanId,
    book_id: BookId,
    school_id: SchoolId,
    borrower: Borrower,
    taken_quantity: u32,
    returned_quantity: u32,
    status: LoanStatus,
    loan_date: NaiveDate,
    return_date: Option<NaiveDate>,
    domain_events: Vec<DomainEvent>,
}

impl Loan {
    /// 新しい貸出を作成
    /// 初期ステータスはLoaned、返却数は0
    ///
    /// # Returns
    /// * `Ok(Loan)` - 作成成功
    /// * `Err(DomainError::InvalidQuantity)` - 貸出数が0
    pub fn new(
        id: LoanId,
        book_id: BookId,
        school_id: SchoolId,
        borrower: Borrower,
        taken_quantity: u32,
        loan_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        if taken_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        let event = LoanRegistered::new(
            id,
            book_id,
            school_id,
            borrower,
            taken_quantity,
            loan_date,
        );

        Ok(Self {
            id,
            book_id,
            school_id,
            borrower,
            taken_quantity,
            returned_quantity: 0,
            status: LoanStatus::Loaned,
            loan_date,
            return_date: None,
            domain_events: vec![DomainEvent::LoanRegistered(event)],
        })
    }

    /// データベースから取得したデータで貸出を再構築
    /// ステータスは保存値ではなく数量から導出し直す
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: LoanId,
        book_id: BookId,
        school_id: SchoolId,
        borrower: Borrower,
        taken_quantity: u32,
        returned_quantity: u32,
        loan_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> Result<Self, DomainError> {
        if taken_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if returned_quantity > taken_quantity {
            return Err(DomainError::InvalidReturnQuantity {
                returned: returned_quantity,
                taken: taken_quantity,
            });
        }
        Ok(Self {
            id,
            book_id,
            school_id,
            borrower,
            taken_quantity,
            returned_quantity,
            status: LoanStatus::derive(taken_quantity, returned_quantity),
            loan_date,
            return_date,
            domain_events: Vec::new(),
        })
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn school_id(&self) -> SchoolId {
        self.school_id
    }

    pub fn borrower(&self) -> Borrower {
        self.borrower
    }

    pub fn taken_quantity(&self) -> u32 {
        self.taken_quantity
    }

    pub fn returned_quantity(&self) -> u32 {
        self.returned_quantity
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn loan_date(&self) -> NaiveDate {
        self.loan_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    /// 未返却数（貸出数 - 返却数）
    pub fn pending_quantity(&self) -> u32 {
        self.taken_quantity.saturating_sub(self.returned_quantity)
    }

    /// 在庫計算の対象となる貸出かどうか
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// 返却を登録する
    /// 返却数は累計値として上書きする
    ///
    /// 事前条件:
    /// - ステータスがReturnedではない
    /// - 1 <= returned_quantity <= taken_quantity
    ///
    /// 検証に失敗した場合は状態を一切変更しない
    pub fn register_return(
        &mut self,
        returned_quantity: u32,
        return_date: NaiveDate,
    ) -> Result<(), DomainError> {
        if self.status == LoanStatus::Returned {
            return Err(DomainError::InvalidLoanState(
                "返却完了の貸出には返却を登録できません".to_string(),
            ));
        }

        if returned_quantity == 0 || returned_quantity > self.taken_quantity {
            return Err(DomainError::InvalidReturnQuantity {
                returned: returned_quantity,
                taken: self.taken_quantity,
            });
        }

        self.returned_quantity = returned_quantity;
        self.return_date = Some(return_date);
        self.status = if returned_quantity >= self.taken_quantity {
            LoanStatus::Returned
        } else {
            LoanStatus::Pending
        };

        let event = ReturnRegistered::new(
            self.id,
            self.book_id,
            self.returned_quantity,
            self.pending_quantity(),
            self.status,
            return_date,
        );
        self.domain_events.push(DomainEvent::ReturnRegistered(event));

        Ok(())
    }

    /// 貸出の削除を記録する
    /// 台帳からの削除自体はリポジトリが行う
    pub fn mark_deleted(&mut self) {
        let event = LoanDeleted::new(self.id, self.book_id);
        self.domain_events.push(DomainEvent::LoanDeleted(event));
    }
}
