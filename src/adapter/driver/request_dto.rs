use crate::domain::error::DomainError;
use crate::domain::model::{Borrower, StudentId, TeacherId, DEFAULT_TOTAL_COPIES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 書籍登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub school_id: Uuid,
    pub title: String,
    /// 省略時は1冊
    pub total_copies: Option<u32>,
}

impl CreateBookRequest {
    pub fn total_copies(&self) -> u32 {
        self.total_copies.unwrap_or(DEFAULT_TOTAL_COPIES)
    }
}

/// 所蔵数変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateCopiesRequest {
    pub total_copies: u32,
}

/// 貸出登録用のリクエストDTO
/// student_id と teacher_id はどちらか一方だけを指定する
#[derive(Serialize, Deserialize)]
pub struct CreateLoanRequest {
    pub book_id: Uuid,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub taken_quantity: u32,
    /// 省略時は当日
    pub loan_date: Option<NaiveDate>,
}

impl CreateLoanRequest {
    /// 借り手を組み立てる
    pub fn borrower(&self) -> Result<Borrower, DomainError> {
        Borrower::from_parts(
            self.student_id.map(StudentId::from_uuid),
            self.teacher_id.map(TeacherId::from_uuid),
        )
    }
}

/// 返却登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RegisterReturnRequest {
    /// 累計返却数
    pub returned_quantity: u32,
    /// 省略時は当日
    pub return_date: Option<NaiveDate>,
}

/// 学校で絞り込むクエリパラメータ
#[derive(Deserialize, Default)]
pub struct SchoolQueryParams {
    pub school_id: Option<Uuid>,
}

/// 貸出一覧取得用のクエリパラメータ
#[derive(Deserialize, Default)]
pub struct LoansQueryParams {
    pub school_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
}

impl LoansQueryParams {
    /// 借り手の指定があれば組み立てる
    /// 生徒と教師の両方が指定された場合はエラー
    pub fn borrower(&self) -> Result<Option<Borrower>, DomainError> {
        match (self.student_id, self.teacher_id) {
            (None, None) => Ok(None),
            (student_id, teacher_id) => Borrower::from_parts(
                student_id.map(StudentId::from_uuid),
                teacher_id.map(TeacherId::from_uuid),
            )
            .map(Some),
        }
    }
}
