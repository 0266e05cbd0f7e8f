/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 無効な数量（例: 貸出数が0）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 返却数が範囲外（1以上、貸出数以下である必要がある）
    #[error("Invalid return quantity: {returned} (taken: {taken})")]
    InvalidReturnQuantity { returned: u32, taken: u32 },
    /// 無効な貸出状態（例: 返却完了の貸出に再度返却しようとした）
    #[error("Invalid loan state: {0}")]
    InvalidLoanState(String),
    /// 在庫不足（厳格ポリシー時のみ）
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    /// 借り手が指定されていない
    #[error("Borrower is required")]
    MissingBorrower,
    /// 生徒と教師の両方が指定されている
    #[error("Borrower must be either a student or a teacher, not both")]
    AmbiguousBorrower,
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
