use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::model::{BookId, Borrower, LoanId, LoanStatus, SchoolId};

/// イベントのメタデータ
#[derive(Debug, Clone, PartialEq)]
pub struct EventMetadata {
    /// イベントID
    pub event_id: Uuid,
    /// 相関ID（1回のユースケース呼び出しで共通）
    pub correlation_id: Uuid,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    fn new() -> Self {
        let event_id = Uuid::new_v4();
        Self {
            event_id,
            correlation_id: event_id,
            occurred_at: Utc::now(),
        }
    }
}

/// ドメインイベント列挙型
/// 貸出台帳に対する確定済みの変更を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// 貸出が登録された
    LoanRegistered(LoanRegistered),
    /// 返却が登録された
    ReturnRegistered(ReturnRegistered),
    /// 貸出が削除された
    LoanDeleted(LoanDeleted),
}

impl DomainEvent {
    /// イベント種別名を取得
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::LoanRegistered(_) => "LoanRegistered",
            DomainEvent::ReturnRegistered(_) => "ReturnRegistered",
            DomainEvent::LoanDeleted(_) => "LoanDeleted",
        }
    }

    /// メタデータを取得
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::LoanRegistered(e) => &e.metadata,
            DomainEvent::ReturnRegistered(e) => &e.metadata,
            DomainEvent::LoanDeleted(e) => &e.metadata,
        }
    }

    /// 相関IDを設定したイベントを返す
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        match &mut self {
            DomainEvent::LoanRegistered(e) => e.metadata.correlation_id = correlation_id,
            DomainEvent::ReturnRegistered(e) => e.metadata.correlation_id = correlation_id,
            DomainEvent::LoanDeleted(e) => e.metadata.correlation_id = correlation_id,
        }
        self
    }
}

/// 貸出登録イベント
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRegistered {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub school_id: SchoolId,
    pub borrower: Borrower,
    pub taken_quantity: u32,
    pub loan_date: NaiveDate,
    pub metadata: EventMetadata,
}

impl LoanRegistered {
    /// 新しい貸出登録イベントを作成
    pub fn new(
        loan_id: LoanId,
        book_id: BookId,
        school_id: SchoolId,
        borrower: Borrower,
        taken_quantity: u32,
        loan_date: NaiveDate,
    ) -> Self {
        Self {
            loan_id,
            book_id,
            school_id,
            borrower,
            taken_quantity,
            loan_date,
            metadata: EventMetadata::new(),
        }
    }
}

/// 返却登録イベント
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRegistered {
    pub loan_id: LoanId,
    pub book_id: BookId,
    /// 累計返却数（差分ではない）
    pub returned_quantity: u32,
    /// 未返却数
    pub pending_quantity: u32,
    pub status: LoanStatus,
    pub return_date: NaiveDate,
    pub metadata: EventMetadata,
}

impl ReturnRegistered {
    /// 新しい返却登録イベントを作成
    pub fn new(
        loan_id: LoanId,
        book_id: BookId,
        returned_quantity: u32,
        pending_quantity: u32,
        status: LoanStatus,
        return_date: NaiveDate,
    ) -> Self {
        Self {
            loan_id,
            book_id,
            returned_quantity,
            pending_quantity,
            status,
            return_date,
            metadata: EventMetadata::new(),
        }
    }
}

/// 貸出削除イベント
#[derive(Debug, Clone, PartialEq)]
pub struct LoanDeleted {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub metadata: EventMetadata,
}

impl LoanDeleted {
    /// 新しい貸出削除イベントを作成
    pub fn new(loan_id: LoanId, book_id: BookId) -> Self {
        Self {
            loan_id,
            book_id,
            metadata: EventMetadata::new(),
        }
    }
}
