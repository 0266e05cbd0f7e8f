use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから識別子を作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から識別子を作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_identifier!(
    /// 書籍の一意識別子
    BookId
);

uuid_identifier!(
    /// 貸出の一意識別子
    LoanId
);

uuid_identifier!(
    /// 学校の一意識別子
    /// 書籍と貸出はいずれか1つの学校に属する
    SchoolId
);

uuid_identifier!(
    /// 生徒の一意識別子
    StudentId
);

uuid_identifier!(
    /// 教師の一意識別子
    TeacherId
);

/// 借り手
/// 生徒か教師のどちらか一方のみを表す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Borrower {
    Student(StudentId),
    Teacher(TeacherId),
}

impl Borrower {
    /// 生徒IDと教師IDのオプションから借り手を作成
    /// どちらか一方だけが指定されている必要がある
    pub fn from_parts(
        student_id: Option<StudentId>,
        teacher_id: Option<TeacherId>,
    ) -> Result<Self, DomainError> {
        match (student_id, teacher_id) {
            (Some(student_id), None) => Ok(Borrower::Student(student_id)),
            (None, Some(teacher_id)) => Ok(Borrower::Teacher(teacher_id)),
            (None, None) => Err(DomainError::MissingBorrower),
            (Some(_), Some(_)) => Err(DomainError::AmbiguousBorrower),
        }
    }

    /// 永続化用の種別文字列
    pub fn kind(&self) -> &'static str {
        match self {
            Borrower::Student(_) => "student",
            Borrower::Teacher(_) => "teacher",
        }
    }

    /// 借り手のUUIDを取得
    pub fn id(&self) -> Uuid {
        match self {
            Borrower::Student(id) => id.as_uuid(),
            Borrower::Teacher(id) => id.as_uuid(),
        }
    }

    /// 種別文字列とUUIDから借り手を復元
    pub fn from_kind(kind: &str, id: Uuid) -> Result<Self, DomainError> {
        match kind {
            "student" => Ok(Borrower::Student(StudentId::from_uuid(id))),
            "teacher" => Ok(Borrower::Teacher(TeacherId::from_uuid(id))),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な借り手種別: {}",
                kind
            ))),
        }
    }
}

impl fmt::Display for Borrower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// 貸出のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// 貸出中（返却なし）
    Loaned,
    /// 一部返却済み
    Pending,
    /// 返却完了（終端状態）
    Returned,
}

impl LoanStatus {
    /// 返却数と貸出数からステータスを導出
    pub fn derive(taken_quantity: u32, returned_quantity: u32) -> Self {
        if returned_quantity >= taken_quantity {
            LoanStatus::Returned
        } else if returned_quantity == 0 {
            LoanStatus::Loaned
        } else {
            LoanStatus::Pending
        }
    }

    /// 在庫計算の対象となる（未返却の）ステータスかどうか
    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Loaned | LoanStatus::Pending)
    }

    /// 文字列からLoanStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Loaned" => Ok(LoanStatus::Loaned),
            "Pending" => Ok(LoanStatus::Pending),
            "Returned" => Ok(LoanStatus::Returned),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な貸出ステータス: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            LoanStatus::Loaned => "Loaned",
            LoanStatus::Pending => "Pending",
            LoanStatus::Returned => "Returned",
        };
        write!(f, "{}", status_str)
    }
}
