use crate::domain::error::DomainError;
use crate::domain::model::{BookId, SchoolId};

/// 保存層に所蔵数がない場合に使う既定値
pub const DEFAULT_TOTAL_COPIES: u32 = 1;

/// 書籍集約
/// 所蔵数（total_copies）だけを正として保持する
/// 貸出可能数・貸出中数は貸出台帳から都度導出し、ここには持たない
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    school_id: SchoolId,
    title: String,
    total_copies: u32,
}

impl Book {
    /// 新しい書籍を作成
    ///
    /// # Arguments
    /// * `id` - 書籍ID
    /// * `school_id` - 所属する学校ID
    /// * `title` - 書名（空にできない）
    /// * `total_copies` - 所蔵数
    pub fn new(
        id: BookId,
        school_id: SchoolId,
        title: String,
        total_copies: u32,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "書名は空にできません".to_string(),
            ));
        }
        Ok(Self {
            id,
            school_id,
            title,
            total_copies,
        })
    }

    /// データベースから取得したデータで書籍を再構築
    /// 所蔵数がNULLの場合は1として扱う
    pub fn reconstruct(
        id: BookId,
        school_id: SchoolId,
        title: String,
        total_copies: Option<u32>,
    ) -> Self {
        Self {
            id,
            school_id,
            title,
            total_copies: total_copies.unwrap_or(DEFAULT_TOTAL_COPIES),
        }
    }

    /// 書籍IDを取得
    pub fn id(&self) -> BookId {
        self.id
    }

    /// 学校IDを取得
    pub fn school_id(&self) -> SchoolId {
        self.school_id
    }

    /// 書名を取得
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 所蔵数を取得
    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    /// 所蔵数を変更する
    pub fn change_total_copies(&mut self, total_copies: u32) {
        self.total_copies = total_copies;
    }
}
