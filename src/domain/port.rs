// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{Book, BookId, Borrower, Loan, LoanId, SchoolId};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
/// 宣言順に重大度が上がる
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// 出力用の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// 設定値の文字列から変換（大文字小文字は区別しない）
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 書籍リポジトリトレイト
/// 書籍カタログの永続化を抽象化する
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍を保存する（存在すれば更新）
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 書籍IDで書籍を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Book))` - 書籍が見つかった
    /// * `Ok(None)` - 書籍が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 書籍を取得する
    /// 学校IDが指定された場合はその学校の書籍のみ
    /// 書名の昇順で並べて返す
    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Book>, RepositoryError>;

    /// 書籍を削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 対象が存在しなかった
    async fn delete(&self, book_id: BookId) -> Result<bool, RepositoryError>;

    /// 新しい一意の書籍IDを生成する
    fn next_identity(&self) -> BookId {
        BookId::new()
    }
}

/// 貸出リポジトリトレイト
/// 貸出台帳の永続化を抽象化する
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 貸出を保存する（存在すれば更新）
    async fn save(&self, loan: &Loan) -> Result<(), RepositoryError>;

    /// 貸出IDで貸出を検索する
    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>, RepositoryError>;

    /// 指定した書籍の未返却（Loaned / Pending）の貸出を取得する
    async fn find_active_by_book(&self, book_id: BookId) -> Result<Vec<Loan>, RepositoryError>;

    /// 未返却の貸出を取得する
    /// 学校IDが指定された場合はその学校の貸出のみ
    /// 貸出日の降順で並べて返す
    async fn find_active(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError>;

    /// すべての貸出（返却済みを含む）を取得する
    /// 学校IDが指定された場合はその学校の貸出のみ
    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError>;

    /// 借り手の貸出（返却済みを含む）を取得する
    /// 貸出日の降順で並べて返す
    async fn find_by_borrower(&self, borrower: Borrower) -> Result<Vec<Loan>, RepositoryError>;

    /// 貸出を削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 対象が存在しなかった
    async fn delete(&self, loan_id: LoanId) -> Result<bool, RepositoryError>;

    /// 新しい一意の貸出IDを生成する
    fn next_identity(&self) -> LoanId {
        LoanId::new()
    }
}

/// イベント発行エラー
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベント発行者トレイト
/// 確定した変更をドメインイベントとして外部に通知するポート
pub trait EventPublisher: Send + Sync {
    /// イベントを発行する
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError>;
}
