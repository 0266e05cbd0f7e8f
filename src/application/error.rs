use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、イベント発行エラーをラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// イベント発行エラー
    #[error("Event publishing failed: {0}")]
    EventPublishingFailed(String),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
}
