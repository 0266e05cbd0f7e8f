use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Book, BookId, SchoolId};
use crate::domain::port::{BookRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL書籍リポジトリ
/// MySQLデータベースを使用して書籍カタログを永続化する
/// 貸出可能数・貸出中数は保存しない
#[derive(Clone)]
pub struct MySqlBookRepository {
    pool: Pool<MySql>,
}

impl MySqlBookRepository {
    /// 新しいMySQL書籍リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から書籍を再構築する
    fn book_from_row(row: &MySqlRow) -> Result<Book, RepositoryError> {
        let book_id = BookId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
        })?;
        let school_id = SchoolId::from_string(row.get("school_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("学校IDの解析に失敗しました: {}", e))
        })?;

        Ok(Book::reconstruct(
            book_id,
            school_id,
            row.get("title"),
            row.get::<Option<u32>, _>("total_copies"),
        ))
    }
}

#[async_trait]
impl BookRepository for MySqlBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        // 書籍データをbooksテーブルにUPSERT
        sqlx::query(
            r#"
            INSERT INTO books (id, school_id, title, total_copies)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                total_copies = VALUES(total_copies)
            "#,
        )
        .bind(book.id().to_string())
        .bind(book.school_id().to_string())
        .bind(book.title())
        .bind(book.total_copies())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("書籍の保存に失敗しました: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query("SELECT id, school_id, title, total_copies FROM books WHERE id = ?")
            .bind(book_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("書籍の取得に失敗しました: {}", e)))?;

        row.as_ref().map(Self::book_from_row).transpose()
    }

    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Book>, RepositoryError> {
        // 書名の昇順で並べる
        let sql = match school_id {
            Some(_) => "SELECT id, school_id, title, total_copies FROM books WHERE school_id = ? ORDER BY title ASC, id ASC",
            None => "SELECT id, school_id, title, total_copies FROM books ORDER BY title ASC, id ASC",
        };
        let mut query = sqlx::query(sql);
        if let Some(school_id) = school_id {
            query = query.bind(school_id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("書籍一覧の取得に失敗しました: {}", e)))?;

        rows.iter().map(Self::book_from_row).collect()
    }

    async fn delete(&self, book_id: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(book_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("書籍の削除に失敗しました: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
