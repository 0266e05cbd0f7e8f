use crate::adapter::database_error::DatabaseError;
use crate::domain::port::Logger;
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
    logger: Arc<dyn Logger>,
}

impl DatabaseMigration {
    const COMPONENT: &'static str = "DatabaseMigration";

    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>, logger: Arc<dyn Logger>) -> Self {
        Self { pool, logger }
    }

    /// マイグレーションファイルのリスト（実行順）
    pub fn migrations() -> [&'static str; 2] {
        [
            include_str!("../../migrations/001_create_books_table.sql"),
            include_str!("../../migrations/002_create_loans_table.sql"),
        ]
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (index, migration_sql) in Self::migrations().iter().enumerate() {
            let number = index + 1;
            self.logger.debug(
                Self::COMPONENT,
                &format!("Running migration {}", number),
                None,
                None,
            );
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", number, e))
                })?;
        }

        self.logger
            .info(Self::COMPONENT, "All migrations completed successfully", None, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent_statements() {
        for sql in DatabaseMigration::migrations() {
            assert!(sql.contains("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_loans_table_has_borrower_columns() {
        let loans_sql = DatabaseMigration::migrations()[1];
        assert!(loans_sql.contains("borrower_kind"));
        assert!(loans_sql.contains("borrower_id"));
        // 在庫は導出値なので書籍テーブルには持たない
        let books_sql = DatabaseMigration::migrations()[0];
        assert!(!books_sql.contains("available"));
    }
}
