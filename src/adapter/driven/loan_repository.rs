use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{BookId, Borrower, Loan, LoanId, SchoolId};
use crate::domain::port::{LoanRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const SELECT_LOANS: &str = r#"
    SELECT id, book_id, school_id, borrower_kind, borrower_id,
           taken_quantity, returned_quantity, loan_date, return_date
    FROM loans
"#;

const ACTIVE_CONDITION: &str = "status IN ('Loaned', 'Pending')";

const ORDER_BY_LOAN_DATE: &str = "ORDER BY loan_date DESC, id ASC";

/// MySQL貸出リポジトリ
/// MySQLデータベースを使用して貸出台帳を永続化する
///
/// 借り手は (borrower_kind, borrower_id) の組で保存する。
/// 教師への貸出のために生徒の行を作ることはない。
#[derive(Clone)]
pub struct MySqlLoanRepository {
    pool: Pool<MySql>,
}

impl MySqlLoanRepository {
    /// 新しいMySQL貸出リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から貸出を再構築する
    /// ステータス列は検索用で、再構築時は数量から導出し直す
    fn loan_from_row(row: &MySqlRow) -> Result<Loan, RepositoryError> {
        let loan_id = LoanId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("貸出IDの解析に失敗しました: {}", e))
        })?;
        let book_id = BookId::from_string(row.get("book_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
        })?;
        let school_id = SchoolId::from_string(row.get("school_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("学校IDの解析に失敗しました: {}", e))
        })?;
        let borrower_id = Uuid::parse_str(row.get("borrower_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("借り手IDの解析に失敗しました: {}", e))
        })?;
        let borrower = Borrower::from_kind(row.get("borrower_kind"), borrower_id).map_err(|e| {
            RepositoryError::FetchFailed(format!("借り手の解析に失敗しました: {}", e))
        })?;

        Loan::reconstruct(
            loan_id,
            book_id,
            school_id,
            borrower,
            row.get::<u32, _>("taken_quantity"),
            row.get::<u32, _>("returned_quantity"),
            row.get::<NaiveDate, _>("loan_date"),
            row.get::<Option<NaiveDate>, _>("return_date"),
        )
        .map_err(|e| RepositoryError::FetchFailed(format!("貸出の再構築に失敗しました: {}", e)))
    }

    fn loans_from_rows(rows: &[MySqlRow]) -> Result<Vec<Loan>, RepositoryError> {
        rows.iter().map(Self::loan_from_row).collect()
    }

    fn query_error(action: &str, e: sqlx::Error) -> RepositoryError {
        DatabaseError::QueryError(format!("{}に失敗しました: {}", action, e)).into()
    }
}

#[async_trait]
impl LoanRepository for MySqlLoanRepository {
    async fn save(&self, loan: &Loan) -> Result<(), RepositoryError> {
        // 貸出データをloansテーブルにUPSERT
        // 貸出数・借り手・貸出日は作成後に変わらないため更新対象外
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, book_id, school_id, borrower_kind, borrower_id,
                taken_quantity, returned_quantity, status, loan_date, return_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                returned_quantity = VALUES(returned_quantity),
                status = VALUES(status),
                return_date = VALUES(return_date)
            "#,
        )
        .bind(loan.id().to_string())
        .bind(loan.book_id().to_string())
        .bind(loan.school_id().to_string())
        .bind(loan.borrower().kind())
        .bind(loan.borrower().id().to_string())
        .bind(loan.taken_quantity())
        .bind(loan.returned_quantity())
        .bind(loan.status().to_string())
        .bind(loan.loan_date())
        .bind(loan.return_date())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::query_error("貸出の保存", e))?;

        Ok(())
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", SELECT_LOANS);
        let row = sqlx::query(&sql)
            .bind(loan_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::query_error("貸出の取得", e))?;

        row.as_ref().map(Self::loan_from_row).transpose()
    }

    async fn find_active_by_book(&self, book_id: BookId) -> Result<Vec<Loan>, RepositoryError> {
        let sql = format!(
            "{} WHERE book_id = ? AND {} {}",
            SELECT_LOANS, ACTIVE_CONDITION, ORDER_BY_LOAN_DATE
        );
        let rows = sqlx::query(&sql)
            .bind(book_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::query_error("書籍の貸出一覧の取得", e))?;

        Self::loans_from_rows(&rows)
    }

    async fn find_active(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError> {
        let sql = match school_id {
            Some(_) => format!(
                "{} WHERE school_id = ? AND {} {}",
                SELECT_LOANS, ACTIVE_CONDITION, ORDER_BY_LOAN_DATE
            ),
            None => format!("{} WHERE {} {}", SELECT_LOANS, ACTIVE_CONDITION, ORDER_BY_LOAN_DATE),
        };
        let mut query = sqlx::query(&sql);
        if let Some(school_id) = school_id {
            query = query.bind(school_id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::query_error("未返却の貸出一覧の取得", e))?;

        Self::loans_from_rows(&rows)
    }

    async fn find_all(&self, school_id: Option<SchoolId>) -> Result<Vec<Loan>, RepositoryError> {
        let sql = match school_id {
            Some(_) => format!("{} WHERE school_id = ? {}", SELECT_LOANS, ORDER_BY_LOAN_DATE),
            None => format!("{} {}", SELECT_LOANS, ORDER_BY_LOAN_DATE),
        };
        let mut query = sqlx::query(&sql);
        if let Some(school_id) = school_id {
            query = query.bind(school_id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::query_error("貸出一覧の取得", e))?;

        Self::loans_from_rows(&rows)
    }

    async fn find_by_borrower(&self, borrower: Borrower) -> Result<Vec<Loan>, RepositoryError> {
        let sql = format!(
            "{} WHERE borrower_kind = ? AND borrower_id = ? {}",
            SELECT_LOANS, ORDER_BY_LOAN_DATE
        );
        let rows = sqlx::query(&sql)
            .bind(borrower.kind())
            .bind(borrower.id().to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::query_error("借り手の貸出一覧の取得", e))?;

        Self::loans_from_rows(&rows)
    }

    async fn delete(&self, loan_id: LoanId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM loans WHERE id = ?")
            .bind(loan_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("貸出の削除", e))?;

        Ok(result.rows_affected() > 0)
    }
}
