// ドメインサービス
// 書籍と貸出台帳にまたがる在庫計算を実装
// いずれも取得済みのデータに対する純粋な計算で、I/Oは行わない

use std::collections::HashMap;

use crate::domain::error::DomainError;
use crate::domain::model::{Book, BookId, Loan, LoanStatus};

/// 低在庫とみなす貸出可能数の上限（この数以下なら低在庫）
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// 1冊の書籍の在庫状況
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookStock {
    /// 貸出可能数
    pub available: u32,
    /// 貸出中数（未返却数の合計）
    pub loaned: u32,
}

impl BookStock {
    /// 低在庫かどうか
    pub fn is_low_stock(&self) -> bool {
        self.available <= LOW_STOCK_THRESHOLD
    }
}

/// 書籍の在庫状況を計算する
///
/// 対象の書籍を参照している未返却（Loaned / Pending）の貸出だけを集計する。
/// 他の書籍の貸出や返却完了の貸出は無視する。
pub fn compute_book_stock<'a, I>(book: &Book, loans_for_book: I) -> BookStock
where
    I: IntoIterator<Item = &'a Loan>,
{
    let loaned = loans_for_book
        .into_iter()
        .filter(|loan| loan.book_id() == book.id() && loan.is_active())
        .map(Loan::pending_quantity)
        .fold(0u32, u32::saturating_add);

    BookStock {
        available: book.total_copies().saturating_sub(loaned),
        loaned,
    }
}

/// 全書籍の在庫集計
/// 冊数の合計は書籍ごとの値(u32)を足し合わせるのでu64で持つ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockSummary {
    pub total_books: u32,
    pub total_stock: u64,
    pub total_available: u64,
    /// 所蔵数を上限とした貸出中数の合計
    pub total_loaned: u64,
    pub low_stock_count: u32,
    /// 所蔵数を超えて貸し出されている冊数の合計
    pub total_overcommitted: u64,
}

/// 全書籍の在庫集計を計算する
///
/// 書籍ごとの値を1回のパスで集計するので、
/// `total_available + total_loaned == total_stock` が常に成り立つ。
pub fn compute_stock_summary(books: &[Book], active_loans: &[Loan]) -> StockSummary {
    let loans_by_book = group_active_loans_by_book(active_loans);

    books.iter().fold(StockSummary::default(), |mut summary, book| {
        let stock = compute_book_stock(
            book,
            loans_by_book.get(&book.id()).into_iter().flatten().copied(),
        );
        let loaned_within_stock = stock.loaned.min(book.total_copies());

        summary.total_books += 1;
        summary.total_stock += u64::from(book.total_copies());
        summary.total_available += u64::from(stock.available);
        summary.total_loaned += u64::from(loaned_within_stock);
        summary.total_overcommitted += u64::from(stock.loaned - loaned_within_stock);
        if stock.is_low_stock() {
            summary.low_stock_count += 1;
        }
        summary
    })
}

/// 全書籍について在庫状況を計算し、書籍と組にして返す
/// 書籍の並び順は入力のまま
pub fn compute_stocks<'a>(books: &'a [Book], active_loans: &[Loan]) -> Vec<(&'a Book, BookStock)> {
    let loans_by_book = group_active_loans_by_book(active_loans);

    books
        .iter()
        .map(|book| {
            let stock = compute_book_stock(
                book,
                loans_by_book.get(&book.id()).into_iter().flatten().copied(),
            );
            (book, stock)
        })
        .collect()
}

fn group_active_loans_by_book(loans: &[Loan]) -> HashMap<BookId, Vec<&Loan>> {
    let mut groups: HashMap<BookId, Vec<&Loan>> = HashMap::new();
    for loan in loans.iter().filter(|loan| loan.is_active()) {
        groups.entry(loan.book_id()).or_default().push(loan);
    }
    groups
}

/// 貸出の統計（ダッシュボード用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoanStatistics {
    pub total_loans: u32,
    pub loaned_count: u32,
    pub pending_count: u32,
    pub returned_count: u32,
    /// 未返却数の合計
    pub outstanding_copies: u64,
}

/// 貸出台帳から統計を計算する
pub fn compute_loan_statistics(loans: &[Loan]) -> LoanStatistics {
    loans.iter().fold(LoanStatistics::default(), |mut stats, loan| {
        stats.total_loans += 1;
        match loan.status() {
            LoanStatus::Loaned => stats.loaned_count += 1,
            LoanStatus::Pending => stats.pending_count += 1,
            LoanStatus::Returned => stats.returned_count += 1,
        }
        if loan.is_active() {
            stats.outstanding_copies += u64::from(loan.pending_quantity());
        }
        stats
    })
}

/// 貸出登録時の在庫チェック方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanStockPolicy {
    /// 貸出可能数を超える貸出を拒否する
    #[default]
    Strict,
    /// 在庫チェックを行わない（所蔵数を超えた貸出を許容する）
    AllowOvercommit,
}

impl LoanStockPolicy {
    /// 文字列から方針を作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "strict" => Ok(LoanStockPolicy::Strict),
            "allow_overcommit" => Ok(LoanStockPolicy::AllowOvercommit),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な在庫チェック方針: {}",
                s
            ))),
        }
    }

    /// 設定値としての表記
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStockPolicy::Strict => "strict",
            LoanStockPolicy::AllowOvercommit => "allow_overcommit",
        }
    }

    /// 現在の在庫に対して貸出数が許容されるかチェックする
    pub fn check(&self, requested: u32, stock: BookStock) -> Result<(), DomainError> {
        match self {
            LoanStockPolicy::Strict if requested > stock.available => {
                Err(DomainError::InsufficientStock {
                    requested,
                    available: stock.available,
                })
            }
            _ => Ok(()),
        }
    }
}
