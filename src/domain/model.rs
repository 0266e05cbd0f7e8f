// ドメインモデル（エンティティと値オブジェクト）

mod book;
mod loan;
mod value_objects;

pub use value_objects::{BookId, Borrower, LoanId, LoanStatus, SchoolId, StudentId, TeacherId};

pub use book::{Book, DEFAULT_TOTAL_COPIES};
pub use loan::Loan;
