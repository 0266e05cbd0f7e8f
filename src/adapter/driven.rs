// 駆動される側アダプター（リポジトリ実装など）

mod book_repository;
mod console_logger;
mod event_publisher;
mod in_memory_repository;
mod loan_repository;

pub use book_repository::MySqlBookRepository;
pub use console_logger::{ConsoleLogger, LogEntry};
pub use event_publisher::ConsoleEventPublisher;
pub use in_memory_repository::{InMemoryBookRepository, InMemoryLoanRepository};
pub use loan_repository::MySqlLoanRepository;
