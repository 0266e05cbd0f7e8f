use crate::domain::event::DomainEvent;
use crate::domain::port::{EventPublisher, Logger, PublisherError};
use std::collections::HashMap;
use std::sync::Arc;

/// コンソールイベント発行者
/// ドメインイベントを構造化ログとして出力する
pub struct ConsoleEventPublisher {
    logger: Arc<dyn Logger>,
}

impl ConsoleEventPublisher {
    const COMPONENT: &'static str = "EventPublisher";

    /// 新しいコンソールイベント発行者を作成
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// イベントの内容をログのコンテキストに展開する
    fn event_context(event: &DomainEvent) -> HashMap<String, String> {
        let metadata = event.metadata();
        let mut context = HashMap::new();
        context.insert("event_id".to_string(), metadata.event_id.to_string());
        context.insert(
            "occurred_at".to_string(),
            metadata.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );

        match event {
            DomainEvent::LoanRegistered(e) => {
                context.insert("loan_id".to_string(), e.loan_id.to_string());
                context.insert("book_id".to_string(), e.book_id.to_string());
                context.insert("school_id".to_string(), e.school_id.to_string());
                context.insert("borrower".to_string(), e.borrower.to_string());
                context.insert("taken_quantity".to_string(), e.taken_quantity.to_string());
                context.insert("loan_date".to_string(), e.loan_date.to_string());
            }
            DomainEvent::ReturnRegistered(e) => {
                context.insert("loan_id".to_string(), e.loan_id.to_string());
                context.insert("book_id".to_string(), e.book_id.to_string());
                context.insert(
                    "returned_quantity".to_string(),
                    e.returned_quantity.to_string(),
                );
                context.insert("pending_quantity".to_string(), e.pending_quantity.to_string());
                context.insert("status".to_string(), e.status.to_string());
                context.insert("return_date".to_string(), e.return_date.to_string());
            }
            DomainEvent::LoanDeleted(e) => {
                context.insert("loan_id".to_string(), e.loan_id.to_string());
                context.insert("book_id".to_string(), e.book_id.to_string());
            }
        }

        context
    }
}

impl EventPublisher for ConsoleEventPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError> {
        self.logger.info(
            Self::COMPONENT,
            &format!("[イベント] {}", event.event_type()),
            Some(event.metadata().correlation_id),
            Some(Self::event_context(event)),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{LoanDeleted, LoanRegistered, ReturnRegistered};
    use crate::domain::model::{BookId, Borrower, LoanId, LoanStatus, SchoolId, TeacherId};
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// 出力内容を記録するロガー
    #[derive(Default)]
    struct CapturingLogger {
        lines: Mutex<Vec<(String, Option<Uuid>, HashMap<String, String>)>>,
    }

    impl Logger for CapturingLogger {
        fn debug(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}

        fn info(
            &self,
            _component: &str,
            message: &str,
            correlation_id: Option<Uuid>,
            context: Option<HashMap<String, String>>,
        ) {
            self.lines.lock().unwrap().push((
                message.to_string(),
                correlation_id,
                context.unwrap_or_default(),
            ));
        }

        fn warn(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}

        fn error(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    #[test]
    fn test_publish_loan_registered_event() {
        let logger = Arc::new(CapturingLogger::default());
        let publisher = ConsoleEventPublisher::new(logger.clone());
        let correlation_id = Uuid::new_v4();
        let teacher = Borrower::Teacher(TeacherId::new());
        let event = DomainEvent::LoanRegistered(LoanRegistered::new(
            LoanId::new(),
            BookId::new(),
            SchoolId::new(),
            teacher,
            3,
            date(),
        ))
        .with_correlation_id(correlation_id);

        assert!(publisher.publish(&event).is_ok());

        let lines = logger.lines.lock().unwrap();
        let (message, logged_correlation, context) = &lines[0];
        assert!(message.contains("LoanRegistered"));
        assert_eq!(*logged_correlation, Some(correlation_id));
        assert_eq!(context["taken_quantity"], "3");
        assert_eq!(context["borrower"], teacher.to_string());
    }

    #[test]
    fn test_publish_return_registered_event() {
        let logger = Arc::new(CapturingLogger::default());
        let publisher = ConsoleEventPublisher::new(logger.clone());
        let event = DomainEvent::ReturnRegistered(ReturnRegistered::new(
            LoanId::new(),
            BookId::new(),
            2,
            1,
            LoanStatus::Pending,
            date(),
        ));

        assert!(publisher.publish(&event).is_ok());

        let lines = logger.lines.lock().unwrap();
        let context = &lines[0].2;
        assert_eq!(context["returned_quantity"], "2");
        assert_eq!(context["pending_quantity"], "1");
        assert_eq!(context["status"], "Pending");
        assert_eq!(context["return_date"], "2024-04-10");
    }

    #[test]
    fn test_publish_loan_deleted_event() {
        let logger = Arc::new(CapturingLogger::default());
        let publisher = ConsoleEventPublisher::new(logger.clone());
        let loan_id = LoanId::new();
        let event = DomainEvent::LoanDeleted(LoanDeleted::new(loan_id, BookId::new()));

        assert!(publisher.publish(&event).is_ok());

        let lines = logger.lines.lock().unwrap();
        assert!(lines[0].0.contains("LoanDeleted"));
        assert_eq!(lines[0].2["loan_id"], loan_id.to_string());
    }
}
