use crate::domain::port::{LogLevel, Logger};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::collections::HashMap;
use uuid::Uuid;

/// ログエントリ
/// 1行の構造化ログを表す
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    pub correlation_id: Option<Uuid>,
    /// キー順に出力するためBTreeMapで保持
    pub context: BTreeMap<String, String>,
}

impl LogEntry {
    /// 新しいログエントリを作成
    pub fn new(level: LogLevel, component: &str, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.to_string(),
            message: message.to_string(),
            correlation_id: None,
            context: BTreeMap::new(),
        }
    }

    /// 相関IDを設定
    pub fn with_correlation_id(mut self, correlation_id: Option<Uuid>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// 追加コンテキストを設定
    pub fn with_context(mut self, context: Option<HashMap<String, String>>) -> Self {
        if let Some(context) = context {
            self.context.extend(context);
        }
        self
    }

    /// ログエントリを1行の文字列にする
    ///
    /// `[時刻] [レベル] [コンポーネント] [correlation_id: ..] メッセージ [k=v, ..]`
    pub fn format(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("[{}]", self.level.as_str()),
            format!("[{}]", self.component),
        ];

        if let Some(correlation_id) = self.correlation_id {
            parts.push(format!("[correlation_id: {}]", correlation_id));
        }

        parts.push(self.message.clone());

        if !self.context.is_empty() {
            let context_str = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("[{}]", context_str));
        }

        parts.join(" ")
    }
}

/// コンソールログ実装
/// WARN以下は標準出力、ERRORは標準エラー出力に書く
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::with_min_level(LogLevel::Info)
    }

    /// 指定レベル未満のログを捨てるロガーを作成
    pub fn with_min_level(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    /// このレベルのログを出力するか
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn emit(
        &self,
        level: LogLevel,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let line = LogEntry::new(level, component, message)
            .with_correlation_id(correlation_id)
            .with_context(context)
            .format();

        match level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for ConsoleLogger {
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        self.emit(LogLevel::Debug, component, message, correlation_id, context);
    }

    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        self.emit(LogLevel::Info, component, message, correlation_id, context);
    }

    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        self.emit(LogLevel::Warning, component, message, correlation_id, context);
    }

    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        self.emit(LogLevel::Error, component, message, correlation_id, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_format() {
        let correlation_id = Uuid::new_v4();
        let mut context = HashMap::new();
        context.insert("taken_quantity".to_string(), "3".to_string());
        context.insert("book_id".to_string(), "b-1".to_string());

        let formatted = LogEntry::new(LogLevel::Info, "LoanApplicationService", "貸出を登録しました")
            .with_correlation_id(Some(correlation_id))
            .with_context(Some(context))
            .format();

        assert!(formatted.contains("[INFO]"));
        assert!(formatted.contains("[LoanApplicationService]"));
        assert!(formatted.contains(&format!("[correlation_id: {}]", correlation_id)));
        assert!(formatted.contains("貸出を登録しました"));
        // コンテキストはキー順
        assert!(formatted.ends_with("[book_id=b-1, taken_quantity=3]"));
    }

    #[test]
    fn test_log_entry_without_optional_parts() {
        let formatted = LogEntry::new(LogLevel::Warning, "RestApi", "not found")
            .with_correlation_id(None)
            .with_context(None)
            .format();

        assert!(formatted.contains("[WARN]"));
        assert!(!formatted.contains("correlation_id"));
        assert!(formatted.ends_with("not found"));
    }

    #[test]
    fn test_min_level_filter() {
        let logger = ConsoleLogger::with_min_level(LogLevel::Warning);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warning));
        assert!(logger.enabled(LogLevel::Error));

        assert!(ConsoleLogger::default().enabled(LogLevel::Info));
        assert!(!ConsoleLogger::default().enabled(LogLevel::Debug));
    }

    #[test]
    fn test_console_logger_outputs_without_panic() {
        let logger = ConsoleLogger::with_min_level(LogLevel::Debug);
        let mut context = HashMap::new();
        context.insert("loan_id".to_string(), Uuid::new_v4().to_string());

        logger.debug("Test", "debug", Some(Uuid::new_v4()), Some(context));
        logger.error("Test", "error", None, None);
    }
}
