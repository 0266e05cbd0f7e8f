use crate::adapter::database_config::ConfigError;
use crate::domain::port::LogLevel;
use crate::domain::service::LoanStockPolicy;
use std::env;

/// サーバー設定を管理する構造体
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub stock_policy: LoanStockPolicy,
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid SERVER_PORT: {}", e)))?;

        let stock_policy = match env::var("LOAN_STOCK_POLICY") {
            Ok(value) => LoanStockPolicy::from_string(&value)
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid LOAN_STOCK_POLICY: {}", e)))?,
            Err(_) => LoanStockPolicy::default(),
        };

        let log_level = match env::var("LOG_LEVEL") {
            Ok(value) => LogLevel::from_string(&value).ok_or_else(|| {
                ConfigError::InvalidValue(format!("Invalid LOG_LEVEL: {}", value))
            })?,
            Err(_) => LogLevel::Info,
        };

        Ok(Self {
            host,
            port,
            stock_policy,
            log_level,
        })
    }

    /// バインドするアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
