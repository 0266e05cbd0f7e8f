use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// 貸出台帳と書籍カタログの保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    MySql,
    /// プロセス内メモリ（再起動で消える）
    InMemory,
}

impl StorageBackend {
    /// `STORAGE_BACKEND` の値から保存先を決める
    pub fn from_string(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::InMemory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid STORAGE_BACKEND: {}",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::MySql => "mysql",
            StorageBackend::InMemory => "memory",
        }
    }
}

/// 保存先とMySQL接続の設定
///
/// `STORAGE_BACKEND=memory` の場合、MySQL関連の値は読み込むが使われない。
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// `DATABASE_URL` が設定されていれば個別の接続項目より優先する
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
    /// 接続プールから接続を取得するまでの待ち時間
    pub acquire_timeout: Duration,
}

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl DatabaseConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::from_string(&value)?,
            Err(_) => StorageBackend::default(),
        };

        let url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        let host = env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());

        let port = env::var("DATABASE_PORT")
            .unwrap_or_else(|_| "3306".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid DATABASE_PORT: {}", e)))?;

        let database = env::var("DATABASE_NAME").unwrap_or_else(|_| "school_library".to_string());

        let username = env::var("DATABASE_USER").unwrap_or_else(|_| "library_user".to_string());

        let password =
            env::var("DATABASE_PASSWORD").unwrap_or_else(|_| "library_password".to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
        {
            Ok(0) => {
                return Err(ConfigError::InvalidValue(
                    "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
                ))
            }
            Ok(n) => n,
            Err(e) => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid DATABASE_MAX_CONNECTIONS: {}",
                    e
                )))
            }
        };

        let acquire_timeout = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid DATABASE_ACQUIRE_TIMEOUT_SECS: {}", e))
            })?;

        Ok(Self {
            backend,
            url,
            host,
            port,
            database,
            username,
            password,
            max_connections,
            acquire_timeout,
        })
    }

    /// MySQL接続文字列を生成
    pub fn connection_string(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            ),
        }
    }

    /// 起動ログ用のコンテキスト（認証情報は含めない）
    pub fn log_context(&self) -> HashMap<String, String> {
        let mut context = HashMap::new();
        context.insert("backend".to_string(), self.backend.as_str().to_string());
        if self.backend == StorageBackend::InMemory {
            return context;
        }
        match &self.url {
            Some(_) => {
                context.insert("source".to_string(), "DATABASE_URL".to_string());
            }
            None => {
                context.insert("host".to_string(), self.host.clone());
                context.insert("port".to_string(), self.port.to_string());
                context.insert("database".to_string(), self.database.clone());
            }
        }
        context.insert("max_connections".to_string(), self.max_connections.to_string());
        context
    }
}
