use crate::storage::StorageError;
use thiserror::Error;

/// 引擎启动错误
///
/// Business conditions (missing cart, rejected transition, declined payment)
/// are never errors; only setup and infrastructure failures land here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("日志初始化失败: {0}")]
    Logger(String),
}

/// 引擎的 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;
