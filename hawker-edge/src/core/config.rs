use super::error::EngineError;
use std::path::PathBuf;
use std::time::Duration;

/// 引擎配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (数据库、日志) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 (production 下总是开启) |
/// | ENVIRONMENT | development | 运行环境 |
/// | PAYMENT_DELAY_MS | 1500 | 模拟支付延迟(毫秒) |
/// | PAYMENT_TIMEOUT_MS | 30000 | 支付超时(毫秒) |
/// | SERVICE_MINUTES_PER_TICKET | 5 | 每张排队票的预计服务时间(分钟) |
/// | EVENT_CHANNEL_CAPACITY | 1024 | 事件广播通道容量 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/hawker PAYMENT_DELAY_MS=0 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// 日志级别 (trace | debug | info | warn | error)
    pub log_level: String,
    /// 是否输出 JSON 格式日志
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 模拟支付延迟 (毫秒)
    pub payment_delay_ms: u64,
    /// 支付超时时间 (毫秒)
    pub payment_timeout_ms: u64,
    /// 每张有效排队票的预计服务时间 (分钟)
    pub service_minutes_per_ticket: u32,
    /// 事件广播通道容量
    pub event_channel_capacity: usize,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            payment_delay_ms: env_parse("PAYMENT_DELAY_MS", 1500),
            payment_timeout_ms: env_parse("PAYMENT_TIMEOUT_MS", 30000),
            service_minutes_per_ticket: env_parse("SERVICE_MINUTES_PER_TICKET", 5),
            event_channel_capacity: env_parse("EVENT_CHANNEL_CAPACITY", 1024),
        }
    }

    /// 测试用配置: 不读环境变量，支付延迟很短
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            log_level: "debug".into(),
            log_json: false,
            environment: "test".into(),
            payment_delay_ms: 10,
            payment_timeout_ms: 5000,
            service_minutes_per_ticket: 5,
            event_channel_capacity: 64,
        }
    }

    /// 校验配置的一致性
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.service_minutes_per_ticket == 0 {
            return Err(EngineError::Config(
                "SERVICE_MINUTES_PER_TICKET must be at least 1".into(),
            ));
        }
        if self.payment_timeout_ms <= self.payment_delay_ms {
            return Err(EngineError::Config(format!(
                "PAYMENT_TIMEOUT_MS ({}) must exceed PAYMENT_DELAY_MS ({})",
                self.payment_timeout_ms, self.payment_delay_ms
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(EngineError::Config(
                "EVENT_CHANNEL_CAPACITY must be positive".into(),
            ));
        }
        Ok(())
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("hawker.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> String {
        PathBuf::from(&self.work_dir)
            .join("logs")
            .to_string_lossy()
            .into_owned()
    }

    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment_delay_ms)
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// JSON console logs: explicit `LOG_JSON` or production
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_is_valid() {
        let config = Config::for_tests("/tmp/hawker");
        assert!(config.validate().is_ok());
        assert!(config.database_path().ends_with("hawker.redb"));
        assert!(!config.is_production());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_production_logs_as_json() {
        let mut config = Config::for_tests("/tmp/hawker");
        config.environment = "production".to_string();
        assert!(config.json_logs());

        config.environment = "development".to_string();
        config.log_json = true;
        assert!(config.json_logs());
    }

    #[test]
    fn test_validate_rejects_zero_service_time() {
        let mut config = Config::for_tests("/tmp/hawker");
        config.service_minutes_per_ticket = 0;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_timeout_below_delay() {
        let mut config = Config::for_tests("/tmp/hawker");
        config.payment_delay_ms = 2000;
        config.payment_timeout_ms = 1000;
        assert!(config.validate().is_err());
    }
}
