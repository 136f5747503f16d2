//! Hawker Edge - 美食中心点单引擎
//!
//! # 架构概述
//!
//! Cart / Order / Queue state engine for a food-court ordering app. Callers
//! (UI, HTTP layer, vendor console) call into it and read its results back.
//!
//! ```text
//! Catalog ──▶ CartStore ──▶ CheckoutService ──▶ OrderLedger ──▶ QueueDispatcher
//!                (lines)        (pay + snapshot)     (history)        (tickets)
//!                                     │                   ▲  │            │
//!                                     └── one txn ────────┘  └─ events ───┘
//! ```
//!
//! # 模块结构
//!
//! ```text
//! hawker-edge/src/
//! ├── core/          # 配置、状态、错误、时钟
//! ├── storage.rs     # redb 文档存储
//! ├── catalog.rs     # 菜单查询协作者
//! ├── money/         # 金额计算
//! ├── cart/          # 购物车
//! ├── checkout/      # 结账与模拟支付
//! ├── orders/        # 订单账本
//! ├── queue/         # 叫号队列
//! ├── events.rs      # 状态事件总线
//! └── utils/         # 日志
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod core;
pub mod events;
pub mod money;
pub mod orders;
pub mod queue;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use cart::CartStore;
pub use catalog::{Catalog, InMemoryCatalog};
pub use checkout::{
    CheckoutOutcome, CheckoutPhase, CheckoutRequest, CheckoutService, CheckoutSession,
    PaymentError, PaymentProvider, SimulatedPaymentProvider,
};
pub use core::{Clock, Config, DefaultIds, EngineError, EngineState, IdGenerator, ManualClock, SystemClock};
pub use events::{EngineEvent, EventBus};
pub use orders::OrderLedger;
pub use queue::QueueDispatcher;
pub use storage::{EngineStorage, StorageError};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> Result<Config, EngineError> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = config.log_dir();
    init_logger_with_file(&config.log_level, config.json_logs(), Some(&log_dir))
        .map_err(|e| EngineError::Logger(e.to_string()))?;

    Ok(config)
}

/// 打印启动横幅
pub fn print_banner() {
    println!(
        r#"
    __  __            __
   / / / /___ __      __/ /_____  _____
  / /_/ / __ `/ | /| / / //_/ _ \/ ___/
 / __  / /_/ /| |/ |/ / ,< /  __/ /
/_/ /_/\__,_/ |__/|__/_/|_|\___/_/
              e d g e
    "#
    );
}
