//! 核心模块 - 配置、引擎状态、错误定义与时钟
//!
//! # 模块结构
//!
//! - [`Config`] - 引擎配置
//! - [`EngineState`] - 引擎状态 (各组件的组装)
//! - [`EngineError`] - 启动错误
//! - [`Clock`] / [`IdGenerator`] - 时间与 ID 协作者

pub mod clock;
pub mod config;
pub mod error;
pub mod state;

pub use clock::{Clock, DefaultIds, IdGenerator, ManualClock, SystemClock};
pub use config::Config;
pub use error::{EngineError, Result};
pub use state::EngineState;
