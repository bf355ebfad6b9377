//! 仿真引擎模块
//!
//! 在后台工作线程上重复运行同一个模型，并把进度通知给监听器。

mod config;
mod error;
pub(crate) mod kernel;
mod listener;
mod orchestrator;
pub(crate) mod run_loop;
mod state;

pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use listener::{
    ListenerId, Notification, ProgressListener, RunEnded, StepProgress, Terminated,
    TracingListener,
};
pub use orchestrator::{Engine, UnitHandle};
pub use state::EngineState;
