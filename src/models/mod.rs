//! 排队模型
//!
//! 使用引擎的示例模型：单/多服务台办公室，以及“接待 + 检查”两级的医学检验室。
//! 它们只通过 `SimUnit` 接口与引擎交互。

mod lab;
mod law;
mod office;
mod stats;
mod trace;

use thiserror::Error;

pub use lab::{Admission, AdmissionParams, Examination, ExaminationParams, LabDay};
pub use law::{Interarrival, ServiceTime};
pub use office::{Office, OfficeDay, OfficeParams};
pub use stats::{DayStats, DaySummary, Observation};
pub use trace::BusyTrace;

/// 排队模型共用的动作标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfficeAction {
    UserEntrance,
    EndService,
    Closing,
}

/// Errors raised when building a model from invalid parameters
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid arrival window [{min}, {max}]")]
    InvalidArrivalWindow { min: f64, max: f64 },

    #[error("Invalid service law: {0}")]
    InvalidService(String),

    #[error("At least one server is required")]
    NoServers,
}
