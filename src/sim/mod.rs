//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的核心组件：仿真时间、事件、调度表和仿真单元接口。

// 子模块声明
mod event;
mod schedule;
mod scheduled_event;
mod time;
mod unit;

// 重新导出公共接口
pub use event::{Action, Event};
pub use schedule::EventSchedule;
pub use time::SimTime;
pub use unit::{SimUnit, UnitCtx, UnitId};
