//! 事件
//!
//! 定义 (时间, 动作标签, 目标单元) 三元组以及动作标签的约束。

use std::fmt::Debug;

use super::time::SimTime;
use super::unit::UnitId;

/// 动作标签：引擎只搬运、不解释，由接收单元自行匹配。
pub trait Action: Clone + Debug + Send + 'static {}

impl<T: Clone + Debug + Send + 'static> Action for T {}

/// 一个待触发的事件。
///
/// 不实现 `PartialEq`：两个时间和动作都相同的事件仍然是两个事件。
#[derive(Debug, Clone)]
pub struct Event<A> {
    time: SimTime,
    unit: UnitId,
    action: A,
}

impl<A> Event<A> {
    pub fn new(time: SimTime, unit: UnitId, action: A) -> Self {
        Self { time, unit, action }
    }

    /// 本事件是否严格早于 `other`（只比较时间，不考虑优先级）。
    pub fn precedes(&self, other: &Event<A>) -> bool {
        self.time < other.time
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn into_parts(self) -> (SimTime, UnitId, A) {
        (self.time, self.unit, self.action)
    }
}
