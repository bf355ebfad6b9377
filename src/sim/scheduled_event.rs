//! 调度事件
//!
//! 定义调度事件结构及其触发顺序比较。

use super::event::Event;
use super::time::SimTime;
use std::cmp::{Ordering, Reverse};

/// 调度表中的一项：事件本身 + 插入时确定的排序键。
///
/// 排序键为 `(时间, -优先级, 序列号)`：同一时刻优先级高的先触发，
/// 优先级也相同则按插入顺序。时间本身从不被改写。
pub(crate) struct ScheduledEvent<A> {
    pub(crate) priority: i8,
    pub(crate) seq: u64,
    pub(crate) ev: Event<A>,
}

impl<A> ScheduledEvent<A> {
    fn key(&self) -> (SimTime, Reverse<i8>, u64) {
        (self.ev.time(), Reverse(self.priority), self.seq)
    }
}

// Less 表示更早触发。
impl<A> Ord for ScheduledEvent<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<A> PartialOrd for ScheduledEvent<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> PartialEq for ScheduledEvent<A> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<A> Eq for ScheduledEvent<A> {}
