//! 事件调度表
//!
//! 维护当前逻辑时间与按触发顺序排列的待处理事件。

use super::event::{Action, Event};
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::unit::UnitId;
use tracing::{debug, trace, warn};

/// 事件调度表：维护逻辑时钟与待处理事件。
///
/// 事件存放在按触发顺序**降序**排列的 `Vec` 中，下一个要触发的事件总在末尾，
/// 因此弹出是 O(1)，插入是二分查找 + O(n) 移位。
pub struct EventSchedule<A> {
    now: SimTime,
    begin: SimTime,
    next_seq: u64,
    // 下标为 UnitId；None 表示单元已解除绑定。
    priorities: Vec<Option<i8>>,
    q: Vec<ScheduledEvent<A>>,
}

impl<A: Action> Default for EventSchedule<A> {
    fn default() -> Self {
        Self::new(SimTime::ZERO)
    }
}

impl<A: Action> EventSchedule<A> {
    pub fn new(begin: SimTime) -> Self {
        Self {
            now: begin,
            begin,
            next_seq: 0,
            priorities: Vec::new(),
            q: Vec::new(),
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn begin_time(&self) -> SimTime {
        self.begin
    }

    /// 只修改复位锚点，当前时间要等到下一次 `reset` 才生效。
    pub fn set_begin_time(&mut self, begin: SimTime) {
        self.begin = begin;
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// 下一个事件的触发时间
    pub fn peek_time(&self) -> Option<SimTime> {
        self.q.last().map(|item| item.ev.time())
    }

    /// 按触发顺序遍历待处理事件（不弹出）。
    pub fn pending(&self) -> impl Iterator<Item = &Event<A>> {
        self.q.iter().rev().map(|item| &item.ev)
    }

    /// 绑定一个单元并记录它的优先级，返回其标识。
    pub fn bind_unit(&mut self, priority: i8) -> UnitId {
        let id = UnitId(self.priorities.len());
        self.priorities.push(Some(priority));
        debug!(unit = ?id, priority, "绑定仿真单元");
        id
    }

    /// 解除绑定并丢弃该单元所有待处理事件。
    pub fn release_unit(&mut self, unit: UnitId) -> usize {
        let removed = self.remove_events(unit, SimTime(f64::NEG_INFINITY));
        if let Some(slot) = self.priorities.get_mut(unit.0) {
            *slot = None;
        }
        removed
    }

    pub fn is_bound(&self, unit: UnitId) -> bool {
        self.priority_of(unit).is_some()
    }

    pub fn priority_of(&self, unit: UnitId) -> Option<i8> {
        self.priorities.get(unit.0).copied().flatten()
    }

    pub fn set_priority(&mut self, unit: UnitId, priority: i8) {
        if let Some(Some(p)) = self.priorities.get_mut(unit.0) {
            *p = priority;
        }
    }

    /// 插入事件；目标单元未绑定时忽略。
    #[tracing::instrument(skip(self, ev), fields(unit = ?ev.unit(), at = %ev.time()))]
    pub fn add_event(&mut self, ev: Event<A>) {
        let Some(priority) = self.priority_of(ev.unit()) else {
            warn!("目标单元未绑定，忽略事件");
            return;
        };

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let item = ScheduledEvent { priority, seq, ev };

        // 降序存放：比新事件更晚触发的都排在它前面。
        let idx = self.q.partition_point(|e| *e > item);
        self.q.insert(idx, item);

        trace!(seq, queue_size = self.q.len(), "事件已加入调度表");
    }

    /// 在 `now + delay` 时刻为 `unit` 调度一个动作；目标单元未绑定时忽略。
    pub fn add_event_after(&mut self, delay: SimTime, unit: UnitId, action: A) {
        if !self.is_bound(unit) {
            warn!(unit = ?unit, "目标单元未绑定，忽略事件");
            return;
        }
        let delay = if delay < SimTime::ZERO {
            warn!(delay = %delay, "负延迟被截断为 0");
            SimTime::ZERO
        } else {
            delay
        };
        self.add_event(Event::new(self.now + delay, unit, action));
    }

    /// 弹出最早的事件并把当前时间推进到它的时间；调度表为空时返回 `None`。
    pub fn get_event(&mut self) -> Option<Event<A>> {
        let item = self.q.pop()?;
        self.now = item.ev.time();
        Some(item.ev)
    }

    /// 取消 `unit` 在 `from_time` 及之后的全部事件，返回被取消的数量。
    pub fn remove_events(&mut self, unit: UnitId, from_time: SimTime) -> usize {
        let before = self.q.len();
        self.q
            .retain(|item| !(item.ev.unit() == unit && item.ev.time() >= from_time));
        let removed = before - self.q.len();
        if removed > 0 {
            debug!(unit = ?unit, from = %from_time, removed, "取消事件");
        }
        removed
    }

    /// 清空待处理事件并把时间拨回起始时刻。
    pub fn reset(&mut self) {
        self.q.clear();
        self.now = self.begin;
    }
}
