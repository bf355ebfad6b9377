//! 仿真单元 trait
//!
//! 定义参与仿真的有状态单元接口，以及单元回调时拿到的调度上下文。

use super::event::Action;
use super::schedule::EventSchedule;
use super::time::SimTime;

/// 单元标识符（注册顺序下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// 仿真单元：由业务层实现（排队模型等）。
///
/// `init`/`play` 返回 `false` 表示单元自身出错；引擎不解释这个结果，
/// 失败需要由单元通过自己的状态暴露出来。
pub trait SimUnit<A: Action>: Send {
    fn name(&self) -> &str;

    /// 同一时刻事件的优先级：越大越先触发，0 表示无特殊优先级。
    fn priority(&self) -> i8 {
        0
    }

    /// 每次运行开始前调用：重置内部状态并播下初始事件。
    fn init(&mut self, ctx: &mut UnitCtx<'_, A>, begin: SimTime, end: SimTime) -> bool;

    /// 响应一个派发到本单元的事件。
    fn play(&mut self, ctx: &mut UnitCtx<'_, A>, action: A) -> bool;
}

/// 单元回调上下文：当前单元身份 + 它所绑定的调度表。
pub struct UnitCtx<'a, A> {
    me: UnitId,
    schedule: &'a mut EventSchedule<A>,
}

impl<'a, A: Action> UnitCtx<'a, A> {
    pub fn new(me: UnitId, schedule: &'a mut EventSchedule<A>) -> Self {
        Self { me, schedule }
    }

    pub fn id(&self) -> UnitId {
        self.me
    }

    pub fn now(&self) -> SimTime {
        self.schedule.now()
    }

    /// 在 `delay` 之后给自己调度一个动作
    pub fn schedule(&mut self, delay: SimTime, action: A) {
        self.schedule.add_event_after(delay, self.me, action);
    }

    /// 在 `delay` 之后给另一个单元调度一个动作
    pub fn schedule_for(&mut self, delay: SimTime, target: UnitId, action: A) {
        self.schedule.add_event_after(delay, target, action);
    }

    /// 撤销自己在 `from_time` 及之后的全部事件
    pub fn cancel_from(&mut self, from_time: SimTime) -> usize {
        self.schedule.remove_events(self.me, from_time)
    }

    pub fn pending_events(&self) -> usize {
        self.schedule.len()
    }
}
