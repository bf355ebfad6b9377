//! 进度监听
//!
//! 三类通知：步进进度、单次运行结束、整体终止。回调在工作线程上同步执行。

use std::mem;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub message: String,
    /// 由于取整可能超过 100，展示前需要截断
    pub percent: u32,
    pub time: SimTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEnded {
    pub message: String,
    /// 从 1 开始的运行序号
    pub run: u32,
    pub last_event_time: SimTime,
    pub events: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Terminated {
    pub message: String,
    pub completed_runs: u32,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Step(StepProgress),
    RunEnded(RunEnded),
    Terminated(Terminated),
}

/// 进度观察者。
///
/// 回调里可以增删监听器或读取引擎状态：派发期间监听器列表不加锁，
/// 新加入的监听器从下一条通知开始生效，被移除的监听器在本条通知后不再收到回调。
/// 不要在回调里对驱动它的引擎调用 `start`/`pause`/`stop`：这些操作会等待工作线程退出，
/// 而回调本身就运行在工作线程上。
pub trait ProgressListener: Send {
    fn on_step(&mut self, _progress: &StepProgress) {}
    fn on_run_ended(&mut self, _run: &RunEnded) {}
    fn on_terminated(&mut self, _done: &Terminated) {}
}

/// 监听器标识，用于移除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// 把所有通知写进 tracing 日志
#[derive(Debug, Default)]
pub struct TracingListener;

impl ProgressListener for TracingListener {
    fn on_step(&mut self, p: &StepProgress) {
        info!(percent = p.percent.min(100), time = %p.time, "{}", p.message);
    }

    fn on_run_ended(&mut self, r: &RunEnded) {
        info!(
            run = r.run,
            last_event_time = %r.last_event_time,
            events = r.events,
            "{}",
            r.message
        );
    }

    fn on_terminated(&mut self, t: &Terminated) {
        info!(
            completed_runs = t.completed_runs,
            duration = ?t.duration,
            "✅ {}",
            t.message
        );
    }
}

pub(crate) type Batch = Vec<(ListenerId, Box<dyn ProgressListener>)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    items: Batch,
    // 已被取出、正在接收通知的监听器
    in_flight: Vec<ListenerId>,
    // 派发期间被移除的在途监听器
    removed: Vec<ListenerId>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Box<dyn ProgressListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        if let Some(pos) = self.items.iter().position(|(lid, _)| *lid == id) {
            self.items.remove(pos);
            return true;
        }
        if self.in_flight.contains(&id) && !self.removed.contains(&id) {
            self.removed.push(id);
            return true;
        }
        false
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len() + self.in_flight.len() - self.removed.len()
    }

    /// 取出当前全部监听器，调用方在锁外逐个回调后交还给 [`Listeners::restore`]。
    pub(crate) fn take(&mut self) -> Batch {
        self.in_flight = self.items.iter().map(|(id, _)| *id).collect();
        mem::take(&mut self.items)
    }

    /// 交还取出的监听器：丢弃期间被移除的，期间新加入的排在原有监听器之后。
    pub(crate) fn restore(&mut self, mut batch: Batch) {
        let removed = mem::take(&mut self.removed);
        batch.retain(|(id, _)| !removed.contains(id));
        batch.append(&mut self.items);
        self.items = batch;
        self.in_flight.clear();
    }
}

pub(crate) fn deliver(batch: &mut Batch, n: &Notification) {
    for (_, l) in batch.iter_mut() {
        match n {
            Notification::Step(p) => l.on_step(p),
            Notification::RunEnded(r) => l.on_run_ended(r),
            Notification::Terminated(t) => l.on_terminated(t),
        }
    }
}
