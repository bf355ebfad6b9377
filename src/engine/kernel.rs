//! 引擎内核
//!
//! 调度表 + 已注册单元 + 运行计数，由工作线程逐事件推进，控制线程在两次派发之间读取。
//!
//! 锁顺序固定为“单元 → 内核”：派发和初始化都先锁目标单元再锁内核，
//! 与持有 `UnitHandle::lock()` 时读取引擎状态的调用方一致。

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::config::EngineConfig;
use super::listener::{RunEnded, StepProgress};
use crate::sim::{Action, Event, EventSchedule, SimTime, SimUnit, UnitCtx, UnitId};

pub(crate) type SharedUnit<A> = Arc<Mutex<dyn SimUnit<A>>>;

/// 进度阈值：每次运行上报 10 次
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    step: f64,
    threshold: SimTime,
    // 跨运行累计，不随单次运行清零
    steps_done: u32,
}

impl Progress {
    fn new(begin: SimTime, end: SimTime) -> Self {
        let step = (end - begin).as_secs() / 10.0;
        Self {
            step,
            threshold: SimTime(begin.as_secs() + step),
            steps_done: 0,
        }
    }

    fn rewind(&mut self, begin: SimTime) {
        self.threshold = SimTime(begin.as_secs() + self.step);
    }

    fn advance(&mut self, now: SimTime, runs: u32) -> Option<StepProgress> {
        // 时间窗口为空时阈值永远追不上，直接不上报
        if self.step <= 0.0 || now < self.threshold {
            return None;
        }
        self.steps_done += 1;
        self.threshold = SimTime(self.threshold.as_secs() + self.step);
        let percent = (10.0 * self.steps_done as f64 / runs.max(1) as f64).round() as u32;
        Some(StepProgress {
            message: format!("Simulation running (time={now})"),
            percent,
            time: now,
        })
    }
}

pub(crate) struct Core<A: Action> {
    pub(crate) schedule: EventSchedule<A>,
    // 下标与 UnitId 一致；None 表示已移除
    pub(crate) units: Vec<Option<SharedUnit<A>>>,
    pub(crate) cfg: EngineConfig,
    pub(crate) completed_runs: u32,
    pub(crate) duration: Duration,
    progress: Progress,
    run_events: u64,
}

impl<A: Action> Core<A> {
    pub(crate) fn new(cfg: EngineConfig) -> Self {
        Self {
            schedule: EventSchedule::new(cfg.begin_time),
            units: Vec::new(),
            progress: Progress::new(cfg.begin_time, cfg.end_time),
            cfg,
            completed_runs: 0,
            duration: Duration::ZERO,
            run_events: 0,
        }
    }

    pub(crate) fn register(&mut self, unit: SharedUnit<A>, priority: i8) -> UnitId {
        let id = self.schedule.bind_unit(priority);
        debug_assert_eq!(id.0, self.units.len());
        self.units.push(Some(unit));
        id
    }

    pub(crate) fn unregister(&mut self, id: UnitId) -> bool {
        match self.units.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                let dropped = self.schedule.release_unit(id);
                debug!(unit = ?id, dropped, "移除仿真单元");
                true
            }
            _ => false,
        }
    }

    /// 会话级复位：时间窗口、调度表与计数器。单元初始化由 [`prepare_session`] 另行完成。
    fn reset_session(&mut self) {
        self.schedule.set_begin_time(self.cfg.begin_time);
        self.schedule.reset();
        self.duration = Duration::ZERO;
        self.progress = Progress::new(self.cfg.begin_time, self.cfg.end_time);
        self.completed_runs = 0;
        self.run_events = 0;
    }

    pub(crate) fn runs_exhausted(&self) -> bool {
        self.completed_runs >= self.cfg.runs
    }

    /// 本次运行是否还有事件可派发
    pub(crate) fn draining(&self) -> bool {
        (!self.cfg.stop_at_end_time || self.schedule.now() <= self.cfg.end_time)
            && !self.schedule.is_empty()
    }

    /// 结束当前运行并生成运行报告（不复位调度表）。
    pub(crate) fn finish_run(&mut self) -> RunEnded {
        self.completed_runs += 1;
        self.progress.rewind(self.cfg.begin_time);
        let run = self.completed_runs;
        RunEnded {
            message: format!("Simulation Run #{run} finished"),
            run,
            last_event_time: self.schedule.now(),
            events: mem::take(&mut self.run_events),
        }
    }

    fn unit_slot(&self, id: UnitId) -> Option<SharedUnit<A>> {
        self.units.get(id.0).and_then(|slot| slot.clone())
    }
}

/// 从停止状态开始一个新的会话：复位、清零计数、初始化所有单元。
pub(crate) fn prepare_session<A: Action>(core: &Mutex<Core<A>>) {
    core.lock().reset_session();
    init_units(core);
}

/// 为下一次运行复位调度表并重新初始化所有单元。
pub(crate) fn rearm<A: Action>(core: &Mutex<Core<A>>) {
    core.lock().schedule.reset();
    init_units(core);
}

/// 弹出并派发一个事件；越过进度阈值时返回步进通知。
pub(crate) fn dispatch_next<A: Action>(core: &Mutex<Core<A>>) -> Option<StepProgress> {
    loop {
        let (id, slot) = {
            let c = core.lock();
            let id = c.schedule.pending().next()?.unit();
            (id, c.unit_slot(id))
        };

        let mut unit = slot.as_ref().map(|u| u.lock());
        let mut guard = core.lock();
        let c = &mut *guard;
        // 两次加锁之间队首可能已被移除或替换
        if c.schedule.pending().next().map(Event::unit) != Some(id) {
            continue;
        }
        let Some(ev) = c.schedule.get_event() else {
            continue;
        };
        c.run_events += 1;
        let (at, _, action) = ev.into_parts();

        match unit.as_deref_mut() {
            Some(unit) => {
                trace!(unit = unit.name(), at = %at, action = ?action, "派发事件");
                if !unit.play(&mut UnitCtx::new(id, &mut c.schedule), action) {
                    debug!(unit = unit.name(), at = %at, "play 返回失败");
                }
            }
            None => debug!(unit = ?id, "目标单元已移除，丢弃事件"),
        }

        return c.progress.advance(c.schedule.now(), c.cfg.runs);
    }
}

fn init_units<A: Action>(core: &Mutex<Core<A>>) {
    let (units, begin, end) = {
        let c = core.lock();
        let units: Vec<(UnitId, SharedUnit<A>)> = c
            .units
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.clone().map(|u| (UnitId(idx), u)))
            .collect();
        (units, c.cfg.begin_time, c.cfg.end_time)
    };

    for (id, unit) in units {
        let mut unit = unit.lock();
        let mut c = core.lock();
        if !c.schedule.is_bound(id) {
            continue;
        }
        if !unit.init(&mut UnitCtx::new(id, &mut c.schedule), begin, end) {
            debug!(unit = unit.name(), "init 返回失败");
        }
    }
    debug!(pending = core.lock().schedule.len(), "单元初始化完成");
}
