//! 工作线程主循环
//!
//! 唯一推进调度表的线程。暂停时停在条件变量上而不是退出，
//! 因此恢复运行是真正的续跑，不会重新初始化。
//!
//! 需要同时持有时，加锁顺序为 单元 → 控制 → 内核。

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use super::kernel::{self, Core};
use super::listener::{self, Listeners, Notification, RunEnded, Terminated};
use super::state::EngineState;
use crate::sim::Action;

pub(crate) struct Control {
    pub(crate) state: EngineState,
    /// 工作线程已停在暂停点
    pub(crate) parked: bool,
    pub(crate) worker_alive: bool,
}

pub(crate) struct Shared<A: Action> {
    pub(crate) control: Mutex<Control>,
    pub(crate) changed: Condvar,
    pub(crate) core: Mutex<Core<A>>,
    pub(crate) listeners: Mutex<Listeners>,
}

impl<A: Action> Shared<A> {
    pub(crate) fn new(core: Core<A>) -> Self {
        Self {
            control: Mutex::new(Control {
                state: EngineState::Stopped,
                parked: false,
                worker_alive: false,
            }),
            changed: Condvar::new(),
            core: Mutex::new(core),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    fn notify(&self, n: Notification) {
        let mut batch = self.listeners.lock().take();
        listener::deliver(&mut batch, &n);
        self.listeners.lock().restore(batch);
    }

    /// 在两次派发之间检查控制状态；暂停时阻塞。返回 false 表示应当退出。
    fn checkpoint(&self, active_since: &mut Option<Instant>) -> bool {
        let mut ctl = self.control.lock();
        loop {
            match ctl.state {
                EngineState::Running => {
                    if ctl.parked {
                        ctl.parked = false;
                        *active_since = Some(Instant::now());
                        debug!("▶️  工作线程恢复运行");
                    }
                    return true;
                }
                EngineState::Paused => {
                    if !ctl.parked {
                        ctl.parked = true;
                        self.accrue(active_since);
                        debug!("⏸️  工作线程已暂停");
                        self.changed.notify_all();
                    }
                    self.changed.wait(&mut ctl);
                }
                EngineState::Stopped => return false,
            }
        }
    }

    /// 仍在 Running 时结束当前运行；最后一个事件派发期间已被暂停或停止则不计入。
    pub(crate) fn finish_if_running(&self) -> Option<RunEnded> {
        let ctl = self.control.lock();
        if ctl.state != EngineState::Running {
            return None;
        }
        Some(self.core.lock().finish_run())
    }

    fn accrue(&self, active_since: &mut Option<Instant>) {
        if let Some(t0) = active_since.take() {
            self.core.lock().duration += t0.elapsed();
        }
    }
}

/// 工作线程无论正常退出还是 unwind，都把状态收敛到 Stopped 并标记线程已退出。
struct ExitGuard<'a, A: Action> {
    shared: &'a Shared<A>,
}

impl<A: Action> Drop for ExitGuard<'_, A> {
    fn drop(&mut self) {
        let mut ctl = self.shared.control.lock();
        ctl.state = EngineState::Stopped;
        ctl.parked = false;
        ctl.worker_alive = false;
        self.shared.changed.notify_all();
    }
}

pub(crate) fn run<A: Action>(shared: Arc<Shared<A>>) {
    let _guard = ExitGuard { shared: &shared };
    info!("▶️  开始运行仿真");
    let mut active_since = Some(Instant::now());

    while shared.checkpoint(&mut active_since) {
        let (exhausted, draining) = {
            let core = shared.core.lock();
            (core.runs_exhausted(), core.draining())
        };
        if exhausted {
            break;
        }
        if draining {
            if let Some(p) = kernel::dispatch_next(&shared.core) {
                shared.notify(Notification::Step(p));
            }
            continue;
        }

        let Some(report) = shared.finish_if_running() else {
            continue;
        };
        debug!(
            run = report.run,
            events = report.events,
            last_event_time = %report.last_event_time,
            "单次运行结束"
        );
        shared.notify(Notification::RunEnded(report));
        kernel::rearm(&shared.core);
    }

    shared.accrue(&mut active_since);
    {
        let mut ctl = shared.control.lock();
        ctl.state = EngineState::Stopped;
        ctl.parked = false;
        shared.changed.notify_all();
    }

    let (completed_runs, duration) = {
        let core = shared.core.lock();
        (core.completed_runs, core.duration)
    };
    info!(completed_runs, duration = ?duration, "✅ 仿真完成");
    shared.notify(Notification::Terminated(Terminated {
        message: "Simulation terminated".to_string(),
        completed_runs,
        duration,
    }));
}
