//! 仿真引擎
//!
//! 对外的控制面：注册单元与监听器、配置时间窗口和运行次数、start/pause/stop。
//! 控制操作都是阻塞的：需要工作线程让步时，会一直等到它在两次派发之间停下或退出。

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::config::EngineConfig;
use super::kernel::{self, Core, SharedUnit};
use super::error::EngineError;
use super::listener::{ListenerId, ProgressListener};
use super::run_loop::{self, Shared};
use super::state::EngineState;
use crate::sim::{Action, SimTime, SimUnit, UnitId};

/// 已注册单元的类型化句柄，调用方用它在运行结束后读取单元状态。
pub struct UnitHandle<U> {
    id: UnitId,
    inner: Arc<Mutex<U>>,
}

impl<U> Clone for UnitHandle<U> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U> UnitHandle<U> {
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// 运行中调用会等到当前事件派发完毕。
    ///
    /// 持有期间可以读取引擎状态和修改配置，但不要调用 `start`/`pause`/`stop`/`wait`：
    /// 它们要等工作线程让步，而工作线程可能正等着这把锁。
    pub fn lock(&self) -> MutexGuard<'_, U> {
        self.inner.lock()
    }
}

/// 离散事件仿真引擎：持有一个调度表和一组单元，在后台工作线程上重复运行。
pub struct Engine<A: Action> {
    shared: Arc<Shared<A>>,
    // 同时用来串行化 start/stop
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Action> Default for Engine<A> {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl<A: Action> Engine<A> {
    pub fn new(begin: SimTime, end: SimTime) -> Self {
        Self::with_config(EngineConfig {
            begin_time: begin,
            end_time: end,
            ..EngineConfig::default()
        })
    }

    pub fn with_config(cfg: EngineConfig) -> Self {
        let mut core_cfg = EngineConfig::default();
        apply(&mut core_cfg, &cfg);
        Self {
            shared: Arc::new(Shared::new(Core::new(core_cfg))),
            worker: Mutex::new(None),
        }
    }

    // ---- 注册 ----

    /// 注册一个单元并绑定到本引擎的调度表；初始化顺序即注册顺序。
    pub fn add_unit<U: SimUnit<A> + 'static>(&self, unit: U) -> UnitHandle<U> {
        let priority = unit.priority();
        let name = unit.name().to_string();
        let inner = Arc::new(Mutex::new(unit));
        let erased: SharedUnit<A> = inner.clone();
        let id = self.shared.core.lock().register(erased, priority);
        debug!(unit = ?id, name, "注册仿真单元");
        UnitHandle { id, inner }
    }

    /// 移除单元，同时取消它所有待处理的事件
    pub fn remove_unit(&self, id: UnitId) -> bool {
        self.shared.core.lock().unregister(id)
    }

    pub fn add_listener(&self, listener: impl ProgressListener + 'static) -> ListenerId {
        self.shared.listeners.lock().add(Box::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.lock().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    // ---- 配置 ----

    pub fn config(&self) -> EngineConfig {
        self.shared.core.lock().cfg.clone()
    }

    /// 逐项走 setter，`runs == 0` 会被忽略
    pub fn apply_config(&self, cfg: &EngineConfig) {
        apply(&mut self.shared.core.lock().cfg, cfg);
    }

    pub fn set_begin_time(&self, begin: SimTime) {
        self.shared.core.lock().cfg.begin_time = begin;
    }

    pub fn set_end_time(&self, end: SimTime) {
        self.shared.core.lock().cfg.end_time = end;
    }

    pub fn set_stop_at_end_time(&self, stop: bool) {
        self.shared.core.lock().cfg.stop_at_end_time = stop;
    }

    /// 设置运行次数；0 被静默忽略
    pub fn set_runs(&self, runs: u32) {
        if runs > 0 {
            self.shared.core.lock().cfg.runs = runs;
        }
    }

    // ---- 只读访问 ----

    pub fn state(&self) -> EngineState {
        self.shared.control.lock().state
    }

    pub fn runs(&self) -> u32 {
        self.shared.core.lock().cfg.runs
    }

    pub fn completed_runs(&self) -> u32 {
        self.shared.core.lock().completed_runs
    }

    /// 累计的有效运行墙钟时间（不含暂停）
    pub fn duration(&self) -> Duration {
        self.shared.core.lock().duration
    }

    pub fn now(&self) -> SimTime {
        self.shared.core.lock().schedule.now()
    }

    pub fn pending_events(&self) -> usize {
        self.shared.core.lock().schedule.len()
    }

    // ---- 生命周期 ----

    /// Stopped：复位并初始化后启动新会话；Paused：原地续跑；Running：先停止再重新开始。
    pub fn start(&self) -> Result<(), EngineError> {
        let mut worker = self.worker.lock();

        if self.state() == EngineState::Running {
            debug!("运行中再次 start：先停止当前会话");
            self.halt(&mut worker)?;
        }

        {
            let mut ctl = self.shared.control.lock();
            match ctl.state {
                EngineState::Paused => {
                    ctl.state = EngineState::Running;
                    self.shared.changed.notify_all();
                    info!("▶️  恢复仿真");
                    return Ok(());
                }
                EngineState::Running => {
                    // halt 之后不可能再处于 Running
                    return Ok(());
                }
                EngineState::Stopped => {}
            }
        }

        // 回收自然结束的上一个工作线程
        join(&mut worker)?;

        kernel::prepare_session(&self.shared.core);

        {
            let mut ctl = self.shared.control.lock();
            ctl.state = EngineState::Running;
            ctl.parked = false;
            ctl.worker_alive = true;
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("edsim-worker".to_string())
            .spawn(move || run_loop::run(shared));
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                let mut ctl = self.shared.control.lock();
                ctl.state = EngineState::Stopped;
                ctl.worker_alive = false;
                Err(EngineError::Spawn(e))
            }
        }
    }

    /// 仅在 Running 时有效：阻塞到工作线程停在暂停点。
    pub fn pause(&self) -> Result<(), EngineError> {
        let mut ctl = self.shared.control.lock();
        if ctl.state != EngineState::Running {
            debug!(state = ?ctl.state, "非运行状态下 pause，忽略");
            return Ok(());
        }
        ctl.state = EngineState::Paused;
        self.shared.changed.notify_all();
        while ctl.state == EngineState::Paused && !ctl.parked && ctl.worker_alive {
            self.shared.changed.wait(&mut ctl);
        }
        info!(state = ?ctl.state, "⏸️  仿真已暂停");
        Ok(())
    }

    /// Running 或 Paused 时有效：停止并等待工作线程退出。
    pub fn stop(&self) -> Result<(), EngineError> {
        let mut worker = self.worker.lock();
        self.halt(&mut worker)
    }

    /// 等待工作线程自然结束（终止通知已送达）；Paused 时立即返回。
    pub fn wait(&self) -> Result<(), EngineError> {
        {
            let mut ctl = self.shared.control.lock();
            while ctl.worker_alive && ctl.state != EngineState::Paused {
                self.shared.changed.wait(&mut ctl);
            }
            if ctl.worker_alive {
                return Ok(());
            }
        }
        let mut worker = self.worker.lock();
        join(&mut worker)
    }

    fn halt(&self, worker: &mut Option<JoinHandle<()>>) -> Result<(), EngineError> {
        {
            let mut ctl = self.shared.control.lock();
            if ctl.state == EngineState::Stopped {
                debug!("已处于停止状态，忽略 stop");
            } else {
                ctl.state = EngineState::Stopped;
                self.shared.changed.notify_all();
            }
        }
        join(worker)
    }
}

impl<A: Action> Drop for Engine<A> {
    fn drop(&mut self) {
        let mut worker = self.worker.get_mut().take();
        let _ = self.halt(&mut worker);
    }
}

fn apply(dst: &mut EngineConfig, src: &EngineConfig) {
    dst.begin_time = src.begin_time;
    dst.end_time = src.end_time;
    dst.stop_at_end_time = src.stop_at_end_time;
    if src.runs > 0 {
        dst.runs = src.runs;
    }
}

fn join(worker: &mut Option<JoinHandle<()>>) -> Result<(), EngineError> {
    match worker.take() {
        Some(handle) => handle.join().map_err(|_| EngineError::WorkerPanicked),
        None => Ok(()),
    }
}
