//! 办公室排队模型
//!
//! 一个 FIFO 队列 + `desks` 个服务台，开放 `opening` 时长。
//! 到达间隔服从均匀分布，服务时长服从正态分布；关门后不再有新用户，
//! 但队列里已有的用户都会被服务完。所有时间单位为秒。

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::law::{Interarrival, ServiceTime};
use super::stats::Observation;
use super::trace::BusyTrace;
use super::{ModelError, OfficeAction};
use crate::sim::{SimTime, SimUnit, UnitCtx};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeParams {
    pub desks: u32,
    pub opening: SimTime,
    pub service_mean: f64,
    pub service_std: f64,
    pub arrival_min: f64,
    pub arrival_max: f64,
}

impl Default for OfficeParams {
    fn default() -> Self {
        Self {
            desks: 1,
            opening: SimTime::from_hours(8.0),
            service_mean: 240.0,
            service_std: 60.0,
            arrival_min: 120.0,
            arrival_max: 300.0,
        }
    }
}

impl OfficeParams {
    /// 两个服务台、半天开放、服务更慢的预设
    pub fn two_desk_default() -> Self {
        Self {
            desks: 2,
            opening: SimTime::from_hours(4.0),
            service_mean: 360.0,
            service_std: 60.0,
            arrival_min: 120.0,
            arrival_max: 240.0,
        }
    }
}

/// 单次运行（一天）的观测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficeDay {
    pub arrivals: u32,
    /// 当天开始服务的用户数
    pub served: u32,
    /// 关门后才开始服务的用户数
    pub served_after_closing: u32,
    /// 下标 n：n 个服务台同时忙碌的时间占比
    pub busy_share: Vec<f64>,
}

impl Observation for OfficeDay {
    fn counters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("arrivals", self.arrivals as f64),
            ("served", self.served as f64),
            ("served_after_closing", self.served_after_closing as f64),
        ]
    }

    fn shares(&self) -> &[f64] {
        &self.busy_share
    }
}

#[derive(Debug)]
pub struct Office {
    name: String,
    params: OfficeParams,
    arrival: Interarrival,
    service: ServiceTime,
    rng: ChaCha8Rng,
    // 状态
    closing: bool,
    free: u32,
    queue: u32,
    // 观测
    arrivals: u32,
    served: u32,
    served_after_closing: u32,
    trace: BusyTrace,
}

impl Office {
    /// `seed` 为 None 时从系统熵源取种子
    pub fn new(
        name: impl Into<String>,
        params: OfficeParams,
        seed: Option<u64>,
    ) -> Result<Self, ModelError> {
        if params.desks == 0 {
            return Err(ModelError::NoServers);
        }
        let arrival = Interarrival::new(params.arrival_min, params.arrival_max)?;
        let service = ServiceTime::new(params.service_mean, params.service_std)?;
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            name: name.into(),
            trace: BusyTrace::new(params.desks),
            free: params.desks,
            params,
            arrival,
            service,
            rng,
            closing: false,
            queue: 0,
            arrivals: 0,
            served: 0,
            served_after_closing: 0,
        })
    }

    pub fn params(&self) -> &OfficeParams {
        &self.params
    }

    pub fn queue_len(&self) -> u32 {
        self.queue
    }

    pub fn free_desks(&self) -> u32 {
        self.free
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    pub fn served_after_closing(&self) -> u32 {
        self.served_after_closing
    }

    /// 生成当天报告；`last_event_time` 用于忙碌占比归一化
    pub fn day_report(&self, last_event_time: SimTime) -> OfficeDay {
        OfficeDay {
            arrivals: self.arrivals,
            served: self.served,
            served_after_closing: self.served_after_closing,
            busy_share: self.trace.busy_shares(last_event_time),
        }
    }

    fn begin_service(&mut self, ctx: &mut UnitCtx<'_, OfficeAction>) {
        self.served += 1;
        if self.closing {
            self.served_after_closing += 1;
        }
        let d = self.service.sample(&mut self.rng);
        ctx.schedule(d, OfficeAction::EndService);
    }
}

impl SimUnit<OfficeAction> for Office {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(
        &mut self,
        ctx: &mut UnitCtx<'_, OfficeAction>,
        _begin: SimTime,
        _end: SimTime,
    ) -> bool {
        self.closing = false;
        self.free = self.params.desks;
        self.queue = 0;
        self.arrivals = 0;
        self.served = 0;
        self.served_after_closing = 0;
        self.trace.reset();
        self.trace.record(ctx.now(), self.free);

        ctx.schedule(self.params.opening, OfficeAction::Closing);
        let d = self.arrival.sample(&mut self.rng);
        ctx.schedule(d, OfficeAction::UserEntrance);
        true
    }

    fn play(&mut self, ctx: &mut UnitCtx<'_, OfficeAction>, action: OfficeAction) -> bool {
        match action {
            OfficeAction::UserEntrance => {
                self.arrivals += 1;
                if self.queue > 0 || self.free == 0 {
                    self.queue += 1;
                } else {
                    self.free -= 1;
                    self.trace.record(ctx.now(), self.free);
                    self.begin_service(ctx);
                }
                if !self.closing {
                    let d = self.arrival.sample(&mut self.rng);
                    ctx.schedule(d, OfficeAction::UserEntrance);
                }
            }
            OfficeAction::EndService => {
                if self.queue > 0 {
                    // 服务台直接接待下一位，忙碌数不变
                    self.queue -= 1;
                    self.begin_service(ctx);
                } else {
                    self.free += 1;
                    self.trace.record(ctx.now(), self.free);
                }
            }
            OfficeAction::Closing => self.closing = true,
        }
        true
    }
}
