//! 医学检验室模型
//!
//! 用户先在接待处（一名秘书，FIFO）登记，登记结束 `delay_to_exam` 后进入检查室；
//! 检查室有 `nurses` 个房间，各自独立接待。接待处关门后不再有新用户，
//! 已到的用户全部会被处理完。所有时间单位为秒。

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::law::{Interarrival, ServiceTime};
use super::stats::Observation;
use super::trace::BusyTrace;
use super::{ModelError, OfficeAction};
use crate::sim::{SimTime, SimUnit, UnitCtx, UnitId};

fn rng_from(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionParams {
    pub opening: SimTime,
    pub service_mean: f64,
    pub service_std: f64,
    pub arrival_min: f64,
    pub arrival_max: f64,
    pub delay_to_exam: SimTime,
}

impl Default for AdmissionParams {
    fn default() -> Self {
        Self {
            opening: SimTime::from_hours(8.0),
            service_mean: 240.0,
            service_std: 60.0,
            arrival_min: 120.0,
            arrival_max: 300.0,
            delay_to_exam: SimTime::from_mins(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExaminationParams {
    pub nurses: u32,
    pub exam_mean: f64,
    pub exam_std: f64,
}

impl Default for ExaminationParams {
    fn default() -> Self {
        Self {
            nurses: 2,
            exam_mean: 420.0,
            exam_std: 60.0,
        }
    }
}

/// 接待处：一名秘书
#[derive(Debug)]
pub struct Admission {
    params: AdmissionParams,
    examination: UnitId,
    arrival: Interarrival,
    service: ServiceTime,
    rng: ChaCha8Rng,
    closing: bool,
    busy: bool,
    queue: u32,
    admitted: u32,
    admitted_after_closing: u32,
}

impl Admission {
    /// `examination` 为检查室单元的标识，登记结束后的用户会被转过去
    pub fn new(
        params: AdmissionParams,
        examination: UnitId,
        seed: Option<u64>,
    ) -> Result<Self, ModelError> {
        let arrival = Interarrival::new(params.arrival_min, params.arrival_max)?;
        let service = ServiceTime::new(params.service_mean, params.service_std)?;
        Ok(Self {
            params,
            examination,
            arrival,
            service,
            rng: rng_from(seed),
            closing: false,
            busy: false,
            queue: 0,
            admitted: 0,
            admitted_after_closing: 0,
        })
    }

    pub fn opening(&self) -> SimTime {
        self.params.opening
    }

    pub fn admitted(&self) -> u32 {
        self.admitted
    }

    pub fn admitted_after_closing(&self) -> u32 {
        self.admitted_after_closing
    }

    fn begin_service(&mut self, ctx: &mut UnitCtx<'_, OfficeAction>) {
        if self.closing {
            self.admitted_after_closing += 1;
        }
        let d = self.service.sample(&mut self.rng);
        ctx.schedule(d, OfficeAction::EndService);
    }
}

impl SimUnit<OfficeAction> for Admission {
    fn name(&self) -> &str {
        "admission"
    }

    fn init(
        &mut self,
        ctx: &mut UnitCtx<'_, OfficeAction>,
        _begin: SimTime,
        _end: SimTime,
    ) -> bool {
        self.closing = false;
        self.busy = false;
        self.queue = 0;
        self.admitted = 0;
        self.admitted_after_closing = 0;

        ctx.schedule(self.params.opening, OfficeAction::Closing);
        let d = self.arrival.sample(&mut self.rng);
        ctx.schedule(d, OfficeAction::UserEntrance);
        true
    }

    fn play(&mut self, ctx: &mut UnitCtx<'_, OfficeAction>, action: OfficeAction) -> bool {
        match action {
            OfficeAction::UserEntrance => {
                self.admitted += 1;
                if self.queue > 0 || self.busy {
                    self.queue += 1;
                } else {
                    self.busy = true;
                    self.begin_service(ctx);
                }
                if !self.closing {
                    let d = self.arrival.sample(&mut self.rng);
                    ctx.schedule(d, OfficeAction::UserEntrance);
                }
            }
            OfficeAction::EndService => {
                ctx.schedule_for(
                    self.params.delay_to_exam,
                    self.examination,
                    OfficeAction::UserEntrance,
                );
                if self.queue > 0 {
                    self.queue -= 1;
                    self.begin_service(ctx);
                } else {
                    self.busy = false;
                }
            }
            OfficeAction::Closing => self.closing = true,
        }
        true
    }
}

/// 检查室：`nurses` 个并行房间
#[derive(Debug)]
pub struct Examination {
    params: ExaminationParams,
    exam: ServiceTime,
    rng: ChaCha8Rng,
    free: u32,
    queue: u32,
    examined: u32,
    trace: BusyTrace,
}

impl Examination {
    pub fn new(params: ExaminationParams, seed: Option<u64>) -> Result<Self, ModelError> {
        if params.nurses == 0 {
            return Err(ModelError::NoServers);
        }
        let exam = ServiceTime::new(params.exam_mean, params.exam_std)?;
        Ok(Self {
            trace: BusyTrace::new(params.nurses),
            free: params.nurses,
            params,
            exam,
            rng: rng_from(seed),
            queue: 0,
            examined: 0,
        })
    }

    pub fn nurses(&self) -> u32 {
        self.params.nurses
    }

    pub fn examined(&self) -> u32 {
        self.examined
    }

    pub fn queue_len(&self) -> u32 {
        self.queue
    }

    pub fn busy_shares(&self, last_event_time: SimTime) -> Vec<f64> {
        self.trace.busy_shares(last_event_time)
    }
}

impl SimUnit<OfficeAction> for Examination {
    fn name(&self) -> &str {
        "examination"
    }

    fn init(
        &mut self,
        ctx: &mut UnitCtx<'_, OfficeAction>,
        _begin: SimTime,
        _end: SimTime,
    ) -> bool {
        self.free = self.params.nurses;
        self.queue = 0;
        self.examined = 0;
        self.trace.reset();
        self.trace.record(ctx.now(), self.free);
        true
    }

    fn play(&mut self, ctx: &mut UnitCtx<'_, OfficeAction>, action: OfficeAction) -> bool {
        match action {
            OfficeAction::UserEntrance => {
                self.examined += 1;
                if self.queue > 0 || self.free == 0 {
                    self.queue += 1;
                } else {
                    self.free -= 1;
                    self.trace.record(ctx.now(), self.free);
                    let d = self.exam.sample(&mut self.rng);
                    ctx.schedule(d, OfficeAction::EndService);
                }
            }
            OfficeAction::EndService => {
                if self.queue > 0 {
                    self.queue -= 1;
                    let d = self.exam.sample(&mut self.rng);
                    ctx.schedule(d, OfficeAction::EndService);
                } else {
                    self.free += 1;
                    self.trace.record(ctx.now(), self.free);
                }
            }
            // 检查室不跟随接待处的关门时间
            OfficeAction::Closing => {}
        }
        true
    }
}

/// 检验室单次运行（一天）的观测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabDay {
    pub admitted: u32,
    pub admitted_after_closing: u32,
    pub examined: u32,
    /// 关门后继续工作的时长（秒）
    pub overtime: f64,
    /// 下标 n：n 名护士同时忙碌的时间占比
    pub nurse_busy_share: Vec<f64>,
}

impl LabDay {
    pub fn collect(admission: &Admission, exam: &Examination, last_event_time: SimTime) -> Self {
        Self {
            admitted: admission.admitted(),
            admitted_after_closing: admission.admitted_after_closing(),
            examined: exam.examined(),
            overtime: (last_event_time - admission.opening()).as_secs(),
            nurse_busy_share: exam.busy_shares(last_event_time),
        }
    }
}

impl Observation for LabDay {
    fn counters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("admitted", self.admitted as f64),
            ("admitted_after_closing", self.admitted_after_closing as f64),
            ("examined", self.examined as f64),
            ("overtime", self.overtime),
        ]
    }

    fn shares(&self) -> &[f64] {
        &self.nurse_busy_share
    }
}
