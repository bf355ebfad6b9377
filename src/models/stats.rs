//! 多次运行的统计汇总
//!
//! 每次运行产出一份报告，由调用方在 run-ended 回调里推入 `DayStats`，终止时求均值。

use std::collections::BTreeMap;

use serde::Serialize;

/// 单次运行可汇总的观测
pub trait Observation {
    /// 具名计数器（同名累加求均值）
    fn counters(&self) -> Vec<(&'static str, f64)>;
    /// 占比向量（逐项累加求均值）
    fn shares(&self) -> &[f64];
}

#[derive(Debug, Clone, Default)]
pub struct DayStats {
    runs: u32,
    sums: BTreeMap<&'static str, f64>,
    share_sums: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub runs: u32,
    pub means: BTreeMap<&'static str, f64>,
    pub busy_share: Vec<f64>,
}

impl DayStats {
    pub fn push(&mut self, obs: &impl Observation) {
        self.runs += 1;
        for (name, v) in obs.counters() {
            *self.sums.entry(name).or_insert(0.0) += v;
        }
        let shares = obs.shares();
        if self.share_sums.len() < shares.len() {
            self.share_sums.resize(shares.len(), 0.0);
        }
        for (acc, v) in self.share_sums.iter_mut().zip(shares) {
            *acc += v;
        }
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        if self.runs == 0 {
            return None;
        }
        self.sums.get(name).map(|s| s / self.runs as f64)
    }

    pub fn summary(&self) -> DaySummary {
        let n = self.runs.max(1) as f64;
        DaySummary {
            runs: self.runs,
            means: self.sums.iter().map(|(k, v)| (*k, v / n)).collect(),
            busy_share: self.share_sums.iter().map(|v| v / n).collect(),
        }
    }
}
