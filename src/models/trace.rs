//! 忙碌度轨迹
//!
//! 记录空闲服务台数量随时间的变化，运行结束后换算为“n 个服务台同时忙碌”的时间占比。

use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct BusyTrace {
    capacity: u32,
    // (时间, 空闲数)
    points: Vec<(SimTime, u32)>,
}

impl BusyTrace {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            points: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    pub fn record(&mut self, at: SimTime, free: u32) {
        self.points.push((at, free));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 下标 n 为 n 个服务台同时忙碌的时间占比。
    ///
    /// 归一化区间从第一个记录点（本次运行的开始时间）到 `horizon`（通常是最后一个事件的时间），
    /// 最后一个记录点之后的状态一直延续到 `horizon`。区间为空时全部为 0。
    pub fn busy_shares(&self, horizon: SimTime) -> Vec<f64> {
        let mut shares = vec![0.0; self.capacity as usize + 1];
        let (Some(&(start, _)), Some(&(last, last_free))) = (self.points.first(), self.points.last())
        else {
            return shares;
        };
        let span = (horizon - start).as_secs();
        if span <= 0.0 {
            return shares;
        }
        for w in self.points.windows(2) {
            let (t0, free) = w[0];
            let (t1, _) = w[1];
            let busy = self.capacity.saturating_sub(free) as usize;
            shares[busy] += (t1 - t0).as_secs() / span;
        }
        if horizon > last {
            let busy = self.capacity.saturating_sub(last_free) as usize;
            shares[busy] += (horizon - last).as_secs() / span;
        }
        shares
    }
}
