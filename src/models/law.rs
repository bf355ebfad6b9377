//! 随机时长分布
//!
//! 到达间隔用均匀分布，服务时长用截断在 0 的正态分布。

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::ModelError;
use crate::sim::SimTime;

/// 均匀分布的到达间隔；上下限相等时退化为常数。
#[derive(Debug, Clone)]
pub struct Interarrival {
    min: f64,
    dist: Option<Uniform<f64>>,
}

impl Interarrival {
    pub fn new(min: f64, max: f64) -> Result<Self, ModelError> {
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || max < min {
            return Err(ModelError::InvalidArrivalWindow { min, max });
        }
        let dist = (max > min).then(|| Uniform::new(min, max));
        Ok(Self { min, dist })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimTime {
        match &self.dist {
            Some(d) => SimTime(d.sample(rng)),
            None => SimTime(self.min),
        }
    }
}

/// 正态分布的服务时长，负值截断为 0。
#[derive(Debug, Clone)]
pub struct ServiceTime {
    dist: Normal<f64>,
}

impl ServiceTime {
    pub fn new(mean: f64, std: f64) -> Result<Self, ModelError> {
        let dist = Normal::new(mean, std)
            .map_err(|e| ModelError::InvalidService(format!("mean={mean}, std={std}: {e}")))?;
        Ok(Self { dist })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SimTime {
        SimTime(self.dist.sample(rng).max(0.0))
    }
}
