//! 引擎配置
//!
//! 时间窗口、运行次数等纯数值设置，可以从 JSON 文件加载。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::SimTime;

/// Errors that can occur while loading an engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("End time {end} is before begin time {begin}")]
    InvalidWindow { begin: SimTime, end: SimTime },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub begin_time: SimTime,
    pub end_time: SimTime,
    /// true：逻辑时间越过 `end_time` 后强制结束本次运行；false：排空所有事件
    pub stop_at_end_time: bool,
    /// 运行次数；0 视为未设置
    pub runs: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            begin_time: SimTime::ZERO,
            end_time: SimTime(1.0),
            stop_at_end_time: false,
            runs: 20,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_time < self.begin_time {
            return Err(ConfigError::InvalidWindow {
                begin: self.begin_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}
