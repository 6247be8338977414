//! 命令定义和实现

pub mod config;
pub mod pose;
pub mod run;

pub use config::ConfigCommand;
pub use pose::PoseCommand;
pub use run::RunCommand;

use anyhow::{Context, Result};
use gaze_sdk::GazeConfig;
use std::path::Path;

/// 加载配置文件，缺省时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<GazeConfig> {
    let config = match path {
        Some(path) => GazeConfig::load_from_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
        None => GazeConfig::default(),
    };
    config.validate().context("配置校验失败")?;
    Ok(config)
}
