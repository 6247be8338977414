//! 配置管理命令
//!
//! 输出默认配置、校验配置文件

use anyhow::{Context, Result};
use clap::Subcommand;
use gaze_sdk::GazeConfig;
use std::fs;
use std::path::PathBuf;

use super::load_config;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 输出配置（TOML），缺省输出默认配置
    Show {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 将默认配置写入文件
    Init {
        /// 目标文件路径
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 校验配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { config } => Self::show_(config),

            ConfigCommand::Init { path, force } => Self::init_(path, force),

            ConfigCommand::Check { path } => Self::check_(path),
        }
    }

    fn show_(config: Option<PathBuf>) -> Result<()> {
        let config = load_config(config.as_deref())?;
        print!("{}", render(&config)?);
        Ok(())
    }

    fn init_(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!("文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        fs::write(&path, render(&GazeConfig::default())?).context("写入配置文件失败")?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn check_(path: PathBuf) -> Result<()> {
        let config = load_config(Some(&path))?;
        println!("✅ 配置有效: {}", path.display());
        println!("  控制周期: {} ms", config.period_ms);
        println!(
            "  执行时间: 颈部 {:.3} s, 眼睛 {:.3} s",
            config.neck_time_s, config.eyes_time_s
        );
        println!("  限位来源: {:?}", config.bounds_source);
        Ok(())
    }
}

fn render(config: &GazeConfig) -> Result<String> {
    toml::to_string_pretty(config).context("序列化配置失败")
}
