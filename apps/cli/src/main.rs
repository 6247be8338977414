//! # Gaze CLI
//!
//! Command-line interface for the gaze controller.
//!
//! ```bash
//! # 输出默认配置
//! gaze-cli config show
//!
//! # 在仿真后端上运行 5 秒，转向目标并输出遥测
//! gaze-cli run --target 10,0,-5,0,3,4 --duration 5
//!
//! # 查询位姿与注视点
//! gaze-cli pose --head 0,0,0,0,0,5
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::{ConfigCommand, PoseCommand, RunCommand};

/// Gaze CLI - 注视控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "gaze-cli")]
#[command(about = "Command-line interface for the gaze controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行控制器（仿真后端）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 查询位姿与注视点
    Pose {
        #[command(flatten)]
        args: PoseCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    if let Err(e) = gaze_sdk::init_logging("gaze_cli=info,gaze_driver=info") {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),

        Commands::Run { args } => args.execute(),

        Commands::Pose { args } => args.execute(),
    }
}
