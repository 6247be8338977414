//! Gaze SDK - 机器人头部注视控制 Rust SDK
//!
//! 实时速度控制回路：驱动颈部 + 双眼，使注视点平滑跟随上游逆运动学给出的目标。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **运动学层** (`kinematics`): 三条关节链、限位对齐、注视点
//! - **控制层** (`control`): minimum-jerk 速度、有界积分器、激活状态机、死区
//! - **驱动层** (`driver`): 执行后端、实时控制循环、控制器句柄
//!
//! # 快速开始
//!
//! ```no_run
//! use gaze_sdk::prelude::*;
//!
//! gaze_sdk::init_logging("gaze_driver=info").ok();
//! let mut controller = GazeControllerBuilder::new(GazeConfig::default())
//!     .build()
//!     .unwrap();
//! controller.start().unwrap();
//! ```

pub use gaze_control as control;
pub use gaze_driver as driver;
pub use gaze_kinematics as kinematics;

pub mod prelude;

// --- 用户以此为界 ---

pub use driver::{
    Backend, GazeConfig, GazeController, GazeControllerBuilder, GazeError, Hardware, HeadDriver,
    Simulated,
};
pub use kinematics::{HeadVector, Pose};

use tracing_subscriber::EnvFilter;

/// 初始化日志（tracing-subscriber + EnvFilter）
///
/// `RUST_LOG` 优先；未设置时使用 `default_directive`（如 `"gaze_driver=info"`）。
/// 重复初始化返回错误。
pub fn init_logging(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    tracing_subscriber::fmt().with_env_filter(filter).try_init()?;
    Ok(())
}
