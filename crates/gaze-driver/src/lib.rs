//! 驱动层模块
//!
//! 本 crate 提供机器人头部注视控制的实时部分：
//! - 执行后端抽象（[`Backend`]）：物理驱动 / 仿真
//! - 实时控制循环（[`ControlLoop`]）：激活状态机、分组 minimum-jerk 速度、死区、积分
//! - 控制器句柄（[`GazeController`]）：工作线程、挂起/恢复、并发查询
//! - 共享状态（ArcSwap 无锁读取 + 运动学模型互斥锁）
//! - 遥测与故障通知（crossbeam 通道）
//!
//! # 使用场景
//!
//! 大多数用户应该通过 [`GazeControllerBuilder`] 构造控制器；测试与离线仿真可以用
//! [`GazeControllerBuilder::build_loop`] 直接逐周期驱动 [`ControlLoop`]。

mod backend;
mod builder;
pub mod config;
pub mod control_loop;
mod controller;
mod error;
pub mod fault;
pub mod metrics;
pub mod state;
pub mod target;
pub mod telemetry;

pub use backend::{Backend, HIGH_REFERENCE_ACCELERATION, Hardware, HeadDriver, HeadFeedback, Simulated};
pub use builder::GazeControllerBuilder;
pub use config::{AlignmentConfig, AlignmentLink, BoundsSource, GazeConfig, TiltLimits};
pub use control_loop::{ControlLoop, CycleOutcome, LoopParameters};
pub use controller::GazeController;
pub use error::{ConfigError, DeviceError, GazeError};
pub use fault::{FaultKind, FaultNotice, FaultReporter};
pub use metrics::{ControlMetrics, MetricsSnapshot};
pub use state::{AtomicLoopState, ControlContext, CycleSnapshot, LoopState};
pub use target::{GazeTarget, TargetSlot};
pub use telemetry::{FixationSample, JOINT_SAMPLE_LEN, JointSample, TelemetryHub};
