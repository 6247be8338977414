//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use gaze_sdk::prelude::*;
//! ```

// 控制器
pub use crate::driver::{GazeController, GazeControllerBuilder, LoopState};
// 配置
pub use crate::driver::{BoundsSource, GazeConfig};
// 后端
pub use crate::driver::{Backend, Hardware, HeadDriver, HeadFeedback, Simulated};
// 遥测与故障
pub use crate::driver::{FaultNotice, FixationSample, JointSample, MetricsSnapshot};
// 运动学
pub use crate::kinematics::{ChainSelector, HeadVector, Pose, TorsoVector};

// 错误类型
pub use crate::driver::{ConfigError, DeviceError, GazeError};
pub use crate::kinematics::KinematicsError;
