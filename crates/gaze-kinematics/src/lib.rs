//! 头部运动学模块
//!
//! 本 crate 提供机器人头部（颈部 + 双眼）的运动学模型：
//! - 串联关节链（[`Chain`]）：关节限位、当前角度、正运动学
//! - 三条共享躯干/颈部前缀的链（[`HeadKinematics`]）：颈部、左眼、右眼
//! - 关节限位对齐（[`HeadBounds`]）：硬件限位 ∩ 配置限位 ∩ 最小聚散角
//! - 位姿表示（[`Pose`]）
//!
//! # 关节约定
//!
//! 头部关节向量固定为 6 维：
//!
//! | 索引 | 含义 |
//! |------|------|
//! | 0 | 颈部俯仰（pitch） |
//! | 1 | 颈部横滚（roll） |
//! | 2 | 颈部偏航（yaw） |
//! | 3 | 眼睛俯仰（tilt） |
//! | 4 | 眼睛共轭转动（version） |
//! | 5 | 聚散角（vergence） |
//!
//! 所有角度单位为弧度，长度单位为米。

mod bounds;
mod chain;
mod error;
mod head;
mod pose;

pub use bounds::{HardwareLimits, HeadBounds, JointRange};
pub use chain::{Chain, Link};
pub use error::KinematicsError;
pub use head::{ChainSelector, HeadKinematics, HeadGeometry};
pub use pose::Pose;

/// 头部关节向量（3 颈部 + 3 眼睛）
pub type HeadVector = nalgebra::Vector6<f64>;

/// 躯干关节向量
pub type TorsoVector = nalgebra::Vector3<f64>;

/// 躯干关节数
pub const TORSO_JOINTS: usize = 3;

/// 头部关节数
pub const HEAD_JOINTS: usize = 6;

/// 角度 -> 弧度
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// 弧度 -> 角度
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, KinematicsError>;
