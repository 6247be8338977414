//! 控制层错误类型定义

use thiserror::Error;

/// 控制层错误类型
///
/// 仅在构造阶段产生；周期内的计算不会失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// 控制周期必须为正的有限值
    #[error("Control period must be positive and finite, got {0} s")]
    InvalidPeriod(f64),

    /// 积分器限位非法
    #[error("Invalid integrator bounds for joint {joint}: lower={lower}, upper={upper}")]
    InvalidBounds { joint: usize, lower: f64, upper: f64 },

    /// 阈值必须为正
    #[error("Threshold `{name}` must be positive, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}
