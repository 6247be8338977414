//! 运动学层错误类型定义

use thiserror::Error;

/// 运动学层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// 未知的位姿选择器（仅支持 "left" / "right" / "head"）
    #[error("Invalid pose selector: {0:?} (expected \"left\", \"right\" or \"head\")")]
    InvalidSelector(String),

    /// 关节限位非法（min > max 或非有限值）
    #[error("Invalid bounds for joint {joint}: min={min}, max={max}")]
    InvalidBounds { joint: usize, min: f64, max: f64 },

    /// 最小聚散角必须为正
    #[error("Minimum vergence must be strictly positive, got {0} rad")]
    NonPositiveVergence(f64),

    /// 关节索引越界
    #[error("Joint index {index} out of range (chain has {len} joints)")]
    JointOutOfRange { index: usize, len: usize },

    /// 两眼光轴平行，无法计算注视点
    #[error("Optical axes are parallel, fixation point is undefined")]
    ParallelAxes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = KinematicsError::InvalidSelector("torso".to_string());
        let msg = format!("{}", e);
        assert!(msg.contains("torso") && msg.contains("left"));

        let e = KinematicsError::InvalidBounds {
            joint: 5,
            min: 1.0,
            max: 0.5,
        };
        assert_eq!(format!("{}", e), "Invalid bounds for joint 5: min=1, max=0.5");

        let e = KinematicsError::ParallelAxes;
        assert!(format!("{}", e).contains("parallel"));
    }
}
