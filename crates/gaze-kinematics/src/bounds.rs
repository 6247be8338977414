//! 关节限位与对齐
//!
//! 启动时只计算一次：运动学模型的标称限位 ∩ 硬件上报的限位 ∩ 配置的眼睛俯仰限位，
//! 聚散角下限不低于配置的最小聚散角（避免斗鸡眼/奇异构型）。

use crate::chain::Chain;
use crate::error::KinematicsError;
use crate::{DEG2RAD, HEAD_JOINTS, HeadVector, TORSO_JOINTS};

/// 单关节限位（弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointRange {
    pub min: f64,
    pub max: f64,
}

impl JointRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 从角度构造
    pub fn from_degrees(min_deg: f64, max_deg: f64) -> Self {
        Self::new(min_deg * DEG2RAD, max_deg * DEG2RAD)
    }

    /// 夹紧到限位内
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// 取交集（结果可能为空区间，需调用 [`validate`](Self::validate)）
    pub fn intersect(&self, other: &JointRange) -> JointRange {
        JointRange::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// 校验 min <= max 且均为有限值
    pub fn validate(&self, joint: usize) -> Result<(), KinematicsError> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(())
        } else {
            Err(KinematicsError::InvalidBounds {
                joint,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// 硬件上报的关节限位
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareLimits {
    /// 躯干限位（无躯干编码器时为 `None`）
    pub torso: Option<[JointRange; TORSO_JOINTS]>,
    /// 头部限位（version/vergence 编码）
    pub head: [JointRange; HEAD_JOINTS],
}

/// 头部 6 关节的有效限位（积分器与控制器使用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadBounds {
    ranges: [JointRange; HEAD_JOINTS],
}

impl HeadBounds {
    /// 由 6 个限位构造，逐个校验
    pub fn new(ranges: [JointRange; HEAD_JOINTS]) -> Result<Self, KinematicsError> {
        for (i, r) in ranges.iter().enumerate() {
            r.validate(i)?;
        }
        Ok(Self { ranges })
    }

    /// 对齐限位
    ///
    /// `eye` 必须是完整的眼睛链（躯干 3 + 颈部 3 + 俯仰 + 水平转动）。
    ///
    /// - 颈部、眼睛俯仰、version：标称限位 ∩ 硬件限位
    /// - 眼睛俯仰再与 `tilt` 取交集
    /// - vergence：下限 = max(硬件下限, `min_vergence`)，无硬件时上限取 version 上限
    pub fn align(
        eye: &Chain,
        hardware: Option<&HardwareLimits>,
        tilt: JointRange,
        min_vergence: f64,
    ) -> Result<Self, KinematicsError> {
        if min_vergence.is_nan() || min_vergence <= 0.0 {
            return Err(KinematicsError::NonPositiveVergence(min_vergence));
        }

        let mut ranges = [JointRange::new(0.0, 0.0); HEAD_JOINTS];
        for (i, range) in ranges.iter_mut().take(HEAD_JOINTS - 1).enumerate() {
            let nominal = eye.range(TORSO_JOINTS + i)?;
            *range = match hardware {
                Some(hw) => nominal.intersect(&hw.head[i]),
                None => nominal,
            };
        }
        ranges[3] = ranges[3].intersect(&tilt);

        let version = ranges[4];
        let vergence = match hardware {
            Some(hw) => hw.head[5],
            None => JointRange::new(min_vergence, version.max),
        };
        ranges[5] = JointRange::new(vergence.min.max(min_vergence), vergence.max);

        Self::new(ranges)
    }

    pub fn range(&self, joint: usize) -> JointRange {
        self.ranges[joint]
    }

    pub fn ranges(&self) -> &[JointRange; HEAD_JOINTS] {
        &self.ranges
    }

    /// 下限向量
    pub fn lower(&self) -> HeadVector {
        HeadVector::from_fn(|i, _| self.ranges[i].min)
    }

    /// 上限向量
    pub fn upper(&self) -> HeadVector {
        HeadVector::from_fn(|i, _| self.ranges[i].max)
    }

    /// 逐关节夹紧
    pub fn clamp(&self, q: &HeadVector) -> HeadVector {
        HeadVector::from_fn(|i, _| self.ranges[i].clamp(q[i]))
    }

    pub fn contains(&self, q: &HeadVector) -> bool {
        q.iter().zip(self.ranges.iter()).all(|(v, r)| r.contains(*v))
    }
}
