//! 带限位的固定步长积分器
//!
//! 维护控制器对关节位置的内部估计：`x ← clamp(x + v * Ts, lo, hi)`。
//! 无硬件时，该估计即为下一周期的反馈。

use crate::error::ControlError;
use nalgebra::SVector;

/// 带限位的积分器
#[derive(Debug, Clone)]
pub struct BoundedIntegrator<const N: usize> {
    period: f64,
    position: SVector<f64, N>,
    lower: SVector<f64, N>,
    upper: SVector<f64, N>,
}

impl<const N: usize> BoundedIntegrator<N> {
    /// 创建积分器
    ///
    /// 初始位置不做夹紧（与 [`reset`](Self::reset) 一致），第一次积分时生效。
    pub fn new(
        period: f64,
        initial: SVector<f64, N>,
        lower: SVector<f64, N>,
        upper: SVector<f64, N>,
    ) -> Result<Self, ControlError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(ControlError::InvalidPeriod(period));
        }
        for i in 0..N {
            if !(lower[i].is_finite() && upper[i].is_finite()) || lower[i] > upper[i] {
                return Err(ControlError::InvalidBounds {
                    joint: i,
                    lower: lower[i],
                    upper: upper[i],
                });
            }
        }
        Ok(Self {
            period,
            position: initial,
            lower,
            upper,
        })
    }

    /// 积分一步并返回新的位置
    pub fn integrate(&mut self, velocity: &SVector<f64, N>) -> SVector<f64, N> {
        for i in 0..N {
            let next = self.position[i] + velocity[i] * self.period;
            self.position[i] = next.max(self.lower[i]).min(self.upper[i]);
        }
        self.position
    }

    /// 用真实值覆盖内部估计（不夹紧）
    pub fn reset(&mut self, position: &SVector<f64, N>) {
        self.position = *position;
    }

    pub fn position(&self) -> &SVector<f64, N> {
        &self.position
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn lower(&self) -> &SVector<f64, N> {
        &self.lower
    }

    pub fn upper(&self) -> &SVector<f64, N> {
        &self.upper
    }
}
