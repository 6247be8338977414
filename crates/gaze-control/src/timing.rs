//! 执行时间参数
//!
//! 约束（写入时夹紧并告警，从不拒绝）：
//!
//! - `eyes_time >= 10 * period`
//! - `neck_time >= eyes_time + 0.2 s`

use crate::error::ControlError;
use tracing::warn;

/// 眼睛执行时间下限相对控制周期的倍数
pub const EYES_PERIOD_FACTOR: f64 = 10.0;

/// 颈部执行时间相对眼睛执行时间的最小余量（秒）
pub const NECK_EYES_MARGIN: f64 = 0.2;

/// 执行时间参数（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParameters {
    period: f64,
    neck_time: f64,
    eyes_time: f64,
}

impl TimingParameters {
    /// 创建参数，先写眼睛再写颈部，二者均按约束夹紧
    pub fn new(period: f64, neck_time: f64, eyes_time: f64) -> Result<Self, ControlError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(ControlError::InvalidPeriod(period));
        }
        let mut timing = Self {
            period,
            neck_time,
            eyes_time,
        };
        timing.set_eyes_time(eyes_time);
        timing.set_neck_time(neck_time);
        Ok(timing)
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn neck_time(&self) -> f64 {
        self.neck_time
    }

    pub fn eyes_time(&self) -> f64 {
        self.eyes_time
    }

    /// 设置颈部执行时间，返回实际生效的值
    pub fn set_neck_time(&mut self, execution_time: f64) -> f64 {
        let lower = self.eyes_time + NECK_EYES_MARGIN;
        self.neck_time = if execution_time.is_nan() || execution_time < lower {
            warn!(
                "Neck execution time {:.3} s is under the lower bound, using {:.3} s",
                execution_time, lower
            );
            lower
        } else {
            execution_time
        };
        self.neck_time
    }

    /// 设置眼睛执行时间，返回实际生效的值
    ///
    /// 颈部执行时间不随之调整；只有下一次 [`set_neck_time`](Self::set_neck_time)
    /// 会按新的眼睛时间重新检查。
    pub fn set_eyes_time(&mut self, execution_time: f64) -> f64 {
        let lower = EYES_PERIOD_FACTOR * self.period;
        self.eyes_time = if execution_time.is_nan() || execution_time < lower {
            warn!(
                "Eyes execution time {:.3} s is under the lower bound, using {:.3} s",
                execution_time, lower
            );
            lower
        } else {
            execution_time
        };
        self.eyes_time
    }
}
