//! 控制器配置
//!
//! 从 TOML 加载（所有字段均有默认值），构造控制器前必须通过 [`GazeConfig::validate`]。
//!
//! ```toml
//! period_ms = 10
//! neck_time_s = 0.75
//! eyes_time_s = 0.25
//! min_vergence_deg = 1.0
//! bounds_source = "static"
//!
//! [eye_tilt]
//! min_deg = -30.0
//! max_deg = 30.0
//!
//! [[alignment.left]]
//! translation = [0.0, 0.0, 0.0]
//! rpy_deg = [0.0, 0.0, 1.5]
//! ```

use crate::error::ConfigError;
use gaze_kinematics::{DEG2RAD, JointRange};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 关节限位来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsSource {
    /// 查询硬件上报的限位（需要物理后端）
    Hardware,
    /// 使用运动学模型的标称限位
    #[default]
    Static,
}

/// 眼睛俯仰限位（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltLimits {
    pub min_deg: f64,
    pub max_deg: f64,
}

impl Default for TiltLimits {
    fn default() -> Self {
        Self {
            min_deg: -30.0,
            max_deg: 30.0,
        }
    }
}

impl TiltLimits {
    pub fn to_range(self) -> JointRange {
        JointRange::from_degrees(self.min_deg, self.max_deg)
    }
}

/// 对齐连杆（固定变换，平移单位米，姿态为 roll/pitch/yaw 角度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentLink {
    pub translation: [f64; 3],
    pub rpy_deg: [f64; 3],
}

impl AlignmentLink {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.translation;
        let [r, p, yaw] = self.rpy_deg;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(r * DEG2RAD, p * DEG2RAD, yaw * DEG2RAD),
        )
    }
}

/// 左右眼对齐连杆
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub left: Vec<AlignmentLink>,
    pub right: Vec<AlignmentLink>,
}

impl AlignmentConfig {
    pub fn left_isometries(&self) -> Vec<Isometry3<f64>> {
        self.left.iter().map(AlignmentLink::to_isometry).collect()
    }

    pub fn right_isometries(&self) -> Vec<Isometry3<f64>> {
        self.right.iter().map(AlignmentLink::to_isometry).collect()
    }
}

/// 注视控制器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// 控制周期（毫秒）
    pub period_ms: u64,
    /// 颈部执行时间（秒）
    pub neck_time_s: f64,
    /// 眼睛执行时间（秒）
    pub eyes_time_s: f64,
    /// 最小聚散角（度），必须为正
    pub min_vergence_deg: f64,
    /// 执行器最小可靠速度（度/秒）
    pub min_abs_vel_deg_s: f64,
    /// 眼睛俯仰限位
    pub eye_tilt: TiltLimits,
    /// 到位阈值（关节空间，度）
    pub motion_done_deg: f64,
    /// 跟踪模式启动阈值（笛卡尔空间，米）
    pub motion_start_m: f64,
    /// 目标跳变重规划阈值（度）
    pub retarget_deg: f64,
    /// 停机前等待的周期数
    pub stop_delay_periods: u32,
    /// 状态报告间隔（秒）
    pub status_interval_s: f64,
    /// 遥测通道容量（每个订阅者）
    pub telemetry_capacity: usize,
    /// 关节限位来源
    pub bounds_source: BoundsSource,
    /// 控制线程是否请求实时优先级（需要 `realtime` feature）
    pub realtime: bool,
    /// 眼睛对齐连杆
    pub alignment: AlignmentConfig,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            period_ms: 10,
            neck_time_s: 0.75,
            eyes_time_s: 0.25,
            min_vergence_deg: 1.0,
            min_abs_vel_deg_s: 0.5,
            eye_tilt: TiltLimits::default(),
            motion_done_deg: 0.1,
            motion_start_m: 0.015,
            retarget_deg: 0.5,
            stop_delay_periods: 2,
            status_interval_s: 1.0,
            telemetry_capacity: 16,
            bounds_source: BoundsSource::Static,
            realtime: false,
            alignment: AlignmentConfig::default(),
        }
    }
}

impl GazeConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// 从 TOML 文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(invalid("period_ms", "must be at least 1 ms"));
        }
        if !self.min_vergence_deg.is_finite() || self.min_vergence_deg <= 0.0 {
            return Err(invalid(
                "min_vergence_deg",
                format!("must be strictly positive, got {}", self.min_vergence_deg),
            ));
        }
        if !self.min_abs_vel_deg_s.is_finite() || self.min_abs_vel_deg_s < 0.0 {
            return Err(invalid("min_abs_vel_deg_s", "must be non-negative"));
        }
        if !(self.eye_tilt.min_deg.is_finite() && self.eye_tilt.max_deg.is_finite())
            || self.eye_tilt.min_deg > self.eye_tilt.max_deg
        {
            return Err(invalid(
                "eye_tilt",
                format!(
                    "min ({}) must not exceed max ({})",
                    self.eye_tilt.min_deg, self.eye_tilt.max_deg
                ),
            ));
        }
        for (field, value) in [
            ("neck_time_s", self.neck_time_s),
            ("eyes_time_s", self.eyes_time_s),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        for (field, value) in [
            ("motion_done_deg", self.motion_done_deg),
            ("motion_start_m", self.motion_start_m),
            ("retarget_deg", self.retarget_deg),
            ("status_interval_s", self.status_interval_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("must be positive, got {}", value)));
            }
        }
        if self.telemetry_capacity == 0 {
            return Err(invalid("telemetry_capacity", "must be at least 1"));
        }
        if Duration::try_from_secs_f64(self.status_interval_s).is_err() {
            return Err(invalid(
                "status_interval_s",
                format!("{} s is out of range", self.status_interval_s),
            ));
        }
        if self.reply_budget().is_none() {
            return Err(invalid(
                "stop_delay_periods",
                format!(
                    "{} periods of {} ms is out of range",
                    self.stop_delay_periods, self.period_ms
                ),
            ));
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// 停机延迟（周期的整数倍）
    pub fn stop_delay(&self) -> Duration {
        self.period().saturating_mul(self.stop_delay_periods)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.status_interval_s).unwrap_or(Duration::MAX)
    }

    /// 等待控制线程响应的上限：停机延迟 + 两个周期 + 余量
    pub(crate) fn reply_timeout(&self) -> Duration {
        self.reply_budget().unwrap_or(Duration::MAX)
    }

    fn reply_budget(&self) -> Option<Duration> {
        self.period()
            .checked_mul(self.stop_delay_periods.checked_add(2)?)?
            .checked_add(REPLY_MARGIN)
    }
}

/// 等待控制线程响应的额外余量
const REPLY_MARGIN: Duration = Duration::from_secs(1);

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
