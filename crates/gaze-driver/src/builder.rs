//! Builder 模式实现
//!
//! 提供链式构造 [`GazeController`] 的便捷方式。构造阶段完成：
//!
//! 1. 校验配置
//! 2. 选择后端（默认 [`Simulated`]）
//! 3. 关节限位对齐（硬件限位 ∩ 配置限位 ∩ 最小聚散角）
//! 4. 读取初始反馈，初始化运动学模型与控制目标

use crate::backend::{Backend, Hardware, HeadDriver, Simulated};
use crate::config::{BoundsSource, GazeConfig};
use crate::control_loop::{ControlLoop, LoopParameters};
use crate::controller::GazeController;
use crate::error::{ConfigError, GazeError};
use crate::fault::{FaultNotice, FaultReporter};
use crate::state::ControlContext;
use crate::target::{GazeTarget, TargetSlot};
use crate::telemetry::TelemetryHub;
use crossbeam_channel::Sender;
use gaze_control::TimingParameters;
use gaze_kinematics::{ChainSelector, DEG2RAD, HeadGeometry, HeadKinematics, HeadVector};
use std::sync::Arc;
use tracing::{debug, info};

/// GazeController Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use gaze_driver::{GazeConfig, GazeControllerBuilder};
///
/// let mut controller = GazeControllerBuilder::new(GazeConfig::default())
///     .build()
///     .unwrap();
/// controller.start().unwrap();
/// ```
pub struct GazeControllerBuilder {
    config: GazeConfig,
    backend: Option<Box<dyn Backend>>,
    geometry: HeadGeometry,
    faults: FaultReporter,
}

impl GazeControllerBuilder {
    pub fn new(config: GazeConfig) -> Self {
        Self {
            config,
            backend: None,
            geometry: HeadGeometry::default(),
            faults: FaultReporter::log_only(),
        }
    }

    /// 指定执行后端
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// 使用物理驱动（包装为 [`Hardware`] 后端）
    pub fn hardware<D: HeadDriver + 'static>(self, driver: D) -> Self {
        self.backend(Hardware::new(driver))
    }

    /// 头部几何参数
    pub fn geometry(mut self, geometry: HeadGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// 故障通知通道（默认只写日志）
    pub fn fault_sender(mut self, tx: Sender<FaultNotice>) -> Self {
        self.faults = FaultReporter::new(tx);
        self
    }

    /// 构造控制循环（不启动线程，可逐周期驱动）
    pub fn build_loop(self) -> Result<ControlLoop, GazeError> {
        let config = self.config;
        config.validate()?;

        let mut backend = self
            .backend
            .unwrap_or_else(|| Box::new(Simulated::new()) as Box<dyn Backend>);

        let hardware_limits = match config.bounds_source {
            BoundsSource::Hardware => {
                if !backend.is_physical() {
                    return Err(ConfigError::HardwareBoundsUnavailable.into());
                }
                Some(
                    backend
                        .joint_limits()?
                        .ok_or(ConfigError::MissingHardwareLimits)?,
                )
            }
            BoundsSource::Static => None,
        };

        let mut kinematics = HeadKinematics::new(self.geometry);
        kinematics.append_alignment(
            &config.alignment.left_isometries(),
            &config.alignment.right_isometries(),
        );
        let bounds = kinematics.align_bounds(
            hardware_limits.as_ref(),
            config.eye_tilt.to_range(),
            config.min_vergence_deg * DEG2RAD,
        )?;
        debug!("Aligned head bounds: {:?}", bounds.ranges());

        backend.prepare()?;

        // 无硬件时以限位内的零位作为初始估计
        let feedback = backend.read_feedback(&bounds.clamp(&HeadVector::zeros()))?;
        kinematics.set_angles(&feedback.torso, &feedback.head)?;

        let xd = kinematics
            .fixation_point()
            .unwrap_or_else(|_| kinematics.end_effector_pose(ChainSelector::Head).position);
        let target = TargetSlot::new(GazeTarget::new(feedback.head, xd));

        let timing = TimingParameters::new(
            config.period().as_secs_f64(),
            config.neck_time_s,
            config.eyes_time_s,
        )?;

        let ctx = Arc::new(ControlContext::new(
            kinematics,
            target,
            timing,
            TelemetryHub::new(config.telemetry_capacity),
        ));

        info!(
            "Gaze controller configured: period {} ms, neck {:.3} s, eyes {:.3} s, bounds from {:?}",
            config.period_ms,
            timing.neck_time(),
            timing.eyes_time(),
            config.bounds_source
        );

        ControlLoop::new(
            backend,
            ctx,
            &bounds,
            feedback,
            LoopParameters::from_config(&config),
            self.faults,
        )
    }

    /// 构造控制器句柄（尚未启动，需调用 [`GazeController::start`]）
    pub fn build(self) -> Result<GazeController, GazeError> {
        let realtime = self.config.realtime;
        let reply_timeout = self.config.reply_timeout();
        let control = self.build_loop()?;
        Ok(GazeController::new(control, realtime, reply_timeout))
    }
}

impl Default for GazeControllerBuilder {
    fn default() -> Self {
        Self::new(GazeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LoopState;

    #[test]
    fn test_default_builds_simulated_loop() {
        let control = GazeControllerBuilder::default().build_loop().unwrap();
        assert!(!control.is_physical());
        assert_eq!(control.state(), LoopState::Init);
        // 初始聚散角被夹紧到最小值，注视点存在
        assert!(control.context().kinematics.lock().fixation_point().is_ok());
    }

    #[test]
    fn test_hardware_bounds_require_physical_backend() {
        let config = GazeConfig {
            bounds_source: BoundsSource::Hardware,
            ..Default::default()
        };
        let err = GazeControllerBuilder::new(config).build_loop().err().unwrap();
        assert!(matches!(
            err,
            GazeError::Config(ConfigError::HardwareBoundsUnavailable)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GazeConfig {
            min_vergence_deg: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            GazeControllerBuilder::new(config).build_loop(),
            Err(GazeError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_out_of_range_status_interval_rejected() {
        let config = GazeConfig {
            status_interval_s: 1e20,
            ..Default::default()
        };
        assert!(matches!(
            GazeControllerBuilder::new(config).build_loop(),
            Err(GazeError::Config(ConfigError::InvalidValue {
                field: "status_interval_s",
                ..
            }))
        ));
    }

    #[test]
    fn test_timing_clamped_at_construction() {
        let config = GazeConfig {
            period_ms: 20,
            neck_time_s: 0.1,
            eyes_time_s: 0.5,
            ..Default::default()
        };
        let controller = GazeControllerBuilder::new(config).build().unwrap();
        assert!((controller.eyes_time() - 0.5).abs() < 1e-12);
        assert!((controller.neck_time() - 0.7).abs() < 1e-12);
    }
}
