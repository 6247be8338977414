//! 实时控制循环
//!
//! 每个周期依次执行：
//!
//! 1. 激活状态机评估（到位时停机并清除 `new` 标志）
//! 2. 读取目标与反馈；读取失败 → 挂起、延迟停机、上报故障，本周期结束
//! 3. 拆分为颈部 / 眼睛两组误差
//! 4. 激活时计算 minimum-jerk 速度（眼睛叠加补偿速度），否则为零
//! 5. 有物理执行器时做死区提升
//! 6. 转换为度/秒，与上次不同才下发
//! 7. 发布注视点与关节遥测（无订阅者时跳过）
//! 8. 持锁更新运动学模型并计算新的注视点
//! 9. 积分速度得到内部估计（无硬件时即下一周期的反馈）
//!
//! [`ControlLoop`] 本身是单线程的，由 [`GazeController`](crate::GazeController)
//! 的工作线程独占；测试可以直接逐周期驱动。

use crate::backend::{Backend, HeadFeedback};
use crate::config::GazeConfig;
use crate::error::{DeviceError, GazeError};
use crate::fault::{FaultKind, FaultNotice, FaultReporter};
use crate::metrics::ControlMetrics;
use crate::state::{ControlContext, CycleSnapshot, LoopState};
use crate::telemetry::{FixationSample, JOINT_SAMPLE_LEN, JointSample};
use gaze_control::{
    ActivationInputs, ActivationMachine, GroupController, HeadIntegrator, Transition,
    shape_deadband,
};
use gaze_kinematics::{
    DEG2RAD, HEAD_JOINTS, HeadBounds, HeadVector, RAD2DEG, TORSO_JOINTS, TorsoVector,
};
use nalgebra::Vector3;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 控制循环参数（运行时单位：弧度、米、秒）
#[derive(Debug, Clone, PartialEq)]
pub struct LoopParameters {
    pub period: Duration,
    /// 执行器最小可靠速度（弧度/秒）
    pub min_abs_vel: f64,
    /// 到位阈值（弧度）
    pub motion_done_threshold: f64,
    /// 跟踪模式启动阈值（米）
    pub motion_start_threshold: f64,
    /// 重规划阈值（弧度）
    pub retarget_threshold: f64,
    pub stop_delay: Duration,
    pub status_interval: Duration,
}

impl LoopParameters {
    pub fn from_config(config: &GazeConfig) -> Self {
        Self {
            period: config.period(),
            min_abs_vel: config.min_abs_vel_deg_s * DEG2RAD,
            motion_done_threshold: config.motion_done_deg * DEG2RAD,
            motion_start_threshold: config.motion_start_m,
            retarget_threshold: config.retarget_deg * DEG2RAD,
            stop_delay: config.stop_delay(),
            status_interval: config.status_interval(),
        }
    }
}

/// 单周期结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 正常完成
    Completed,
    /// 反馈故障，循环已挂起
    Suspended,
    /// 循环未处于 RUNNING，未执行
    Skipped,
}

/// 实时控制循环
pub struct ControlLoop {
    backend: Box<dyn Backend>,
    ctx: Arc<ControlContext>,
    params: LoopParameters,
    faults: FaultReporter,
    activation: ActivationMachine,
    neck: GroupController,
    eyes: GroupController,
    integrator: HeadIntegrator,
    torso: TorsoVector,
    head: HeadVector,
    fixation: Option<Vector3<f64>>,
    velocity: HeadVector,
    vdeg_old: [f64; HEAD_JOINTS],
    cycle: u64,
    status_elapsed: Duration,
}

impl ControlLoop {
    /// 创建控制循环
    ///
    /// `feedback` 为启动时读取的初始反馈，`bounds` 为对齐后的头部限位。
    pub fn new(
        backend: Box<dyn Backend>,
        ctx: Arc<ControlContext>,
        bounds: &HeadBounds,
        feedback: HeadFeedback,
        params: LoopParameters,
        faults: FaultReporter,
    ) -> Result<Self, GazeError> {
        let period = params.period.as_secs_f64();
        let integrator =
            HeadIntegrator::new(period, feedback.head, bounds.lower(), bounds.upper())?;
        let mut activation =
            ActivationMachine::new(params.motion_done_threshold, params.motion_start_threshold)?;
        activation.track(&ctx.target.load().qd);
        let fixation = ctx.kinematics.lock().fixation_point().ok();

        Ok(Self {
            neck: GroupController::new(period, params.retarget_threshold),
            eyes: GroupController::new(period, params.retarget_threshold),
            backend,
            ctx,
            params,
            faults,
            activation,
            integrator,
            torso: feedback.torso,
            head: feedback.head,
            fixation,
            velocity: HeadVector::zeros(),
            vdeg_old: [0.0; HEAD_JOINTS],
            cycle: 0,
            status_elapsed: Duration::ZERO,
        })
    }

    pub fn context(&self) -> &Arc<ControlContext> {
        &self.ctx
    }

    pub fn is_physical(&self) -> bool {
        self.backend.is_physical()
    }

    pub fn state(&self) -> LoopState {
        self.ctx.loop_state()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    /// 最近一次的头部反馈（或内部估计）
    pub fn feedback(&self) -> &HeadVector {
        &self.head
    }

    /// 最近一次的速度指令（弧度/秒，死区提升后）
    pub fn velocity(&self) -> &HeadVector {
        &self.velocity
    }

    pub fn period(&self) -> Duration {
        self.params.period
    }

    /// INIT -> RUNNING
    pub fn start(&mut self) {
        if self.state() == LoopState::Init {
            self.ctx.state.set(LoopState::Running);
            info!(
                "Starting gaze controller at {} ms ({} backend)",
                self.params.period.as_millis(),
                if self.is_physical() { "hardware" } else { "simulated" }
            );
        }
    }

    /// 执行一个控制周期
    pub fn cycle(&mut self) -> CycleOutcome {
        if !self.state().is_running() {
            return CycleOutcome::Skipped;
        }

        let generation = self.ctx.target.generation();
        let target = self.ctx.target.load();
        let physical = self.backend.is_physical();

        // 1. 激活状态
        let transition = self.activation.evaluate(&ActivationInputs {
            qd: &target.qd,
            feedback: &self.head,
            xd: &target.xd,
            fixation: self.fixation.as_ref(),
            new_target: self.ctx.target.is_new(),
            tracking_locked: self.ctx.is_tracking_locked(),
        });
        match transition {
            Transition::Deactivated => {
                self.stop_limbs();
                // 只确认本周期读到的目标
                self.ctx.target.acknowledge(generation);
                debug!(cycle = self.cycle, "Motion done, controller idle");
            }
            Transition::Activated => {
                self.reset_controllers(&target.qd);
                debug!(cycle = self.cycle, "Motion started");
            }
            Transition::None => {}
        }
        self.ctx
            .active
            .store(self.activation.is_active(), Ordering::Release);

        // 2. 反馈
        let feedback = match self.backend.read_feedback(self.integrator.position()) {
            Ok(fb) => fb,
            Err(e) => {
                ControlMetrics::incr(&self.ctx.metrics.feedback_faults);
                self.suspend();
                self.faults.report(FaultNotice {
                    cycle: self.cycle,
                    kind: FaultKind::FeedbackLost(e),
                });
                return CycleOutcome::Suspended;
            }
        };
        self.torso = feedback.torso;
        self.head = feedback.head;
        self.integrator.reset(&self.head);

        // 3-4. 分组速度
        let mut v = HeadVector::zeros();
        if self.activation.is_active() {
            let timing = self.ctx.timing();
            let e = target.qd - self.head;
            let v_neck = self
                .neck
                .compute_command(timing.neck_time(), &e.fixed_rows::<3>(0).into_owned());
            let v_eyes = self
                .eyes
                .compute_command(timing.eyes_time(), &e.fixed_rows::<3>(3).into_owned())
                + target.counter_velocity;
            v.fixed_rows_mut::<3>(0).copy_from(&v_neck);
            v.fixed_rows_mut::<3>(3).copy_from(&v_eyes);
        }

        // 5. 死区提升
        if physical {
            shape_deadband(&mut v, &target.qd, &self.head, self.params.min_abs_vel);
        }

        // 6. 下发
        let vdeg = to_degrees(&v);
        if physical && vdeg != self.vdeg_old {
            ControlMetrics::incr(&self.ctx.metrics.velocity_commands);
            if let Err(e) = self.backend.velocity_move(&vdeg) {
                warn!(cycle = self.cycle, "Velocity command failed: {}", e);
            }
            self.vdeg_old = vdeg;
        }

        // 7. 遥测
        self.publish_telemetry();

        // 8. 运动学模型
        {
            let mut kinematics = self.ctx.kinematics.lock();
            if let Err(e) = kinematics.set_angles(&self.torso, &self.head) {
                warn!(cycle = self.cycle, "Failed to update kinematic chains: {}", e);
            }
            self.fixation = kinematics.fixation_point().ok();
        }

        self.ctx.snapshot.store(Arc::new(CycleSnapshot {
            cycle: self.cycle,
            desired_deg: to_degrees(&target.qd),
            velocity_deg: vdeg,
            head: self.head,
            torso: self.torso,
            fixation: self.fixation,
        }));
        trace!(cycle = self.cycle, ?vdeg, "Cycle completed");

        self.status_elapsed += self.params.period;
        if self.status_elapsed >= self.params.status_interval {
            self.status_elapsed = Duration::ZERO;
            self.report_status(&target.xd, &target.qd, &vdeg);
        }

        // 9. 积分
        self.velocity = v;
        self.head = self.integrator.integrate(&v);

        self.cycle += 1;
        ControlMetrics::incr(&self.ctx.metrics.cycles);
        CycleOutcome::Completed
    }

    /// RUNNING -> SUSPENDED（延迟停机）
    pub fn suspend(&mut self) {
        if self.state() != LoopState::Running {
            return;
        }
        self.ctx.state.set(LoopState::Suspended);
        self.stop_limbs();
        info!(cycle = self.cycle, "Controller has been suspended");
    }

    /// SUSPENDED -> RUNNING
    ///
    /// 有硬件时重新读取反馈；积分器与两个速度控制器都重置到该反馈。
    /// 读取失败时保持挂起并上报故障。
    pub fn resume(&mut self) -> Result<(), DeviceError> {
        if self.state() != LoopState::Suspended {
            return Ok(());
        }

        if self.backend.is_physical() {
            match self.backend.read_feedback(self.integrator.position()) {
                Ok(fb) => {
                    self.torso = fb.torso;
                    self.head = fb.head;
                }
                Err(e) => {
                    self.faults.report(FaultNotice {
                        cycle: self.cycle,
                        kind: FaultKind::ResumeFailed(e.clone()),
                    });
                    return Err(e);
                }
            }
        }

        self.integrator.reset(&self.head);
        let qd = self.ctx.target.load().qd;
        self.reset_controllers(&qd);
        self.ctx.state.set(LoopState::Running);
        info!(cycle = self.cycle, "Controller has been resumed");
        Ok(())
    }

    /// 最终停机，进入 RELEASED
    pub fn release(&mut self) {
        if self.state() == LoopState::Released {
            return;
        }
        self.stop_limbs();
        self.ctx.telemetry.close();
        self.ctx.active.store(false, Ordering::Release);
        self.ctx.state.set(LoopState::Released);
        info!(cycles = self.cycle, "Controller released");
    }

    /// 延迟停机
    ///
    /// 速度指令与停机指令可能走不同的通道，先等待若干周期，避免停机被
    /// 最后一条速度指令覆盖。
    fn stop_limbs(&mut self) {
        if !self.backend.is_physical() {
            return;
        }
        spin_sleep::sleep(self.params.stop_delay);
        ControlMetrics::incr(&self.ctx.metrics.stops);
        if let Err(e) = self.backend.stop() {
            warn!(cycle = self.cycle, "Stop command failed: {}", e);
        }
        self.vdeg_old = [0.0; HEAD_JOINTS];
    }

    fn reset_controllers(&mut self, qd: &HeadVector) {
        let e = qd - self.head;
        self.neck.reset(&e.fixed_rows::<3>(0).into_owned());
        self.eyes.reset(&e.fixed_rows::<3>(3).into_owned());
    }

    fn publish_telemetry(&self) {
        let telemetry = &self.ctx.telemetry;
        if !telemetry.has_subscribers() {
            return;
        }
        let metrics = &self.ctx.metrics;

        if let Some(point) = self.fixation {
            telemetry.publish_fixation(
                FixationSample {
                    cycle: self.cycle,
                    point,
                },
                metrics,
            );
        }

        let mut degrees = [0.0; JOINT_SAMPLE_LEN];
        for (i, d) in degrees.iter_mut().enumerate() {
            *d = if i < TORSO_JOINTS {
                self.torso[i]
            } else {
                self.head[i - TORSO_JOINTS]
            } * RAD2DEG;
        }
        telemetry.publish_joints(
            JointSample {
                cycle: self.cycle,
                degrees,
            },
            metrics,
        );
    }

    fn report_status(&self, xd: &Vector3<f64>, qd: &HeadVector, vdeg: &[f64; HEAD_JOINTS]) {
        let error_norm = self.fixation.map(|fp| (xd - fp).norm());
        debug!(
            cycle = self.cycle,
            active = self.activation.is_active(),
            "norm(e) = {:?}, target fix. point = {:?}, actual fix. point = {:?}, \
             target joints = {:?}, actual joints = {:?}, velocity = {:?}",
            error_norm,
            xd.as_slice(),
            self.fixation.as_ref().map(|fp| fp.as_slice().to_vec()),
            to_degrees(qd),
            to_degrees(&self.head),
            vdeg
        );
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        // 任何退出路径都不能让执行器保持运动
        self.release();
    }
}

fn to_degrees(v: &HeadVector) -> [f64; HEAD_JOINTS] {
    std::array::from_fn(|i| v[i] * RAD2DEG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_from_config() {
        let config = GazeConfig::default();
        let params = LoopParameters::from_config(&config);
        assert_eq!(params.period, Duration::from_millis(10));
        assert_eq!(params.stop_delay, Duration::from_millis(20));
        assert!((params.min_abs_vel - 0.5 * DEG2RAD).abs() < 1e-15);
        assert!((params.motion_start_threshold - 0.015).abs() < 1e-15);
    }

    #[test]
    fn test_to_degrees() {
        let v = HeadVector::new(std::f64::consts::PI, 0.0, -std::f64::consts::FRAC_PI_2, 0.0, 0.0, 0.0);
        let d = to_degrees(&v);
        assert!((d[0] - 180.0).abs() < 1e-12);
        assert!((d[2] + 90.0).abs() < 1e-12);
    }
}
