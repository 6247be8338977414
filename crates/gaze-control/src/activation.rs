//! 激活状态机
//!
//! 两个状态：[`Activation::Active`]（闭环控制驱动执行器）与 [`Activation::Idle`]。
//! 每个周期开始时评估一次：
//!
//! ```text
//! ACTIVE --|qd - q| < qthres--------------------------------------> IDLE
//! IDLE   --|qd - q| >= qthres && !locked && (new || qd[0..3] 变化)--> ACTIVE
//! IDLE   --|qd - q| >= qthres &&  locked && |xd - fp| > xthres------> ACTIVE
//! ```
//!
//! 两个阈值相互独立。切换到 IDLE 时的停机与清除 `new` 标志由调用方根据
//! 返回的 [`Transition`] 执行。

use crate::error::ControlError;
use gaze_kinematics::HeadVector;
use nalgebra::Vector3;

/// 激活状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    Active,
    Idle,
}

/// 本周期发生的状态转移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 状态不变
    None,
    /// IDLE -> ACTIVE
    Activated,
    /// ACTIVE -> IDLE（调用方需停止执行器并清除 `new` 标志）
    Deactivated,
}

/// 单周期评估输入
#[derive(Debug, Clone, Copy)]
pub struct ActivationInputs<'a> {
    /// 期望头部关节
    pub qd: &'a HeadVector,
    /// 当前头部关节反馈
    pub feedback: &'a HeadVector,
    /// 期望注视点
    pub xd: &'a Vector3<f64>,
    /// 当前注视点（光轴平行时不可用）
    pub fixation: Option<&'a Vector3<f64>>,
    /// 目标是否为新目标
    pub new_target: bool,
    /// 是否处于跟踪锁定模式
    pub tracking_locked: bool,
}

/// 带滞回的激活状态机
#[derive(Debug, Clone)]
pub struct ActivationMachine {
    state: Activation,
    motion_done_threshold: f64,
    motion_start_threshold: f64,
    /// 上一周期的期望颈部关节
    tracked_neck: Vector3<f64>,
}

impl ActivationMachine {
    /// 创建状态机（初始为 IDLE）
    ///
    /// - `motion_done_threshold`：关节空间到位阈值（弧度，二范数）
    /// - `motion_start_threshold`：笛卡尔空间启动阈值（米）
    pub fn new(motion_done_threshold: f64, motion_start_threshold: f64) -> Result<Self, ControlError> {
        for (name, value) in [
            ("motion_done_threshold", motion_done_threshold),
            ("motion_start_threshold", motion_start_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ControlError::InvalidThreshold { name, value });
            }
        }
        Ok(Self {
            state: Activation::Idle,
            motion_done_threshold,
            motion_start_threshold,
            tracked_neck: Vector3::zeros(),
        })
    }

    pub fn state(&self) -> Activation {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == Activation::Active
    }

    /// 以当前期望关节作为跟踪基准（启动时调用，避免首周期误触发）
    pub fn track(&mut self, qd: &HeadVector) {
        self.tracked_neck = qd.fixed_rows::<3>(0).into_owned();
    }

    /// 评估一个周期
    pub fn evaluate(&mut self, inputs: &ActivationInputs<'_>) -> Transition {
        let motion_done = (inputs.qd - inputs.feedback).norm() < self.motion_done_threshold;

        let transition = match self.state {
            Activation::Active if motion_done => {
                self.state = Activation::Idle;
                Transition::Deactivated
            }
            Activation::Idle if !motion_done && self.should_start(inputs) => {
                self.state = Activation::Active;
                Transition::Activated
            }
            _ => Transition::None,
        };

        self.track(inputs.qd);
        transition
    }

    fn should_start(&self, inputs: &ActivationInputs<'_>) -> bool {
        if inputs.tracking_locked {
            inputs
                .fixation
                .is_some_and(|fp| (inputs.xd - fp).norm() > self.motion_start_threshold)
        } else {
            inputs.new_target
                || (0..3).any(|i| inputs.qd[i] != self.tracked_neck[i])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QTHRES: f64 = 0.1 * std::f64::consts::PI / 180.0;
    const XTHRES: f64 = 0.015;

    struct Fixture {
        qd: HeadVector,
        fb: HeadVector,
        xd: Vector3<f64>,
        fp: Vector3<f64>,
        new_target: bool,
        locked: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                qd: HeadVector::zeros(),
                fb: HeadVector::zeros(),
                xd: Vector3::new(1.0, 0.0, 0.3),
                fp: Vector3::new(1.0, 0.0, 0.3),
                new_target: false,
                locked: false,
            }
        }

        fn inputs(&self) -> ActivationInputs<'_> {
            ActivationInputs {
                qd: &self.qd,
                feedback: &self.fb,
                xd: &self.xd,
                fixation: Some(&self.fp),
                new_target: self.new_target,
                tracking_locked: self.locked,
            }
        }
    }

    fn machine() -> ActivationMachine {
        ActivationMachine::new(QTHRES, XTHRES).unwrap()
    }

    #[test]
    fn test_new_target_activates() {
        let mut m = machine();
        let mut f = Fixture::new();
        f.qd[3] = 0.2;
        f.new_target = true;
        assert_eq!(m.evaluate(&f.inputs()), Transition::Activated);
        assert!(m.is_active());
    }

    #[test]
    fn test_changed_neck_target_activates_without_new_flag() {
        let mut m = machine();
        let mut f = Fixture::new();
        m.track(&f.qd);
        f.qd[0] = 0.1;
        assert_eq!(m.evaluate(&f.inputs()), Transition::Activated);
    }

    #[test]
    fn test_stale_target_does_not_activate() {
        let mut m = machine();
        let mut f = Fixture::new();
        // 仅眼睛误差，颈部目标未变，也不是新目标
        f.qd[4] = 0.2;
        m.track(&f.qd);
        assert_eq!(m.evaluate(&f.inputs()), Transition::None);
        assert_eq!(m.state(), Activation::Idle);
    }

    #[test]
    fn test_motion_done_deactivates() {
        let mut m = machine();
        let mut f = Fixture::new();
        f.qd[0] = 0.1;
        f.new_target = true;
        m.evaluate(&f.inputs());
        assert!(m.is_active());

        f.fb = f.qd;
        assert_eq!(m.evaluate(&f.inputs()), Transition::Deactivated);
        assert_eq!(m.state(), Activation::Idle);
    }

    #[test]
    fn test_motion_done_never_activates() {
        let mut m = machine();
        let mut f = Fixture::new();
        f.new_target = true;
        f.qd[0] = 1e-4;
        assert_eq!(m.evaluate(&f.inputs()), Transition::None);
    }

    #[test]
    fn test_tracking_locked_uses_cartesian_distance() {
        let mut m = machine();
        let mut f = Fixture::new();
        f.locked = true;
        f.qd[0] = 0.1;
        f.new_target = true;
        // 注视点在阈值内：锁定模式下忽略 new 标志
        f.fp = f.xd + Vector3::new(0.01, 0.0, 0.0);
        assert_eq!(m.evaluate(&f.inputs()), Transition::None);

        f.fp = f.xd + Vector3::new(0.02, 0.0, 0.0);
        assert_eq!(m.evaluate(&f.inputs()), Transition::Activated);
    }

    #[test]
    fn test_tracking_locked_without_fixation_point() {
        let mut m = machine();
        let mut f = Fixture::new();
        f.locked = true;
        f.qd[0] = 0.1;
        let inputs = ActivationInputs {
            fixation: None,
            ..f.inputs()
        };
        assert_eq!(m.evaluate(&inputs), Transition::None);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(ActivationMachine::new(0.0, XTHRES).is_err());
        assert!(ActivationMachine::new(QTHRES, f64::NAN).is_err());
    }
}
