//! 测试公共设施
//!
//! [`MockHeadDriver`] 的状态放在 `Arc<Mutex<_>>` 中，测试可以在控制循环持有驱动
//! 的同时修改反馈、注入故障、检查下发的指令。

#![allow(dead_code)]

use gaze_driver::{DeviceError, GazeConfig, HeadDriver, HeadFeedback};
use gaze_kinematics::{
    DEG2RAD, HEAD_JOINTS, HardwareLimits, HeadVector, JointRange, TORSO_JOINTS, TorsoVector,
};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Debug)]
pub struct MockState {
    pub feedback: HeadFeedback,
    /// 为 true 时读取反馈返回超时
    pub fail_reads: bool,
    pub limits: HardwareLimits,
    pub commands: Vec<[f64; HEAD_JOINTS]>,
    pub stops: usize,
    pub accelerations: Option<[f64; HEAD_JOINTS]>,
}

/// Mock 头部驱动：反馈由测试设定，指令只记录不执行
#[derive(Clone)]
pub struct MockHeadDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockHeadDriver {
    pub fn new(head: HeadVector) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                feedback: HeadFeedback::new(TorsoVector::zeros(), head),
                fail_reads: false,
                limits: nominal_limits(),
                commands: Vec::new(),
                stops: 0,
                accelerations: None,
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }

    pub fn set_head(&self, head: HeadVector) {
        self.state.lock().feedback.head = head;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn command_count(&self) -> usize {
        self.state.lock().commands.len()
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }
}

impl HeadDriver for MockHeadDriver {
    fn read_positions(&mut self) -> Result<HeadFeedback, DeviceError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(DeviceError::Timeout);
        }
        Ok(state.feedback)
    }

    fn velocity_move(&mut self, velocities: &[f64; HEAD_JOINTS]) -> Result<(), DeviceError> {
        self.state.lock().commands.push(*velocities);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.state.lock().stops += 1;
        Ok(())
    }

    fn joint_limits(&mut self) -> Result<HardwareLimits, DeviceError> {
        Ok(self.state.lock().limits.clone())
    }

    fn set_reference_accelerations(
        &mut self,
        accelerations: &[f64; HEAD_JOINTS],
    ) -> Result<(), DeviceError> {
        self.state.lock().accelerations = Some(*accelerations);
        Ok(())
    }
}

/// 与标称几何一致的硬件限位
pub fn nominal_limits() -> HardwareLimits {
    HardwareLimits {
        torso: Some([JointRange::from_degrees(-90.0, 90.0); TORSO_JOINTS]),
        head: [
            JointRange::from_degrees(-40.0, 30.0),
            JointRange::from_degrees(-70.0, 60.0),
            JointRange::from_degrees(-55.0, 55.0),
            JointRange::from_degrees(-35.0, 15.0),
            JointRange::from_degrees(-50.0, 50.0),
            JointRange::from_degrees(0.0, 90.0),
        ],
    }
}

/// 静止姿态：正视前方，聚散角 5 度
pub fn resting_head() -> HeadVector {
    HeadVector::new(0.0, 0.0, 0.0, 0.0, 0.0, 5.0 * DEG2RAD)
}

/// 测试用配置：10 ms 周期，状态报告间隔拉长
pub fn test_config() -> GazeConfig {
    GazeConfig {
        period_ms: 10,
        status_interval_s: 60.0,
        ..Default::default()
    }
}
