//! 执行后端抽象
//!
//! 控制循环只依赖 [`Backend`]，两种实现：
//!
//! - [`Hardware`]：包装一个 [`HeadDriver`]（真实的编码器 + 速度控制接口）
//! - [`Simulated`]：无执行器，反馈由积分器的内部估计合成
//!
//! 速度指令单位为度/秒，位置反馈单位为弧度。

use crate::error::DeviceError;
use gaze_kinematics::{HEAD_JOINTS, HardwareLimits, HeadVector, TorsoVector};

/// 启动时写入的参考加速度（度/秒²）
///
/// 取一个极大值，使驱动器不再对速度指令做额外的加速度整形。
pub const HIGH_REFERENCE_ACCELERATION: f64 = 1e9;

/// 一次反馈读取的结果（弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadFeedback {
    pub torso: TorsoVector,
    /// 头部关节（3 颈部 + 俯仰 + version + vergence）
    pub head: HeadVector,
}

impl HeadFeedback {
    pub fn new(torso: TorsoVector, head: HeadVector) -> Self {
        Self { torso, head }
    }

    /// 检查是否全部为有限值
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.torso.iter().chain(self.head.iter()).all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(DeviceError::Malformed(
                "feedback contains non-finite values".to_string(),
            ))
        }
    }
}

/// 头部驱动接口（外部协作者）
///
/// 由具体的设备驱动实现。所有方法都可能阻塞，但读取反馈必须有超时。
pub trait HeadDriver: Send {
    /// 读取躯干与头部关节位置（弧度）
    fn read_positions(&mut self) -> Result<HeadFeedback, DeviceError>;

    /// 下发速度指令（度/秒）
    fn velocity_move(&mut self, velocities: &[f64; HEAD_JOINTS]) -> Result<(), DeviceError>;

    /// 停止所有关节
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// 查询关节限位（弧度）
    fn joint_limits(&mut self) -> Result<HardwareLimits, DeviceError>;

    /// 设置参考加速度（度/秒²）
    fn set_reference_accelerations(
        &mut self,
        accelerations: &[f64; HEAD_JOINTS],
    ) -> Result<(), DeviceError> {
        let _ = accelerations;
        Ok(())
    }
}

/// 控制循环使用的执行后端
pub trait Backend: Send {
    /// 是否有物理执行器（决定死区提升与指令下发）
    fn is_physical(&self) -> bool;

    /// 启动准备（只调用一次）
    fn prepare(&mut self) -> Result<(), DeviceError>;

    /// 读取反馈，`belief` 为积分器当前的内部估计
    fn read_feedback(&mut self, belief: &HeadVector) -> Result<HeadFeedback, DeviceError>;

    /// 下发速度指令（度/秒）
    fn velocity_move(&mut self, velocities: &[f64; HEAD_JOINTS]) -> Result<(), DeviceError>;

    /// 停止所有关节
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// 硬件限位（仿真后端返回 `None`）
    fn joint_limits(&mut self) -> Result<Option<HardwareLimits>, DeviceError>;
}

/// 物理后端
pub struct Hardware<D: HeadDriver> {
    driver: D,
}

impl<D: HeadDriver> Hardware<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_inner(self) -> D {
        self.driver
    }
}

impl<D: HeadDriver> Backend for Hardware<D> {
    fn is_physical(&self) -> bool {
        true
    }

    fn prepare(&mut self) -> Result<(), DeviceError> {
        self.driver
            .set_reference_accelerations(&[HIGH_REFERENCE_ACCELERATION; HEAD_JOINTS])
    }

    fn read_feedback(&mut self, _belief: &HeadVector) -> Result<HeadFeedback, DeviceError> {
        let feedback = self.driver.read_positions()?;
        feedback.validate()?;
        Ok(feedback)
    }

    fn velocity_move(&mut self, velocities: &[f64; HEAD_JOINTS]) -> Result<(), DeviceError> {
        self.driver.velocity_move(velocities)
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.driver.stop()
    }

    fn joint_limits(&mut self) -> Result<Option<HardwareLimits>, DeviceError> {
        self.driver.joint_limits().map(Some)
    }
}

/// 仿真后端
///
/// 躯干保持固定姿态，头部反馈即积分器估计。指令与停机均为空操作。
#[derive(Debug, Clone, Default)]
pub struct Simulated {
    torso: TorsoVector,
}

impl Simulated {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定固定的躯干姿态（弧度）
    pub fn with_torso(torso: TorsoVector) -> Self {
        Self { torso }
    }
}

impl Backend for Simulated {
    fn is_physical(&self) -> bool {
        false
    }

    fn prepare(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn read_feedback(&mut self, belief: &HeadVector) -> Result<HeadFeedback, DeviceError> {
        Ok(HeadFeedback::new(self.torso, *belief))
    }

    fn velocity_move(&mut self, _velocities: &[f64; HEAD_JOINTS]) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn joint_limits(&mut self) -> Result<Option<HardwareLimits>, DeviceError> {
        Ok(None)
    }
}
