//! 注视控制算法模块
//!
//! 本模块不涉及线程与硬件，全部为单线程的纯计算组件，由控制循环独占持有：
//!
//! - [`MinJerkController`]：最小加加速度（minimum-jerk）速度控制器
//! - [`BoundedIntegrator`]：带限位的固定步长积分器（内部关节角估计）
//! - [`ActivationMachine`]：带滞回的激活状态机
//! - [`shape_deadband`]：死区提升（低于执行器最小可靠速度的非零指令）
//! - [`TimingParameters`]：执行时间参数（写入时夹紧并告警）

mod activation;
mod deadband;
mod error;
mod integrator;
mod minjerk;
mod timing;

pub use activation::{Activation, ActivationInputs, ActivationMachine, Transition};
pub use deadband::shape_deadband;
pub use error::ControlError;
pub use integrator::BoundedIntegrator;
pub use minjerk::MinJerkController;
pub use timing::{EYES_PERIOD_FACTOR, NECK_EYES_MARGIN, TimingParameters};

/// 颈部 / 眼睛分组的关节数
pub const GROUP_JOINTS: usize = 3;

/// 分组速度控制器（颈部或眼睛）
pub type GroupController = MinJerkController<GROUP_JOINTS>;

/// 头部积分器
pub type HeadIntegrator = BoundedIntegrator<{ gaze_kinematics::HEAD_JOINTS }>;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ControlError>;
