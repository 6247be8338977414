//! 共享状态
//!
//! [`ControlContext`] 由控制线程与监督线程共享：
//!
//! - 运动学模型：唯一的竞争资源，一把 `parking_lot::Mutex`，每次访问都在作用域内释放
//! - 目标插槽、周期快照：`ArcSwap`，无锁
//! - 激活/跟踪/生命周期状态：原子变量
//! - 执行时间参数：监督线程写、控制线程每周期读一次的小锁

use crate::metrics::ControlMetrics;
use crate::target::TargetSlot;
use crate::telemetry::TelemetryHub;
use arc_swap::ArcSwap;
use gaze_control::TimingParameters;
use gaze_kinematics::{HEAD_JOINTS, HeadKinematics, HeadVector, TorsoVector};
use nalgebra::Vector3;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// 控制循环生命周期
///
/// ```text
/// INIT -> RUNNING <-> SUSPENDED -> RELEASED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LoopState {
    #[default]
    Init = 0,
    Running = 1,
    Suspended = 2,
    Released = 3,
}

impl LoopState {
    /// 从 u8 转换，未知值视为 Released
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Init,
            1 => Self::Running,
            2 => Self::Suspended,
            _ => Self::Released,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "INIT",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Released => "RELEASED",
        };
        f.write_str(s)
    }
}

/// 生命周期状态（原子版本）
#[derive(Debug)]
pub struct AtomicLoopState {
    inner: AtomicU8,
}

impl AtomicLoopState {
    pub fn new(state: LoopState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self) -> LoopState {
        LoopState::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: LoopState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }
}

/// 最近一个周期的快照（供监督线程查询）
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSnapshot {
    pub cycle: u64,
    /// 期望头部关节（度）
    pub desired_deg: [f64; HEAD_JOINTS],
    /// 最近一次的速度指令（度/秒）
    pub velocity_deg: [f64; HEAD_JOINTS],
    /// 头部关节反馈（弧度）
    pub head: HeadVector,
    /// 躯干关节反馈（弧度）
    pub torso: TorsoVector,
    /// 当前注视点
    pub fixation: Option<Vector3<f64>>,
}

impl Default for CycleSnapshot {
    fn default() -> Self {
        Self {
            cycle: 0,
            desired_deg: [0.0; HEAD_JOINTS],
            velocity_deg: [0.0; HEAD_JOINTS],
            head: HeadVector::zeros(),
            torso: TorsoVector::zeros(),
            fixation: None,
        }
    }
}

/// 共享上下文
pub struct ControlContext {
    /// 运动学模型
    pub kinematics: Mutex<HeadKinematics>,
    /// 控制目标
    pub target: TargetSlot,
    /// 激活状态（true = ACTIVE）
    pub active: AtomicBool,
    /// 跟踪锁定模式
    pub tracking_locked: AtomicBool,
    /// 生命周期
    pub state: AtomicLoopState,
    /// 执行时间参数
    pub timing: Mutex<TimingParameters>,
    /// 最近周期快照
    pub snapshot: ArcSwap<CycleSnapshot>,
    /// 性能指标
    pub metrics: ControlMetrics,
    /// 遥测
    pub telemetry: TelemetryHub,
}

impl ControlContext {
    pub fn new(
        kinematics: HeadKinematics,
        target: TargetSlot,
        timing: TimingParameters,
        telemetry: TelemetryHub,
    ) -> Self {
        Self {
            kinematics: Mutex::new(kinematics),
            target,
            active: AtomicBool::new(false),
            tracking_locked: AtomicBool::new(false),
            state: AtomicLoopState::new(LoopState::Init),
            timing: Mutex::new(timing),
            snapshot: ArcSwap::from_pointee(CycleSnapshot::default()),
            metrics: ControlMetrics::new(),
            telemetry,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_tracking_locked(&self) -> bool {
        self.tracking_locked.load(Ordering::Acquire)
    }

    pub fn loop_state(&self) -> LoopState {
        self.state.get()
    }

    pub fn timing(&self) -> TimingParameters {
        *self.timing.lock()
    }

    pub fn snapshot(&self) -> Arc<CycleSnapshot> {
        self.snapshot.load_full()
    }
}

impl fmt::Debug for ControlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlContext")
            .field("state", &self.loop_state())
            .field("active", &self.is_active())
            .field("tracking_locked", &self.is_tracking_locked())
            .field("timing", &self.timing())
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}
