//! 控制目标插槽
//!
//! 由逆运动学求解器（外部协作者）写入，控制循环每周期读取一次。
//! 目标本体通过 `ArcSwap` 整体替换（读写均无锁）。`new` 标志由代数计数表示：
//! 每次发布递增 `generation`，控制循环到位时只确认它在周期开始时读到的代数，
//! 停机延迟期间发布的目标仍保持为新目标。

use arc_swap::ArcSwap;
use gaze_kinematics::HeadVector;
use nalgebra::Vector3;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 控制目标
#[derive(Debug, Clone, PartialEq)]
pub struct GazeTarget {
    /// 期望头部关节（弧度）
    pub qd: HeadVector,
    /// 期望注视点（米，基坐标系）
    pub xd: Vector3<f64>,
    /// 叠加到眼睛速度上的补偿速度（弧度/秒）
    pub counter_velocity: Vector3<f64>,
}

impl GazeTarget {
    pub fn new(qd: HeadVector, xd: Vector3<f64>) -> Self {
        Self {
            qd,
            xd,
            counter_velocity: Vector3::zeros(),
        }
    }
}

/// 目标插槽
#[derive(Debug)]
pub struct TargetSlot {
    target: ArcSwap<GazeTarget>,
    /// 已发布的目标代数
    generation: AtomicU64,
    /// 控制循环已确认（到位）的代数
    acknowledged: AtomicU64,
}

impl TargetSlot {
    pub fn new(initial: GazeTarget) -> Self {
        Self {
            target: ArcSwap::from_pointee(initial),
            generation: AtomicU64::new(0),
            acknowledged: AtomicU64::new(0),
        }
    }

    /// 发布新目标并置位 `new` 标志
    ///
    /// 补偿速度保持不变。
    pub fn publish(&self, qd: HeadVector, xd: Vector3<f64>) {
        self.target.rcu(|current| GazeTarget {
            qd,
            xd,
            counter_velocity: current.counter_velocity,
        });
        // Release: 控制循环读到新代数时一定能看到新目标
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// 只更新期望注视点（不置位 `new`）
    pub fn set_fixation(&self, xd: Vector3<f64>) {
        self.target.rcu(|current| GazeTarget {
            xd,
            ..GazeTarget::clone(current)
        });
    }

    /// 更新眼睛补偿速度
    pub fn set_counter_velocity(&self, counter_velocity: Vector3<f64>) {
        self.target.rcu(|current| GazeTarget {
            counter_velocity,
            ..GazeTarget::clone(current)
        });
    }

    pub fn load(&self) -> Arc<GazeTarget> {
        self.target.load_full()
    }

    /// 当前目标代数
    ///
    /// 先读代数再 [`load`](Self::load)，读到的目标不早于该代数。
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_new(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.acknowledged.load(Ordering::Acquire)
    }

    /// 确认 `generation` 及之前的目标已到位
    ///
    /// 之后发布的目标不受影响，仍为新目标。
    pub fn acknowledge(&self, generation: u64) {
        self.acknowledged.fetch_max(generation, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_sets_new_flag() {
        let slot = TargetSlot::new(GazeTarget::new(HeadVector::zeros(), Vector3::zeros()));
        assert!(!slot.is_new());

        let qd = HeadVector::from_element(0.1);
        slot.publish(qd, Vector3::new(1.0, 0.0, 0.3));
        assert!(slot.is_new());
        assert_eq!(slot.load().qd, qd);

        slot.acknowledge(slot.generation());
        assert!(!slot.is_new());
        assert_eq!(slot.load().qd, qd);
    }

    #[test]
    fn test_acknowledge_keeps_later_publish() {
        let slot = TargetSlot::new(GazeTarget::new(HeadVector::zeros(), Vector3::zeros()));
        slot.publish(HeadVector::from_element(0.1), Vector3::x());
        let seen = slot.generation();

        // 确认之前又发布了一次
        slot.publish(HeadVector::from_element(0.2), Vector3::x());
        slot.acknowledge(seen);
        assert!(slot.is_new());

        slot.acknowledge(slot.generation());
        assert!(!slot.is_new());
        // 迟到的旧确认不会回退
        slot.acknowledge(seen);
        assert!(!slot.is_new());
    }

    #[test]
    fn test_counter_velocity_survives_publish() {
        let slot = TargetSlot::new(GazeTarget::new(HeadVector::zeros(), Vector3::zeros()));
        let cv = Vector3::new(0.01, -0.02, 0.0);
        slot.set_counter_velocity(cv);
        slot.publish(HeadVector::from_element(0.2), Vector3::x());
        assert_eq!(slot.load().counter_velocity, cv);
    }

    #[test]
    fn test_set_fixation_keeps_flag() {
        let slot = TargetSlot::new(GazeTarget::new(HeadVector::zeros(), Vector3::zeros()));
        slot.set_fixation(Vector3::new(0.5, 0.0, 0.3));
        assert!(!slot.is_new());
        assert_eq!(slot.load().xd, Vector3::new(0.5, 0.0, 0.3));
        assert_eq!(slot.load().qd, HeadVector::zeros());
    }
}
