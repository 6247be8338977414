//! 控制循环性能指标
//!
//! 全部为原子计数器（Relaxed），控制线程写入，任意线程读取快照。

use std::sync::atomic::{AtomicU64, Ordering};

/// 控制循环指标
#[derive(Debug, Default)]
pub struct ControlMetrics {
    /// 已执行的周期数
    pub cycles: AtomicU64,
    /// 周期超时次数（计算耗时超过周期）
    pub overruns: AtomicU64,
    /// 反馈读取失败次数
    pub feedback_faults: AtomicU64,
    /// 下发的速度指令数
    pub velocity_commands: AtomicU64,
    /// 下发的停机指令数
    pub stops: AtomicU64,
    /// 遥测丢弃次数（订阅者通道已满）
    pub telemetry_drops: AtomicU64,
}

impl ControlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            feedback_faults: self.feedback_faults.load(Ordering::Relaxed),
            velocity_commands: self.velocity_commands.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
            telemetry_drops: self.telemetry_drops.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub overruns: u64,
    pub feedback_faults: u64,
    pub velocity_commands: u64,
    pub stops: u64,
    pub telemetry_drops: u64,
}

impl MetricsSnapshot {
    /// 超时比例（0.0 - 1.0）
    pub fn overrun_rate(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.overruns as f64 / self.cycles as f64
        }
    }
}
