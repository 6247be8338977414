//! 遥测输出
//!
//! 两个独立的订阅通道：注视点、关节（躯干 + 头部，度）。每个订阅者一个有界
//! crossbeam 通道，发布端 `try_send`，从不阻塞控制线程。通道满时丢弃本次样本，
//! 订阅者断开后在下一次发布时移除。没有订阅者时直接跳过。
//!
//! 订阅者列表放在 `ArcSwap` 中：发布端无锁读取，订阅/移除走 RCU。

use crate::metrics::ControlMetrics;
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use gaze_kinematics::{HEAD_JOINTS, TORSO_JOINTS};
use nalgebra::Vector3;
use std::sync::Arc;

/// 关节遥测向量长度（躯干 + 头部）
pub const JOINT_SAMPLE_LEN: usize = TORSO_JOINTS + HEAD_JOINTS;

/// 注视点样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationSample {
    pub cycle: u64,
    /// 当前注视点（米）
    pub point: Vector3<f64>,
}

/// 关节样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub cycle: u64,
    /// 躯干（实测）+ 头部关节，单位度
    pub degrees: [f64; JOINT_SAMPLE_LEN],
}

/// 单个通道的订阅者集合
struct Topic<T> {
    subscribers: ArcSwap<Vec<Sender<T>>>,
}

impl<T> Topic<T> {
    fn new() -> Self {
        Self {
            subscribers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    fn subscribe(&self, capacity: usize) -> Receiver<T> {
        let (tx, rx) = bounded(capacity);
        self.subscribers.rcu(|subs| {
            let mut subs = Vec::clone(subs);
            subs.push(tx.clone());
            subs
        });
        rx
    }

    fn has_subscribers(&self) -> bool {
        !self.subscribers.load().is_empty()
    }

    fn len(&self) -> usize {
        self.subscribers.load().len()
    }

    fn close(&self) {
        self.subscribers.store(Arc::new(Vec::new()));
    }
}

impl<T: Clone> Topic<T> {
    /// 发布一个样本，返回成功送达的订阅者数
    fn publish(&self, sample: &T, metrics: &ControlMetrics) -> usize {
        let subs = self.subscribers.load();
        if subs.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        let mut disconnected: Vec<Sender<T>> = Vec::new();
        for tx in subs.iter() {
            match tx.try_send(sample.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => ControlMetrics::incr(&metrics.telemetry_drops),
                Err(TrySendError::Disconnected(_)) => disconnected.push(tx.clone()),
            }
        }
        drop(subs);

        if !disconnected.is_empty() {
            self.subscribers.rcu(|subs| {
                subs.iter()
                    .filter(|s| !disconnected.iter().any(|d| d.same_channel(s)))
                    .cloned()
                    .collect::<Vec<_>>()
            });
        }
        delivered
    }
}

/// 遥测中心
pub struct TelemetryHub {
    capacity: usize,
    fixation: Topic<FixationSample>,
    joints: Topic<JointSample>,
}

impl TelemetryHub {
    /// `capacity` 为每个订阅者通道的容量
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            fixation: Topic::new(),
            joints: Topic::new(),
        }
    }

    pub fn subscribe_fixation(&self) -> Receiver<FixationSample> {
        self.fixation.subscribe(self.capacity)
    }

    pub fn subscribe_joints(&self) -> Receiver<JointSample> {
        self.joints.subscribe(self.capacity)
    }

    pub fn has_subscribers(&self) -> bool {
        self.fixation.has_subscribers() || self.joints.has_subscribers()
    }

    /// 当前订阅者数（注视点, 关节）
    pub fn subscriber_counts(&self) -> (usize, usize) {
        (self.fixation.len(), self.joints.len())
    }

    pub fn publish_fixation(&self, sample: FixationSample, metrics: &ControlMetrics) -> usize {
        self.fixation.publish(&sample, metrics)
    }

    pub fn publish_joints(&self, sample: JointSample, metrics: &ControlMetrics) -> usize {
        self.joints.publish(&sample, metrics)
    }

    /// 关闭所有订阅通道（订阅者收到 Disconnected）
    pub fn close(&self) {
        self.fixation.close();
        self.joints.close();
    }
}

impl std::fmt::Debug for TelemetryHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (fixation, joints) = self.subscriber_counts();
        f.debug_struct("TelemetryHub")
            .field("capacity", &self.capacity)
            .field("fixation_subscribers", &fixation)
            .field("joint_subscribers", &joints)
            .finish()
    }
}
