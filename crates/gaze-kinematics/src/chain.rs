//! 串联关节链
//!
//! 每个连杆由"相对父坐标系的固定偏移 + 绕局部轴旋转"组成：
//!
//! ```text
//! T_i = origin_i * R(axis_i, q_i)
//! T_ee = base * T_0 * T_1 * ... * T_n
//! ```
//!
//! 没有转轴的连杆是固定连杆（例如启动时追加的对齐连杆），不计入自由度。

use crate::bounds::JointRange;
use crate::error::KinematicsError;
use crate::pose::Pose;
use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

/// 单个连杆
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// 相对父坐标系的固定偏移
    pub origin: Isometry3<f64>,
    /// 转轴（局部坐标系），`None` 表示固定连杆
    pub axis: Option<Unit<Vector3<f64>>>,
    /// 关节限位（弧度）
    pub range: JointRange,
}

impl Link {
    /// 创建转动关节
    ///
    /// `offset` 为相对父坐标系的平移（米），`min_deg` / `max_deg` 为限位（度）。
    pub fn revolute(offset: [f64; 3], axis: Vector3<f64>, min_deg: f64, max_deg: f64) -> Self {
        Self {
            origin: Isometry3::from_parts(
                Translation3::new(offset[0], offset[1], offset[2]),
                UnitQuaternion::identity(),
            ),
            axis: Some(Unit::new_normalize(axis)),
            range: JointRange::from_degrees(min_deg, max_deg),
        }
    }

    /// 创建固定连杆
    pub fn fixed(origin: Isometry3<f64>) -> Self {
        Self {
            origin,
            axis: None,
            range: JointRange::new(0.0, 0.0),
        }
    }

    /// 是否为可动关节
    pub fn is_revolute(&self) -> bool {
        self.axis.is_some()
    }

    fn transform(&self, angle: f64) -> Isometry3<f64> {
        match &self.axis {
            Some(axis) => self.origin * UnitQuaternion::from_axis_angle(axis, angle),
            None => self.origin,
        }
    }
}

/// 串联关节链
///
/// 关节数在构造时确定，之后只允许追加固定连杆。
#[derive(Debug, Clone)]
pub struct Chain {
    base: Isometry3<f64>,
    links: Vec<Link>,
    angles: Vec<f64>,
}

impl Chain {
    /// 创建关节链，所有关节角初始化为 0（再按限位夹紧）
    pub fn new(base: Isometry3<f64>, links: Vec<Link>) -> Self {
        let angles = links
            .iter()
            .filter(|l| l.is_revolute())
            .map(|l| l.range.clamp(0.0))
            .collect();
        Self {
            base,
            links,
            angles,
        }
    }

    /// 在链末端追加固定连杆（对齐变换），不改变自由度
    pub fn push_fixed(&mut self, origin: Isometry3<f64>) {
        self.links.push(Link::fixed(origin));
    }

    /// 自由度（可动关节数）
    pub fn dof(&self) -> usize {
        self.angles.len()
    }

    /// 全部连杆数（含固定连杆）
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// 当前关节角
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// 读取第 `index` 个关节角
    pub fn angle(&self, index: usize) -> Result<f64, KinematicsError> {
        self.angles
            .get(index)
            .copied()
            .ok_or(KinematicsError::JointOutOfRange {
                index,
                len: self.dof(),
            })
    }

    /// 写入第 `index` 个关节角（按限位夹紧），返回实际写入的值
    pub fn set_angle(&mut self, index: usize, angle: f64) -> Result<f64, KinematicsError> {
        let range = self.range(index)?;
        let applied = range.clamp(angle);
        self.angles[index] = applied;
        Ok(applied)
    }

    /// 第 `index` 个关节的限位
    pub fn range(&self, index: usize) -> Result<JointRange, KinematicsError> {
        self.revolute_links()
            .nth(index)
            .map(|l| l.range)
            .ok_or(KinematicsError::JointOutOfRange {
                index,
                len: self.dof(),
            })
    }

    /// 替换第 `index` 个关节的限位，当前角度随之夹紧
    pub fn set_range(&mut self, index: usize, range: JointRange) -> Result<(), KinematicsError> {
        range.validate(index)?;
        let len = self.dof();
        let link = self
            .links
            .iter_mut()
            .filter(|l| l.is_revolute())
            .nth(index)
            .ok_or(KinematicsError::JointOutOfRange { index, len })?;
        link.range = range;
        self.angles[index] = range.clamp(self.angles[index]);
        Ok(())
    }

    /// 末端执行器的齐次变换（基坐标系下）
    pub fn end_effector(&self) -> Isometry3<f64> {
        let mut joint = 0;
        self.links.iter().fold(self.base, |acc, link| {
            let angle = if link.is_revolute() {
                joint += 1;
                self.angles[joint - 1]
            } else {
                0.0
            };
            acc * link.transform(angle)
        })
    }

    /// 末端执行器位姿
    pub fn end_effector_pose(&self) -> Pose {
        Pose::from_isometry(&self.end_effector())
    }

    fn revolute_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.is_revolute())
    }
}
