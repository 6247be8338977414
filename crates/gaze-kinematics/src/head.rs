//! 头部运动学模型（颈部 + 左眼 + 右眼）
//!
//! 三条链共享躯干 + 颈部前缀，但各自持有自己的关节数组（值拷贝同步，而非别名）。
//! 控制循环每个周期通过 [`HeadKinematics::set_angles`] 把共享关节写入三条链。
//!
//! 基坐标系：x 向前，y 向左，z 向上。眼睛链末端坐标系的 x 轴即光轴。

use crate::bounds::{HardwareLimits, HeadBounds, JointRange};
use crate::chain::{Chain, Link};
use crate::error::KinematicsError;
use crate::pose::Pose;
use crate::{HeadVector, TORSO_JOINTS, TorsoVector};
use nalgebra::{Isometry3, Vector3};
use std::fmt;
use std::str::FromStr;

/// 眼睛链中俯仰关节的下标
const EYE_TILT: usize = TORSO_JOINTS + 3;
/// 眼睛链中水平转动关节的下标
const EYE_PAN: usize = TORSO_JOINTS + 4;

/// 链选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainSelector {
    /// 头部中心（颈部链）
    Head,
    /// 左眼
    Left,
    /// 右眼
    Right,
}

impl ChainSelector {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl FromStr for ChainSelector {
    type Err = KinematicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(Self::Head),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(KinematicsError::InvalidSelector(other.to_string())),
        }
    }
}

impl fmt::Display for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 头部标称几何参数（米）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadGeometry {
    /// 颈部关节相对躯干关节的高度
    pub neck_height: f64,
    /// 眼球中心相对颈部关节的前向偏移
    pub eye_forward: f64,
    /// 眼球中心相对颈部关节的高度
    pub eye_height: f64,
    /// 两眼间距
    pub baseline: f64,
}

impl Default for HeadGeometry {
    fn default() -> Self {
        Self {
            neck_height: 0.25,
            eye_forward: 0.06,
            eye_height: 0.10,
            baseline: 0.068,
        }
    }
}

impl HeadGeometry {
    fn prefix(&self) -> Vec<Link> {
        vec![
            // 躯干 pitch / roll / yaw
            Link::revolute([0.0, 0.0, 0.0], Vector3::y(), -20.0, 70.0),
            Link::revolute([0.0, 0.0, 0.0], Vector3::x(), -30.0, 30.0),
            Link::revolute([0.0, 0.0, 0.0], Vector3::z(), -50.0, 50.0),
            // 颈部 pitch / roll / yaw
            Link::revolute([0.0, 0.0, self.neck_height], Vector3::y(), -40.0, 30.0),
            Link::revolute([0.0, 0.0, 0.0], Vector3::x(), -70.0, 60.0),
            Link::revolute([0.0, 0.0, 0.0], Vector3::z(), -55.0, 55.0),
        ]
    }

    fn eye_chain(&self, lateral: f64) -> Chain {
        let mut links = self.prefix();
        // 俯仰：正角度向下看
        links.push(Link::revolute(
            [self.eye_forward, lateral, self.eye_height],
            Vector3::y(),
            -35.0,
            15.0,
        ));
        // 水平转动：正角度向右看，因此 vergence > 0 时两眼向内汇聚
        links.push(Link::revolute([0.0, 0.0, 0.0], -Vector3::z(), -50.0, 50.0));
        Chain::new(Isometry3::identity(), links)
    }

    /// 颈部链：末端为两眼中点（头部中心），朝向正前方
    pub fn neck_chain(&self) -> Chain {
        let mut links = self.prefix();
        links.push(Link::fixed(Isometry3::translation(
            self.eye_forward,
            0.0,
            self.eye_height,
        )));
        Chain::new(Isometry3::identity(), links)
    }

    pub fn left_eye_chain(&self) -> Chain {
        self.eye_chain(self.baseline / 2.0)
    }

    pub fn right_eye_chain(&self) -> Chain {
        self.eye_chain(-self.baseline / 2.0)
    }
}

/// 头部运动学模型
///
/// 三条链按值持有。模型本身不做同步，由调用方（控制循环）用一把互斥锁保护。
#[derive(Debug, Clone)]
pub struct HeadKinematics {
    neck: Chain,
    eye_left: Chain,
    eye_right: Chain,
}

impl Default for HeadKinematics {
    fn default() -> Self {
        Self::new(HeadGeometry::default())
    }
}

impl HeadKinematics {
    pub fn new(geometry: HeadGeometry) -> Self {
        Self {
            neck: geometry.neck_chain(),
            eye_left: geometry.left_eye_chain(),
            eye_right: geometry.right_eye_chain(),
        }
    }

    /// 在眼睛链末端追加对齐变换（仅在启动时调用）
    pub fn append_alignment(&mut self, left: &[Isometry3<f64>], right: &[Isometry3<f64>]) {
        for t in left {
            self.eye_left.push_fixed(*t);
        }
        for t in right {
            self.eye_right.push_fixed(*t);
        }
    }

    /// 计算有效头部限位并写回三条链
    pub fn align_bounds(
        &mut self,
        hardware: Option<&HardwareLimits>,
        tilt: JointRange,
        min_vergence: f64,
    ) -> Result<HeadBounds, KinematicsError> {
        let bounds = HeadBounds::align(&self.eye_left, hardware, tilt, min_vergence)?;

        if let Some(torso) = hardware.and_then(|hw| hw.torso.as_ref()) {
            for (i, hw_range) in torso.iter().enumerate() {
                let range = self.neck.range(i)?.intersect(hw_range);
                for chain in self.chains_mut() {
                    chain.set_range(i, range)?;
                }
            }
        }

        for i in 0..3 {
            for chain in self.chains_mut() {
                chain.set_range(TORSO_JOINTS + i, bounds.range(i))?;
            }
        }
        for eye in [&mut self.eye_left, &mut self.eye_right] {
            eye.set_range(EYE_TILT, bounds.range(3))?;
            eye.set_range(EYE_PAN, bounds.range(4))?;
        }

        Ok(bounds)
    }

    /// 写入关节角
    ///
    /// 躯干与颈部关节复制到三条链；眼睛拆分为独立的左右角度：
    ///
    /// ```text
    /// tilt_L = tilt_R = head[3]
    /// pan_L  = head[4] + head[5] / 2
    /// pan_R  = head[4] - head[5] / 2
    /// ```
    pub fn set_angles(
        &mut self,
        torso: &TorsoVector,
        head: &HeadVector,
    ) -> Result<(), KinematicsError> {
        for chain in self.chains_mut() {
            for i in 0..TORSO_JOINTS {
                chain.set_angle(i, torso[i])?;
            }
            for i in 0..3 {
                chain.set_angle(TORSO_JOINTS + i, head[i])?;
            }
        }

        let half_vergence = head[5] / 2.0;
        self.eye_left.set_angle(EYE_TILT, head[3])?;
        self.eye_left.set_angle(EYE_PAN, head[4] + half_vergence)?;
        self.eye_right.set_angle(EYE_TILT, head[3])?;
        self.eye_right.set_angle(EYE_PAN, head[4] - half_vergence)?;
        Ok(())
    }

    pub fn chain(&self, selector: ChainSelector) -> &Chain {
        match selector {
            ChainSelector::Head => &self.neck,
            ChainSelector::Left => &self.eye_left,
            ChainSelector::Right => &self.eye_right,
        }
    }

    /// 末端位姿
    pub fn end_effector_pose(&self, selector: ChainSelector) -> Pose {
        self.chain(selector).end_effector_pose()
    }

    /// 按字符串选择器查询位姿（"left" / "right" / "head"）
    pub fn pose(&self, selector: &str) -> Result<Pose, KinematicsError> {
        let selector: ChainSelector = selector.parse()?;
        Ok(self.end_effector_pose(selector))
    }

    /// 当前注视点：两眼光轴最近点连线的中点
    ///
    /// 光轴平行（例如聚散角为 0）时返回 [`KinematicsError::ParallelAxes`]。
    pub fn fixation_point(&self) -> Result<Vector3<f64>, KinematicsError> {
        let left = self.eye_left.end_effector_pose();
        let right = self.eye_right.end_effector_pose();
        closest_midpoint(
            &left.position,
            &left.forward(),
            &right.position,
            &right.forward(),
        )
    }

    /// 当前头部关节（由左眼链还原 version / vergence 编码）
    pub fn head_angles(&self) -> HeadVector {
        let l = self.eye_left.angles();
        let r = self.eye_right.angles();
        let mut q = HeadVector::zeros();
        q.fixed_rows_mut::<3>(0)
            .copy_from_slice(&l[TORSO_JOINTS..TORSO_JOINTS + 3]);
        q[3] = l[EYE_TILT];
        q[4] = (l[EYE_PAN] + r[EYE_PAN]) / 2.0;
        q[5] = l[EYE_PAN] - r[EYE_PAN];
        q
    }

    fn chains_mut(&mut self) -> [&mut Chain; 3] {
        [&mut self.neck, &mut self.eye_left, &mut self.eye_right]
    }
}

/// 两条射线 `p1 + s·d1`、`p2 + t·d2` 最近点连线的中点
fn closest_midpoint(
    p1: &Vector3<f64>,
    d1: &Vector3<f64>,
    p2: &Vector3<f64>,
    d2: &Vector3<f64>,
) -> Result<Vector3<f64>, KinematicsError> {
    let w0 = p1 - p2;
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d2.dot(d2);
    let d = d1.dot(&w0);
    let e = d2.dot(&w0);

    let denom = a * c - b * b;
    if denom.abs() < 1e-12 {
        return Err(KinematicsError::ParallelAxes);
    }

    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;
    Ok(((p1 + d1 * s) + (p2 + d2 * t)) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEG2RAD, HEAD_JOINTS};
    use approx::assert_relative_eq;

    #[test]
    fn test_selector_parse() {
        assert_eq!("left".parse::<ChainSelector>(), Ok(ChainSelector::Left));
        assert_eq!("right".parse::<ChainSelector>(), Ok(ChainSelector::Right));
        assert_eq!("head".parse::<ChainSelector>(), Ok(ChainSelector::Head));
        assert_eq!(
            "torso".parse::<ChainSelector>(),
            Err(KinematicsError::InvalidSelector("torso".to_string()))
        );
        assert_eq!(ChainSelector::Left.to_string(), "left");
    }

    #[test]
    fn test_chain_dof() {
        let head = HeadKinematics::default();
        assert_eq!(head.chain(ChainSelector::Head).dof(), 6);
        assert_eq!(head.chain(ChainSelector::Left).dof(), 8);
        assert_eq!(head.chain(ChainSelector::Right).dof(), 8);
    }

    #[test]
    fn test_set_angles_vergence_split() {
        let mut head = HeadKinematics::default();
        let torso = TorsoVector::new(0.1, 0.0, -0.1);
        let q = HeadVector::new(0.05, 0.0, 0.2, -0.1, 0.1, 0.2);
        head.set_angles(&torso, &q).unwrap();

        let l = head.chain(ChainSelector::Left).angles();
        let r = head.chain(ChainSelector::Right).angles();
        let n = head.chain(ChainSelector::Head).angles();

        for i in 0..6 {
            assert_relative_eq!(l[i], n[i]);
            assert_relative_eq!(r[i], n[i]);
        }
        assert_relative_eq!(n[0], 0.1);
        assert_relative_eq!(n[5], 0.2);
        assert_relative_eq!(l[EYE_TILT], -0.1);
        assert_relative_eq!(r[EYE_TILT], -0.1);
        assert_relative_eq!(l[EYE_PAN], 0.2, epsilon = 1e-12);
        assert_relative_eq!(r[EYE_PAN], 0.0, epsilon = 1e-12);

        assert_relative_eq!(head.head_angles(), q, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_by_selector() {
        let head = HeadKinematics::default();
        let geometry = HeadGeometry::default();

        let center = head.pose("head").unwrap();
        assert_relative_eq!(
            center.position,
            Vector3::new(geometry.eye_forward, 0.0, geometry.neck_height + geometry.eye_height),
            epsilon = 1e-12
        );

        let left = head.pose("left").unwrap();
        let right = head.pose("right").unwrap();
        assert_relative_eq!(left.position.y, geometry.baseline / 2.0, epsilon = 1e-12);
        assert_relative_eq!(right.position.y, -geometry.baseline / 2.0, epsilon = 1e-12);

        assert_eq!(
            head.pose("torso"),
            Err(KinematicsError::InvalidSelector("torso".to_string()))
        );
    }

    #[test]
    fn test_fixation_point_symmetric_vergence() {
        let mut head = HeadKinematics::default();
        let geometry = HeadGeometry::default();
        let vergence = 10.0 * DEG2RAD;
        let q = HeadVector::new(0.0, 0.0, 0.0, 0.0, 0.0, vergence);
        head.set_angles(&TorsoVector::zeros(), &q).unwrap();

        let fp = head.fixation_point().unwrap();
        let depth = (geometry.baseline / 2.0) / (vergence / 2.0).tan();
        assert_relative_eq!(fp.x, geometry.eye_forward + depth, epsilon = 1e-9);
        assert_relative_eq!(fp.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fp.z, geometry.neck_height + geometry.eye_height, epsilon = 1e-9);
    }

    #[test]
    fn test_fixation_point_follows_version() {
        let mut head = HeadKinematics::default();
        let q = HeadVector::new(0.0, 0.0, 0.0, 0.0, 10.0 * DEG2RAD, 5.0 * DEG2RAD);
        head.set_angles(&TorsoVector::zeros(), &q).unwrap();

        // 正 version 向右看
        let fp = head.fixation_point().unwrap();
        assert!(fp.y < 0.0, "fixation point should be on the right: {:?}", fp);
    }

    #[test]
    fn test_fixation_point_parallel_axes() {
        let head = HeadKinematics::default();
        // 默认构型 vergence = 0，光轴平行
        assert_eq!(head.fixation_point(), Err(KinematicsError::ParallelAxes));
    }

    #[test]
    fn test_align_bounds_writes_back() {
        let mut head = HeadKinematics::default();
        let tilt = JointRange::from_degrees(-10.0, 10.0);
        let bounds = head.align_bounds(None, tilt, DEG2RAD).unwrap();

        let left = head.chain(ChainSelector::Left);
        assert_eq!(left.range(EYE_TILT).unwrap(), bounds.range(3));
        assert_eq!(left.range(EYE_PAN).unwrap(), bounds.range(4));
        assert_eq!(
            head.chain(ChainSelector::Head).range(TORSO_JOINTS).unwrap(),
            bounds.range(0)
        );
    }

    #[test]
    fn test_align_bounds_with_torso_limits() {
        let mut head = HeadKinematics::default();
        let wide = JointRange::new(-10.0, 10.0);
        let hw = HardwareLimits {
            torso: Some([JointRange::new(-0.1, 0.1); TORSO_JOINTS]),
            head: [wide; HEAD_JOINTS],
        };
        head.align_bounds(Some(&hw), JointRange::new(-1.0, 1.0), DEG2RAD)
            .unwrap();
        for selector in [ChainSelector::Head, ChainSelector::Left, ChainSelector::Right] {
            assert_eq!(
                head.chain(selector).range(0).unwrap(),
                JointRange::new(-0.1, 0.1)
            );
        }
    }

    #[test]
    fn test_append_alignment() {
        let mut head = HeadKinematics::default();
        let before = head.pose("left").unwrap().position;
        head.append_alignment(&[Isometry3::translation(0.01, 0.0, 0.0)], &[]);
        let after = head.pose("left").unwrap().position;
        assert_relative_eq!(after.x - before.x, 0.01, epsilon = 1e-12);
        assert_eq!(head.chain(ChainSelector::Left).dof(), 8);
    }
}
