//! 位姿表示

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

/// 末端位姿（基坐标系下）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// 位置（米）
    pub position: Vector3<f64>,
    /// 姿态
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self {
            position: iso.translation.vector,
            orientation: iso.rotation,
        }
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.into(), self.orientation)
    }

    /// 局部 x 轴在基坐标系下的方向（眼睛链中即光轴方向）
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::x()
    }

    /// 7 维向量表示：`[x, y, z, ax, ay, az, theta]`（轴角，轴为单位向量）
    ///
    /// 零旋转时轴取 z 轴。
    pub fn to_axis_angle_vector(&self) -> [f64; 7] {
        let (axis, angle) = match self.orientation.axis_angle() {
            Some((axis, angle)) => (axis.into_inner(), angle),
            None => (Vector3::z(), 0.0),
        };
        [
            self.position.x,
            self.position.y,
            self.position.z,
            axis.x,
            axis.y,
            axis.z,
            angle,
        ]
    }
}
