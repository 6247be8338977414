//! 死区提升
//!
//! 执行器无法可靠执行过小的速度。对 `0 < |v| < min_abs_vel` 的分量，
//! 按位置误差 `qd - q` 的符号提升到 `±min_abs_vel`；误差恰为 0 时置零。
//! 零速度与超过阈值的速度原样保留。

use gaze_kinematics::HeadVector;

/// 逐关节死区提升（原地修改）
pub fn shape_deadband(
    velocity: &mut HeadVector,
    desired: &HeadVector,
    feedback: &HeadVector,
    min_abs_vel: f64,
) {
    for i in 0..velocity.len() {
        let v = velocity[i];
        if v != 0.0 && v.abs() < min_abs_vel {
            let e = desired[i] - feedback[i];
            velocity[i] = if e > 0.0 {
                min_abs_vel
            } else if e < 0.0 {
                -min_abs_vel
            } else {
                0.0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f64 = 0.01;

    #[test]
    fn test_lift_follows_error_sign() {
        let desired = HeadVector::new(1.0, -1.0, 0.0, 0.5, 0.5, 0.5);
        let feedback = HeadVector::zeros();
        // 速度符号与误差符号无关，只看误差
        let mut v = HeadVector::new(0.001, 0.001, 0.001, -0.001, 0.0, 0.5);
        shape_deadband(&mut v, &desired, &feedback, MIN);

        assert_eq!(v[0], MIN);
        assert_eq!(v[1], -MIN);
        assert_eq!(v[2], 0.0);
        assert_eq!(v[3], MIN);
        // 零速度保持为零
        assert_eq!(v[4], 0.0);
        // 超过阈值的速度不变
        assert_eq!(v[5], 0.5);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let desired = HeadVector::from_element(1.0);
        let mut v = HeadVector::from_element(MIN);
        shape_deadband(&mut v, &desired, &HeadVector::zeros(), MIN);
        assert_eq!(v, HeadVector::from_element(MIN));
    }
}
