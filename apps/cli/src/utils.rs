//! 参数解析工具

use anyhow::{Context, Result};
use gaze_sdk::kinematics::{DEG2RAD, HEAD_JOINTS, HeadVector};

/// 解析头部关节（度，逗号分隔）为弧度向量
///
/// 顺序：颈部 pitch, roll, yaw, 眼睛 tilt, version, vergence。
pub fn parse_head_degrees(input: &str) -> Result<HeadVector> {
    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("解析头部关节失败")?;

    if values.len() != HEAD_JOINTS {
        anyhow::bail!(
            "需要 {} 个头部关节（pitch,roll,yaw,tilt,version,vergence），实际 {} 个",
            HEAD_JOINTS,
            values.len()
        );
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        anyhow::bail!("关节角必须为有限值: {}", v);
    }

    Ok(HeadVector::from_iterator(
        values.into_iter().map(|deg| deg * DEG2RAD),
    ))
}

/// 格式化角度数组
pub fn format_degrees(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:7.2}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_head_degrees() {
        let q = parse_head_degrees("10, 0, -5, 0, 2.5, 4").unwrap();
        assert!((q[0] - 10.0 * DEG2RAD).abs() < 1e-12);
        assert!((q[2] + 5.0 * DEG2RAD).abs() < 1e-12);
        assert!((q[5] - 4.0 * DEG2RAD).abs() < 1e-12);
    }

    #[test]
    fn test_parse_head_degrees_rejects_bad_input() {
        assert!(parse_head_degrees("1,2,3").is_err());
        assert!(parse_head_degrees("1,2,3,4,5,x").is_err());
        assert!(parse_head_degrees("1,2,3,4,5,inf").is_err());
    }

    #[test]
    fn test_format_degrees() {
        assert_eq!(format_degrees(&[1.0, -2.5]), "   1.00   -2.50");
    }
}
