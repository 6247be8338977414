//! pose 命令
//!
//! 在给定头部关节角下查询眼睛/头部位姿与注视点（仅运动学，不启动控制循环）

use anyhow::Result;
use clap::Args;
use gaze_sdk::GazeControllerBuilder;
use gaze_sdk::kinematics::{ChainSelector, RAD2DEG, TorsoVector};
use std::path::PathBuf;

use super::load_config;
use crate::utils::{format_degrees, parse_head_degrees};

/// 位姿查询参数
#[derive(Args, Debug)]
pub struct PoseCommand {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 头部关节（度）：pitch,roll,yaw,tilt,version,vergence
    #[arg(long)]
    pub head: Option<String>,

    /// 位姿选择器（left / right / head），缺省输出全部
    #[arg(short, long)]
    pub selector: Option<String>,
}

impl PoseCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let control = GazeControllerBuilder::new(config).build_loop()?;
        let mut kinematics = control.context().kinematics.lock();

        if let Some(head) = &self.head {
            let q = parse_head_degrees(head)?;
            kinematics.set_angles(&TorsoVector::zeros(), &q)?;
        }

        let angles = kinematics.head_angles();
        let degrees: Vec<f64> = angles.iter().map(|a| a * RAD2DEG).collect();
        println!("头部关节 (度): {}", format_degrees(&degrees));

        let selectors = match &self.selector {
            Some(s) => vec![s.parse::<ChainSelector>()?],
            None => vec![ChainSelector::Left, ChainSelector::Right, ChainSelector::Head],
        };
        for selector in selectors {
            let pose = kinematics.end_effector_pose(selector);
            let v = pose.to_axis_angle_vector();
            println!(
                "  {:<5}: 位置 [{:.4}, {:.4}, {:.4}] m, 轴角 [{:.3}, {:.3}, {:.3}] {:.2}°",
                selector.as_str(),
                v[0],
                v[1],
                v[2],
                v[3],
                v[4],
                v[5],
                v[6] * RAD2DEG
            );
        }

        match kinematics.fixation_point() {
            Ok(fp) => println!("注视点: [{:.4}, {:.4}, {:.4}] m", fp.x, fp.y, fp.z),
            Err(e) => println!("注视点: 不可用（{}）", e),
        }
        Ok(())
    }
}
