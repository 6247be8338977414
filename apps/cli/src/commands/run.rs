//! run 命令
//!
//! 在仿真后端上运行注视控制器，输出关节与注视点遥测，Ctrl+C 或到时退出

use anyhow::{Context, Result};
use clap::Args;
use gaze_sdk::GazeControllerBuilder;
use gaze_sdk::driver::{FaultNotice, FixationSample, JointSample};
use nalgebra::Vector3;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use super::load_config;
use crate::utils::{format_degrees, parse_head_degrees};

/// 控制器运行参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 目标头部关节（度）：pitch,roll,yaw,tilt,version,vergence
    #[arg(short, long)]
    pub target: Option<String>,

    /// 运行时长（秒），缺省运行到 Ctrl+C
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// 每隔多少个关节样本输出一次
    #[arg(long, default_value_t = 10)]
    pub every: u64,

    /// 以 JSON Lines 输出遥测
    #[arg(long)]
    pub json: bool,

    /// 开启跟踪锁定模式
    #[arg(long)]
    pub track: bool,
}

/// JSON 遥测行
#[derive(Debug, Serialize)]
struct TelemetryLine {
    cycle: u64,
    joints_deg: Vec<f64>,
    fixation_m: Option<[f64; 3]>,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let target = self.target.as_deref().map(parse_head_degrees).transpose()?;
        let run_time = self.duration.map(run_duration).transpose()?.flatten();
        let every = self.every.max(1);

        let (fault_tx, fault_rx) = crossbeam_channel::bounded::<FaultNotice>(16);
        let mut controller = GazeControllerBuilder::new(config)
            .fault_sender(fault_tx)
            .build()
            .context("构造控制器失败")?;
        let joints = controller.subscribe_joints();
        let fixations = controller.subscribe_fixation();

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
            eprintln!("\n收到退出信号，正在停止控制器...");
        })
        .context("设置 Ctrl+C 处理失败")?;

        controller.start()?;
        if self.track {
            controller.set_tracking_mode(true);
        }
        if let Some(qd) = target {
            // 没有逆运动学求解器：期望注视点沿用当前注视点
            let xd = controller.fixation_point().unwrap_or_else(|_| Vector3::zeros());
            controller.set_target(qd, xd);
            info!("Target published: {:?}", controller.desired_deg());
        }

        let deadline = run_time.and_then(|d| Instant::now().checked_add(d));
        let mut latest_fixation: Option<FixationSample> = None;

        while running.load(Ordering::SeqCst) && deadline.is_none_or(|d| Instant::now() < d) {
            while let Ok(notice) = fault_rx.try_recv() {
                eprintln!("⚠️  {}", notice);
            }
            while let Ok(sample) = fixations.try_recv() {
                latest_fixation = Some(sample);
            }

            let Ok(sample) = joints.recv_timeout(Duration::from_millis(100)) else {
                continue;
            };
            if sample.cycle % every == 0 {
                self.print_sample(&sample, latest_fixation.as_ref())?;
            }
        }

        controller.stop()?;
        let metrics = controller.metrics();
        println!();
        println!("📊 运行统计:");
        println!("  周期数: {}", metrics.cycles);
        println!(
            "  超时: {} ({:.2}%)",
            metrics.overruns,
            metrics.overrun_rate() * 100.0
        );
        println!("  反馈故障: {}", metrics.feedback_faults);
        println!("  遥测丢弃: {}", metrics.telemetry_drops);
        println!("  到位: {}", if controller.is_motion_done() { "是" } else { "否" });
        Ok(())
    }

    fn print_sample(&self, sample: &JointSample, fixation: Option<&FixationSample>) -> Result<()> {
        if self.json {
            let line = TelemetryLine {
                cycle: sample.cycle,
                joints_deg: sample.degrees.to_vec(),
                fixation_m: fixation.map(|f| [f.point.x, f.point.y, f.point.z]),
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            let fp = fixation
                .map(|f| format!("[{:.3}, {:.3}, {:.3}]", f.point.x, f.point.y, f.point.z))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "#{:<6} 关节(度): {}  注视点: {}",
                sample.cycle,
                format_degrees(&sample.degrees),
                fp
            );
        }
        Ok(())
    }
}

/// 解析 `--duration`：非正数或无穷大表示一直运行
fn run_duration(secs: f64) -> Result<Option<Duration>> {
    if secs.is_nan() {
        anyhow::bail!("--duration 不是有效数字");
    }
    if secs <= 0.0 || secs.is_infinite() {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .with_context(|| format!("--duration {} 超出范围", secs))
}
