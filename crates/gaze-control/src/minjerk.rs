//! Minimum-Jerk 速度控制器
//!
//! 每个周期从当前状态重新规划一条五次多项式（误差坐标系下）：
//!
//! ```text
//! p(t) = c0 + c1*t + c2*t² + c3*t³ + c4*t⁴ + c5*t⁵,  t ∈ [0, r]
//! ```
//!
//! 边界条件：
//!
//! - 起点：`p(0) = 0`，`p'(0) = v`，`p''(0) = a`（`v`、`a` 为上一周期轨迹的末态）
//! - 终点：`p(r) = e`，`p'(r) = 0`，`p''(r) = 0`
//!
//! 其中 `r = T - elapsed` 为剩余时间，`e` 为当前位置误差。输出速度为
//! `p(Ts) / Ts`，即在一个周期内积分恰好走完规划轨迹的第一段。
//!
//! 理想条件下（执行器精确跟随）重新规划得到的仍是同一条轨迹，因此在 `T` 时刻
//! 误差、速度、加速度同时归零。
//!
//! # 退化情形
//!
//! - `T <= 0` 或非有限值：输出 `e / Ts`（一个周期内消除误差）
//! - 轨迹到期后：`elapsed` 归零，以完整时长 `T` 重新规划残余误差（跟踪模式下
//!   循环不会回到 IDLE，到期后仍保持 minimum-jerk 整形）
//! - 误差偏离预测轨迹超过重规划阈值（目标跳变）：`elapsed` 归零，从当前速度/加速度
//!   重新开始一条完整时长的轨迹
//!
//! 控制器从不对输出限幅。

use nalgebra::SVector;

/// 五次多项式系数（单关节）
#[derive(Debug, Clone, Copy)]
struct QuinticCoeffs {
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    c5: f64,
}

impl QuinticCoeffs {
    /// 求解 `p(0) = 0, p'(0) = v0, p''(0) = a0, p(r) = pf, p'(r) = p''(r) = 0`
    fn solve(v0: f64, a0: f64, pf: f64, r: f64) -> Self {
        let r2 = r * r;
        let r3 = r2 * r;
        Self {
            c1: v0,
            c2: a0 / 2.0,
            c3: (20.0 * pf - 12.0 * v0 * r - 3.0 * a0 * r2) / (2.0 * r3),
            c4: (-30.0 * pf + 16.0 * v0 * r + 3.0 * a0 * r2) / (2.0 * r3 * r),
            c5: (12.0 * pf - 6.0 * v0 * r - a0 * r2) / (2.0 * r3 * r2),
        }
    }

    fn position(&self, t: f64) -> f64 {
        t * (self.c1 + t * (self.c2 + t * (self.c3 + t * (self.c4 + t * self.c5))))
    }

    fn velocity(&self, t: f64) -> f64 {
        self.c1 + t * (2.0 * self.c2 + t * (3.0 * self.c3 + t * (4.0 * self.c4 + t * 5.0 * self.c5)))
    }

    fn acceleration(&self, t: f64) -> f64 {
        2.0 * self.c2 + t * (6.0 * self.c3 + t * (12.0 * self.c4 + t * 20.0 * self.c5))
    }
}

/// Minimum-jerk 速度控制器
///
/// 维度在编译期确定（颈部、眼睛各 3 维）。`elapsed` 累加器由调用方通过
/// [`reset`](Self::reset) 清零（重新激活、恢复运行时）。
#[derive(Debug, Clone)]
pub struct MinJerkController<const N: usize> {
    period: f64,
    retarget_threshold: f64,
    elapsed: f64,
    velocity: SVector<f64, N>,
    acceleration: SVector<f64, N>,
    last_error: Option<SVector<f64, N>>,
    last_command: SVector<f64, N>,
}

impl<const N: usize> MinJerkController<N> {
    /// 创建控制器
    ///
    /// `period` 为控制周期（秒），`retarget_threshold` 为误差偏离预测轨迹时
    /// 触发重规划的阈值（无穷范数，弧度）。
    pub fn new(period: f64, retarget_threshold: f64) -> Self {
        Self {
            period,
            retarget_threshold,
            elapsed: 0.0,
            velocity: SVector::zeros(),
            acceleration: SVector::zeros(),
            last_error: None,
            last_command: SVector::zeros(),
        }
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// 当前轨迹已执行的时间
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// 计算速度指令
    pub fn compute_command(
        &mut self,
        execution_time: f64,
        error: &SVector<f64, N>,
    ) -> SVector<f64, N> {
        if let Some(prev) = self.last_error {
            let predicted = prev - self.last_command * self.period;
            if (error - predicted).amax() > self.retarget_threshold {
                self.elapsed = 0.0;
            }
        }

        let command = if !execution_time.is_finite() || execution_time <= 0.0 {
            self.velocity.fill(0.0);
            self.acceleration.fill(0.0);
            self.elapsed += self.period;
            error / self.period
        } else {
            let ts = self.period;
            let mut remaining = execution_time - self.elapsed;
            if remaining <= 0.0 {
                self.elapsed = 0.0;
                remaining = execution_time;
            }
            // 不足 1.5 个周期时，最后一段恰好一个周期
            let last = remaining < 1.5 * ts;
            let horizon = if last { ts } else { remaining };
            let mut command = SVector::zeros();
            for i in 0..N {
                let coeffs =
                    QuinticCoeffs::solve(self.velocity[i], self.acceleration[i], error[i], horizon);
                command[i] = coeffs.position(ts) / ts;
                self.velocity[i] = coeffs.velocity(ts);
                self.acceleration[i] = coeffs.acceleration(ts);
            }
            // 轨迹到期，下一周期重新规划
            self.elapsed = if last { execution_time } else { self.elapsed + ts };
            command
        };
        self.last_error = Some(*error);
        self.last_command = command;
        command
    }

    /// 重置累加器与轨迹状态
    ///
    /// `current_error` 作为下一周期重规划检测的基准。
    pub fn reset(&mut self, current_error: &SVector<f64, N>) {
        self.elapsed = 0.0;
        self.velocity.fill(0.0);
        self.acceleration.fill(0.0);
        self.last_error = Some(*current_error);
        self.last_command.fill(0.0);
    }
}
