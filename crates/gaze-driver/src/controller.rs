//! 注视控制器句柄（对外 API）
//!
//! [`GazeController`] 持有共享上下文与工作线程：
//!
//! - 工作线程独占 [`ControlLoop`]，按绝对时间锚点周期运行（消除累积漂移）
//! - 挂起 / 恢复 / 停止通过命令通道下发，只在周期边界生效
//! - 位姿、注视点、状态查询直接读共享上下文，可在任意线程并发调用
//!
//! Drop 时自动停止工作线程（带超时的 join）。

use crate::control_loop::ControlLoop;
use crate::error::GazeError;
use crate::metrics::{ControlMetrics, MetricsSnapshot};
use crate::state::{ControlContext, CycleSnapshot, LoopState};
use crate::target::GazeTarget;
use crate::telemetry::{FixationSample, JointSample};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use gaze_kinematics::{HEAD_JOINTS, HeadVector, Pose, RAD2DEG};
use nalgebra::Vector3;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 工作线程 join 超时
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result.map(|_| ()),
            Err(RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "control thread join timeout",
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "control thread panicked during join",
            ))),
        }
    }
}

/// 监督命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Suspend,
    Resume,
    Stop,
}

struct Envelope {
    request: Request,
    reply: Sender<Result<(), GazeError>>,
}

/// 工作线程主循环
fn run_worker(
    mut control: ControlLoop,
    requests: Receiver<Envelope>,
    ready: Sender<()>,
    realtime: bool,
) {
    #[cfg(feature = "realtime")]
    if realtime {
        use thread_priority::*;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => info!("Control thread priority set to MAX (realtime)"),
            Err(e) => warn!(
                "Failed to set control thread priority: {}. \
                 On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                e
            ),
        }
    }
    #[cfg(not(feature = "realtime"))]
    if realtime {
        warn!("Realtime priority requested but the `realtime` feature is disabled");
    }

    control.start();
    let _ = ready.send(());

    let period = control.period();
    let ctx = Arc::clone(control.context());
    let mut next_tick = Instant::now();

    'run: loop {
        // 周期边界：处理所有待处理命令；挂起期间阻塞等待
        loop {
            let envelope = if control.state() == LoopState::Suspended {
                match requests.recv() {
                    Ok(envelope) => envelope,
                    Err(_) => break 'run,
                }
            } else {
                match requests.try_recv() {
                    Ok(envelope) => envelope,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break 'run,
                }
            };

            let result = match envelope.request {
                Request::Suspend => {
                    control.suspend();
                    Ok(())
                }
                Request::Resume => {
                    let result = control.resume().map_err(GazeError::from);
                    // 恢复成功才重新对齐时间基准
                    if result.is_ok() {
                        next_tick = Instant::now();
                    }
                    result
                }
                Request::Stop => {
                    control.release();
                    let _ = envelope.reply.send(Ok(()));
                    break 'run;
                }
            };
            let _ = envelope.reply.send(result);
        }

        next_tick += period;
        control.cycle();

        let now = Instant::now();
        if next_tick > now {
            spin_sleep::sleep(next_tick - now);
        } else {
            ControlMetrics::incr(&ctx.metrics.overruns);
            warn!(
                "Control loop overrun: cycle took {:?} longer than the {:?} period",
                now.duration_since(next_tick),
                period
            );
            next_tick = now;
        }
    }

    control.release();
}

/// 注视控制器
pub struct GazeController {
    ctx: Arc<ControlContext>,
    /// 尚未启动的控制循环
    pending: Option<ControlLoop>,
    requests: Option<Sender<Envelope>>,
    worker: Option<JoinHandle<()>>,
    realtime: bool,
    reply_timeout: Duration,
}

impl GazeController {
    pub(crate) fn new(control: ControlLoop, realtime: bool, reply_timeout: Duration) -> Self {
        Self {
            ctx: Arc::clone(control.context()),
            pending: Some(control),
            requests: None,
            worker: None,
            realtime,
            reply_timeout,
        }
    }

    /// 启动工作线程（INIT -> RUNNING），等待线程就绪
    pub fn start(&mut self) -> Result<(), GazeError> {
        let control = self.pending.take().ok_or(GazeError::AlreadyStarted)?;
        let (tx, rx) = bounded(16);
        let (ready_tx, ready_rx) = bounded(1);
        let realtime = self.realtime;

        let handle = std::thread::Builder::new()
            .name("gaze-control".to_string())
            .spawn(move || run_worker(control, rx, ready_tx, realtime))
            .map_err(|e| GazeError::ThreadSpawn(e.to_string()))?;
        self.requests = Some(tx);
        self.worker = Some(handle);

        ready_rx
            .recv_timeout(self.reply_timeout)
            .map_err(|_| GazeError::Timeout)?;
        info!("Gaze controller started successfully");
        Ok(())
    }

    /// 停止工作线程（最终停机，进入 RELEASED）
    pub fn stop(&mut self) -> Result<(), GazeError> {
        if let Some(mut control) = self.pending.take() {
            control.release();
            return Ok(());
        }

        let result = self.request(Request::Stop);
        self.requests = None;
        if let Some(handle) = self.worker.take()
            && let Err(e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            warn!("Control thread did not exit cleanly within {:?}: {:?}", JOIN_TIMEOUT, e);
        }
        result
    }

    /// 挂起（延迟停机，不再执行周期直到恢复）
    pub fn suspend(&self) -> Result<(), GazeError> {
        self.request(Request::Suspend)
    }

    /// 恢复（重新读取反馈，重置积分器与速度控制器）
    pub fn resume(&self) -> Result<(), GazeError> {
        self.request(Request::Resume)
    }

    fn request(&self, request: Request) -> Result<(), GazeError> {
        let tx = self.requests.as_ref().ok_or(GazeError::NotRunning)?;
        let (reply_tx, reply_rx) = bounded(1);
        tx.send(Envelope {
            request,
            reply: reply_tx,
        })
        .map_err(|_| GazeError::NotRunning)?;

        match reply_rx.recv_timeout(self.reply_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(GazeError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(GazeError::NotRunning),
        }
    }

    pub fn state(&self) -> LoopState {
        self.ctx.loop_state()
    }

    /// 是否到位（控制器处于 IDLE）
    pub fn is_motion_done(&self) -> bool {
        !self.ctx.is_active()
    }

    /// 设置跟踪锁定模式
    ///
    /// 开启时以当前注视点作为期望注视点。
    pub fn set_tracking_mode(&self, enabled: bool) {
        self.ctx.tracking_locked.store(enabled, Ordering::Release);
        if enabled {
            let fixation = self.ctx.kinematics.lock().fixation_point();
            match fixation {
                Ok(fp) => self.ctx.target.set_fixation(fp),
                Err(e) => warn!("Tracking mode enabled without a fixation point: {}", e),
            }
        }
        info!("Tracking mode {}", if enabled { "on" } else { "off" });
    }

    pub fn tracking_mode(&self) -> bool {
        self.ctx.is_tracking_locked()
    }

    pub fn neck_time(&self) -> f64 {
        self.ctx.timing().neck_time()
    }

    pub fn eyes_time(&self) -> f64 {
        self.ctx.timing().eyes_time()
    }

    /// 设置颈部执行时间，返回实际生效的值（可能被夹紧）
    pub fn set_neck_time(&self, execution_time: f64) -> f64 {
        self.ctx.timing.lock().set_neck_time(execution_time)
    }

    /// 设置眼睛执行时间，返回实际生效的值（可能被夹紧）
    pub fn set_eyes_time(&self, execution_time: f64) -> f64 {
        self.ctx.timing.lock().set_eyes_time(execution_time)
    }

    /// 查询位姿（"left" / "right" / "head"）
    pub fn pose(&self, selector: &str) -> Result<Pose, GazeError> {
        Ok(self.ctx.kinematics.lock().pose(selector)?)
    }

    /// 当前注视点
    pub fn fixation_point(&self) -> Result<Vector3<f64>, GazeError> {
        Ok(self.ctx.kinematics.lock().fixation_point()?)
    }

    /// 发布新的控制目标（逆运动学求解器调用）
    pub fn set_target(&self, qd: HeadVector, xd: Vector3<f64>) {
        self.ctx.target.publish(qd, xd);
    }

    /// 设置眼睛补偿速度（弧度/秒）
    pub fn set_counter_velocity(&self, counter_velocity: Vector3<f64>) {
        self.ctx.target.set_counter_velocity(counter_velocity);
    }

    pub fn target(&self) -> Arc<GazeTarget> {
        self.ctx.target.load()
    }

    /// 期望头部关节（度）
    pub fn desired_deg(&self) -> [f64; HEAD_JOINTS] {
        let qd = self.ctx.target.load().qd;
        std::array::from_fn(|i| qd[i] * RAD2DEG)
    }

    /// 最近一次速度指令（度/秒）
    pub fn velocity_deg(&self) -> [f64; HEAD_JOINTS] {
        self.ctx.snapshot().velocity_deg
    }

    pub fn snapshot(&self) -> Arc<CycleSnapshot> {
        self.ctx.snapshot()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn subscribe_fixation(&self) -> Receiver<FixationSample> {
        self.ctx.telemetry.subscribe_fixation()
    }

    pub fn subscribe_joints(&self) -> Receiver<JointSample> {
        self.ctx.telemetry.subscribe_joints()
    }

    pub fn context(&self) -> &Arc<ControlContext> {
        &self.ctx
    }
}

impl Drop for GazeController {
    fn drop(&mut self) {
        if self.requests.is_some()
            && let Err(e) = self.stop()
        {
            warn!("Failed to stop gaze controller on drop: {}", e);
        }
    }
}

impl std::fmt::Debug for GazeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GazeController")
            .field("state", &self.state())
            .field("started", &self.worker.is_some())
            .field("ctx", &self.ctx)
            .finish()
    }
}
