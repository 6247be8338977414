//! 驱动层错误类型定义

use gaze_control::ControlError;
use gaze_kinematics::KinematicsError;
use thiserror::Error;

/// 设备（执行器/编码器）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// 读取反馈超时
    #[error("Feedback read timeout")]
    Timeout,

    /// 反馈数据非法（长度错误、NaN 等）
    #[error("Malformed feedback: {0}")]
    Malformed(String),

    /// 底层通信错误
    #[error("Device I/O error: {0}")]
    Io(String),
}

/// 配置错误（构造阶段致命）
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 字段取值非法
    #[error("Invalid configuration value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// 选择了硬件限位，但后端不是物理设备
    #[error("Bounds source `hardware` requires a physical backend")]
    HardwareBoundsUnavailable,

    /// 硬件未上报关节限位
    #[error("Hardware did not report joint limits")]
    MissingHardwareLimits,

    /// TOML 解析失败
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// 读取配置文件失败
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// 注视控制器顶层错误
#[derive(Error, Debug)]
pub enum GazeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// 控制线程已启动
    #[error("Control loop already started")]
    AlreadyStarted,

    /// 控制线程未运行
    #[error("Control loop is not running")]
    NotRunning,

    /// 控制线程启动失败
    #[error("Failed to spawn control thread: {0}")]
    ThreadSpawn(String),

    /// 等待控制线程响应超时
    #[error("Timed out waiting for the control thread")]
    Timeout,
}
