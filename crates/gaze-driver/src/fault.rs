//! 故障上报通道
//!
//! 构造时显式传入（没有全局标志）。每条通知同时写入日志（`error!`）与可选的
//! crossbeam 通道，通道满或断开时只丢弃通知，不影响控制线程。

use crate::error::DeviceError;
use crossbeam_channel::Sender;
use std::fmt;
use tracing::error;

/// 故障类型
#[derive(Debug, Clone, PartialEq)]
pub enum FaultKind {
    /// 周期内读取反馈失败，控制循环已挂起
    FeedbackLost(DeviceError),
    /// 恢复运行时重新读取反馈失败，控制循环保持挂起
    ResumeFailed(DeviceError),
}

/// 故障通知
#[derive(Debug, Clone, PartialEq)]
pub struct FaultNotice {
    /// 发生故障时的周期序号
    pub cycle: u64,
    pub kind: FaultKind,
}

impl fmt::Display for FaultNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FaultKind::FeedbackLost(e) => write!(
                f,
                "cycle {}: communication timeout detected ({}), controller suspended",
                self.cycle, e
            ),
            FaultKind::ResumeFailed(e) => write!(
                f,
                "cycle {}: failed to re-acquire feedback on resume ({}), controller stays suspended",
                self.cycle, e
            ),
        }
    }
}

/// 故障上报器
#[derive(Debug, Clone, Default)]
pub struct FaultReporter {
    tx: Option<Sender<FaultNotice>>,
}

impl FaultReporter {
    pub fn new(tx: Sender<FaultNotice>) -> Self {
        Self { tx: Some(tx) }
    }

    /// 只写日志
    pub fn log_only() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, notice: FaultNotice) {
        error!("{}", notice);
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_is_one_line() {
        let notice = FaultNotice {
            cycle: 42,
            kind: FaultKind::FeedbackLost(DeviceError::Timeout),
        };
        let line = notice.to_string();
        assert!(line.contains("cycle 42"));
        assert!(line.contains("suspended"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_report_forwards_to_channel() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let reporter = FaultReporter::new(tx);
        let notice = FaultNotice {
            cycle: 1,
            kind: FaultKind::ResumeFailed(DeviceError::Io("bus off".to_string())),
        };
        reporter.report(notice.clone());
        // 通道已满：丢弃而不阻塞
        reporter.report(notice.clone());
        assert_eq!(rx.try_recv().unwrap(), notice);
        assert!(rx.try_recv().is_err());

        FaultReporter::log_only().report(notice);
    }
}
