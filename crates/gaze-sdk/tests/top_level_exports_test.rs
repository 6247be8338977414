//! 顶层导出测试
//!
//! 验证核心类型可以从 `gaze_sdk` 与 prelude 直接导入，且 facade 可以驱动一次完整的控制周期。

use gaze_sdk::prelude::*;
use gaze_sdk::{control, driver, kinematics};
use nalgebra::Vector3;

#[test]
fn test_top_level_exports() {
    let _builder: GazeControllerBuilder = gaze_sdk::GazeControllerBuilder::default();
    let _error: GazeError = GazeError::NotRunning;
    let _device: DeviceError = DeviceError::Timeout;
    let _kinematics: KinematicsError = KinematicsError::ParallelAxes;
    let _selector: ChainSelector = "left".parse().unwrap();

    assert_eq!(kinematics::HEAD_JOINTS, 6);
    assert_eq!(control::GROUP_JOINTS, 3);
    assert_eq!(driver::JOINT_SAMPLE_LEN, 9);
}

#[test]
fn test_prelude_drives_simulated_loop() {
    let mut control = GazeControllerBuilder::new(GazeConfig::default())
        .backend(Simulated::new())
        .build_loop()
        .unwrap();
    control.start();

    let ctx = control.context().clone();
    let mut qd = ctx.target.load().qd;
    qd[2] += 0.1;
    ctx.target.publish(qd, Vector3::new(1.0, 0.1, 0.35));

    control.cycle();
    assert!(ctx.is_active());
    assert_eq!(control.state(), LoopState::Running);
}

#[test]
fn test_init_logging_twice() {
    assert!(gaze_sdk::init_logging("gaze_driver=debug").is_ok());
    assert!(gaze_sdk::init_logging("gaze_driver=debug").is_err());
}
