use fsguard::config::MonitorConfig;
use fsguard::monitor::{FsStat, SpaceMonitor, SpaceState, Statvfs};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[test]
fn root_can_be_queried() {
    let usage = Statvfs.stat(Path::new("/")).unwrap();
    assert!(usage.block_size > 0);
    assert!(usage.blocks_available <= usage.blocks);
}

#[test]
fn missing_path_is_unknown() {
    let (send, recv) = mpsc::channel();
    let config = MonitorConfig {
        path: PathBuf::from("/fsguard/does/not/exist"),
        ..MonitorConfig::default()
    };
    let mut monitor = SpaceMonitor::new(config, send);

    let sample = monitor.sample();
    assert!(!sample.ok);
    assert_eq!(sample.state, SpaceState::Unknown);
    assert_eq!(
        sample.tooltip,
        "could not check mountpoint /fsguard/does/not/exist, please check your config"
    );
    assert!(recv.try_recv().is_err());
}

#[test]
fn temp_dir_sample_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let (send, _recv) = mpsc::channel();
    let config = MonitorConfig {
        path: dir.path().to_path_buf(),
        ..MonitorConfig::default()
    };
    let mut monitor = SpaceMonitor::new(config, send);

    let first = monitor.sample();
    assert!(first.ok);
    assert!(first.total_mb >= first.free_mb);
    assert!((0.0..=1.0).contains(&first.free_fraction));
    assert_eq!(first.total_text, monitor.sample().total_text);
}
