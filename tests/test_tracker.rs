//! Tracker wiring and lifecycle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{eventually, pull, register, tracker, Reply, ScriptedRemoting, TestChannel};
use jobtracker::{
    Channel, ExecutableJobQueue, Job, JobTracker, NoopStats, ResponseCode, TrackerConfig,
};

#[test]
fn test_build_requires_remoting() {
    let err = JobTracker::builder()
        .with_config(TrackerConfig::development())
        .build()
        .err()
        .unwrap();
    assert_eq!(err.category(), "configuration");
}

#[test]
fn test_build_validates_config() {
    let config = TrackerConfig {
        push_pool_size: 0,
        ..TrackerConfig::development()
    };
    let result = JobTracker::builder()
        .with_config(config)
        .with_remoting(ScriptedRemoting::new(Reply::Accept))
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_sweep_evicts_closed_connections() {
    let tracker = tracker(ScriptedRemoting::new(Reply::Accept));
    let live = TestChannel::open(1);
    let dead = TestChannel::open(2);
    let live_dyn: Arc<dyn Channel> = live.clone();
    let dead_dyn: Arc<dyn Channel> = dead.clone();
    tracker.handle(&live_dyn, common::heartbeat("g", "tt-1")).await;
    tracker.handle(&dead_dyn, common::heartbeat("g", "tt-2")).await;

    tracker.start();
    tracker.start();
    dead.close();

    assert!(eventually(Duration::from_secs(2), || tracker.registry().len() == 1).await);
    assert!(tracker.registry().lookup("g", "tt-1").is_some());

    tracker.shutdown().await;
    assert!(tracker.is_shutdown());
}

#[tokio::test]
async fn test_reconnect_after_eviction() {
    let tracker = JobTracker::builder()
        .with_config(TrackerConfig::development())
        .with_remoting(ScriptedRemoting::new(Reply::Accept))
        .with_stats(Arc::new(NoopStats))
        .build()
        .unwrap();
    let first = TestChannel::open(1);
    let first_dyn: Arc<dyn Channel> = first.clone();
    tracker.handle(&first_dyn, common::heartbeat("g", "tt-1")).await;
    first.close();
    assert_eq!(tracker.registry().evict_closed(), 1);

    // Any message re-registers the worker
    register(&tracker, 2, "g", "tt-1").await;
    assert_eq!(tracker.registry().lookup("g", "tt-1").unwrap().channel().id(), 2);
}

#[tokio::test]
async fn test_no_push_after_shutdown() {
    let remoting = ScriptedRemoting::new(Reply::Accept);
    let tracker = tracker(remoting.clone());
    let channel = register(&tracker, 1, "g", "tt-1").await;
    tracker
        .executable_queue()
        .add(Job::new("t", "g").with_id("j1"))
        .unwrap();

    tracker.shutdown().await;
    let response = tracker.handle(&channel, pull("g", "tt-1", 1, 1)).await;
    assert!(response.is(ResponseCode::JobPullSuccess));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(remoting.attempts(), 0);
    assert_eq!(tracker.executable_queue().count("g"), 1);
}

#[tokio::test]
async fn test_yaml_config_drives_tracker() -> anyhow::Result<()> {
    let config = TrackerConfig::from_yaml_str(
        "node_group: tracker_a\nidentity: jt-1\npush_pool_size: 2\npush_latch_timeout: 150\n",
    )?;
    assert_eq!(config.push_latch_timeout, Duration::from_millis(150));

    let tracker = JobTracker::builder()
        .with_config(config)
        .with_remoting(ScriptedRemoting::new(Reply::Accept))
        .build()?;
    assert_eq!(tracker.config().identity, "jt-1");
    assert_eq!(tracker.config().push_pool_size, 2);
    Ok(())
}
