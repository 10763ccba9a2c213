//! Full poll-cycle scenarios against a scripted poller.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use trafmon::core::engine::{run_cycle, CycleOptions};
use trafmon::core::lock::CycleLock;
use trafmon::core::store::Store;
use trafmon::core::threshold::{AlertTarget, ListKind, Threshold};
use trafmon::core::Severity;

use super::support::{sample, RecordingNotifier, ScriptedPoller};

const DIRECT: CycleOptions = CycleOptions {
    observe_only: false,
    report: false,
    summarize: false,
};

const CHECK: CycleOptions = CycleOptions {
    observe_only: false,
    report: true,
    summarize: false,
};

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("counters.json")
}

fn seed_store(path: &Path, thresholds: &[(ListKind, f64, u32, AlertTarget)]) {
    let mut store = Store::default();
    store.register_interface("router1", "eth0", 2);
    for (kind, rate, hits, target) in thresholds {
        store
            .add_threshold(
                "router1",
                "eth0",
                *kind,
                Threshold::new(*rate, *hits, target.clone()),
            )
            .unwrap();
    }
    store.save(path).unwrap();
}

fn hosts() -> Vec<String> {
    vec!["router1".to_string()]
}

#[test]
fn test_first_poll_establishes_baseline_without_alerting() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(
        &path,
        &[(ListKind::MaxIn, 1.0, 1, AlertTarget::Email("noc@example.com".into()))],
    );

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    let notifier = RecordingNotifier::new();

    let outcome = run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();
    assert_eq!(outcome.hosts_polled, 1);
    assert_eq!(outcome.notifications_sent, 0);
    assert_eq!(notifier.count(), 0);

    let store = Store::load(&path).unwrap();
    let iface = &store.host("router1").unwrap().interfaces["eth0"];
    assert_eq!(iface.last_in, Some(1000));
    assert_eq!(iface.last_out, Some(2000));
    assert_eq!(store.host("router1").unwrap().uptime, Some(100));
}

#[test]
fn test_second_poll_computes_documented_rates() {
    // Baseline (1000, 2000) at tick 100; second poll (1500, 2600) at tick
    // 200 is one elapsed second: inRate 500, outRate 600.
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(
        &path,
        &[
            (ListKind::MaxIn, 450.0, 1, AlertTarget::Email("noc@example.com".into())),
            (ListKind::MaxOut, 550.0, 1, AlertTarget::Email("noc@example.com".into())),
        ],
    );

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    poller.push_sample("router1", sample(200, &[(2, 1500, 2600)]));
    let notifier = RecordingNotifier::new();

    run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();
    let outcome = run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();

    assert_eq!(outcome.notifications_sent, 2);
    let sent = notifier.sent.lock().unwrap();
    assert!(sent[0].2.contains("500 B/s"));
    assert!(sent[1].2.contains("600 B/s"));
}

#[test]
fn test_debounce_fires_once_then_resets() {
    // max-in 300 B/s, 2 consecutive hits; rates 400, 450, 100 across three
    // evaluated polls: dispatch exactly once (second poll), reset on third.
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(
        &path,
        &[(ListKind::MaxIn, 300.0, 2, AlertTarget::Email("noc@example.com".into()))],
    );

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 0)]));
    poller.push_sample("router1", sample(200, &[(2, 1400, 0)])); // 400 B/s
    poller.push_sample("router1", sample(300, &[(2, 1850, 0)])); // 450 B/s
    poller.push_sample("router1", sample(400, &[(2, 1950, 0)])); // 100 B/s
    let notifier = RecordingNotifier::new();

    for _ in 0..4 {
        run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();
    }

    assert_eq!(notifier.count(), 1);
    let sent = notifier.sent.lock().unwrap();
    assert!(sent[0].2.contains("Consecutive polls: 2"));
    drop(sent);

    let store = Store::load(&path).unwrap();
    let iface = &store.host("router1").unwrap().interfaces["eth0"];
    assert_eq!(iface.hits.get(ListKind::MaxIn), 0);
}

#[test]
fn test_uptime_decrease_rebaselines_without_alerting() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(
        &path,
        &[(ListKind::MaxIn, 1.0, 1, AlertTarget::Email("noc@example.com".into()))],
    );

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(1000, &[(2, 1000, 0)]));
    // Device rebooted: uptime went backwards, counters restarted much higher
    // in relative terms. No alert regardless of values.
    poller.push_sample("router1", sample(50, &[(2, 999_999, 0)]));
    let notifier = RecordingNotifier::new();

    run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();
    run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();

    assert_eq!(notifier.count(), 0);
    let store = Store::load(&path).unwrap();
    let record = store.host("router1").unwrap();
    assert_eq!(record.uptime, Some(50));
    assert_eq!(record.interfaces["eth0"].last_in, Some(999_999));
}

#[test]
fn test_check_mode_reports_every_crossing_poll() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(&path, &[(ListKind::MaxIn, 300.0, 5, AlertTarget::Critical)]);

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 0)]));
    poller.push_sample("router1", sample(200, &[(2, 1400, 0)]));
    poller.push_sample("router1", sample(300, &[(2, 1800, 0)]));
    let notifier = RecordingNotifier::new();

    run_cycle(&path, &hosts(), &mut poller, &notifier, &CHECK).unwrap();

    // Debounce is far from required_hits, yet every crossing poll reports.
    for _ in 0..2 {
        let outcome = run_cycle(&path, &hosts(), &mut poller, &notifier, &CHECK).unwrap();
        let report = outcome.report.unwrap();
        assert_eq!(report.severity, Severity::Critical);
        assert!(report.render().contains("router1/eth0"));
    }
    assert_eq!(notifier.count(), 0);
}

#[test]
fn test_check_mode_summarize_lists_quiet_interfaces() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(&path, &[(ListKind::MaxIn, 1_000_000.0, 1, AlertTarget::Warning)]);

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    poller.push_sample("router1", sample(200, &[(2, 1500, 2600)]));
    let notifier = RecordingNotifier::new();

    let summarize = CycleOptions {
        summarize: true,
        ..CHECK
    };
    run_cycle(&path, &hosts(), &mut poller, &notifier, &summarize).unwrap();
    let outcome = run_cycle(&path, &hosts(), &mut poller, &notifier, &summarize).unwrap();

    let report = outcome.report.unwrap();
    assert_eq!(report.severity, Severity::Normal);
    let rendered = report.render();
    assert!(rendered.contains("router1/eth0"));
    assert!(rendered.contains("ok"));
}

#[test]
fn test_unreachable_host_escalates_but_others_complete() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let mut store = Store::default();
    store.register_interface("router1", "eth0", 2);
    store.register_interface("router2", "eth0", 3);
    store.save(&path).unwrap();

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    poller.mark_unreachable("router2");
    let notifier = RecordingNotifier::new();

    let hosts = vec!["router1".to_string(), "router2".to_string()];
    let outcome = run_cycle(&path, &hosts, &mut poller, &notifier, &CHECK).unwrap();

    assert_eq!(outcome.hosts_polled, 1);
    assert_eq!(outcome.hosts_failed, 1);
    let report = outcome.report.unwrap();
    assert_eq!(report.severity, Severity::Warning);
    assert!(report.render().contains("router2 unreachable"));

    // The reachable host's baseline was stored; the failed host's record is
    // untouched.
    let store = Store::load(&path).unwrap();
    assert_eq!(
        store.host("router1").unwrap().interfaces["eth0"].last_in,
        Some(1000)
    );
    assert_eq!(store.host("router2").unwrap().uptime, None);
}

#[test]
fn test_observe_only_never_persists() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(&path, &[]);
    let before = std::fs::read_to_string(&path).unwrap();

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    let notifier = RecordingNotifier::new();

    let observe = CycleOptions {
        observe_only: true,
        ..DIRECT
    };
    run_cycle(&path, &hosts(), &mut poller, &notifier, &observe).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_busy_lock_aborts_cycle_without_mutation() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(&path, &[]);
    let before = std::fs::read_to_string(&path).unwrap();

    let held = CycleLock::acquire(&CycleLock::path_for_store(&path)).unwrap();

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    let notifier = RecordingNotifier::new();

    let err = run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap_err();
    assert!(err.is_lock_busy());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    held.release();
    assert!(run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).is_ok());
}

#[test]
fn test_reset_then_poll_is_baseline_only() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(
        &path,
        &[(ListKind::MaxIn, 1.0, 1, AlertTarget::Email("noc@example.com".into()))],
    );

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 0)]));
    poller.push_sample("router1", sample(200, &[(2, 999_000, 0)]));
    let notifier = RecordingNotifier::new();

    run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();

    // Reset between polls: stored counters discarded, thresholds kept.
    let mut store = Store::load(&path).unwrap();
    store.reset_counters(None).unwrap();
    store.save(&path).unwrap();

    run_cycle(&path, &hosts(), &mut poller, &notifier, &DIRECT).unwrap();

    assert_eq!(notifier.count(), 0);
    let store = Store::load(&path).unwrap();
    let iface = &store.host("router1").unwrap().interfaces["eth0"];
    assert_eq!(iface.last_in, Some(999_000));
    assert_eq!(iface.max_in.len(), 1);
}

#[test]
fn test_unregistered_host_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    seed_store(&path, &[]);

    let mut poller = ScriptedPoller::new();
    poller.push_sample("router1", sample(100, &[(2, 1000, 2000)]));
    let notifier = RecordingNotifier::new();

    let hosts = vec!["router1".to_string(), "ghost".to_string()];
    let outcome = run_cycle(&path, &hosts, &mut poller, &notifier, &CHECK).unwrap();

    assert_eq!(outcome.hosts_polled, 1);
    let report = outcome.report.unwrap();
    assert_eq!(report.severity, Severity::Warning);
    assert!(report.render().contains("ghost not registered"));
}
