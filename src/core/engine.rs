//! One poll cycle: lock, load, poll, evaluate, dispatch, persist.
//!
//! Execution is single threaded; concurrency only exists between whole
//! processes contending for the same store file, which the cycle lock
//! serializes. A cycle either completes fully (evaluate every host, persist,
//! release the lock) or aborts before touching anything when the lock is
//! busy. Per-host poll failures are isolated: the host is skipped, its
//! stored baseline stays intact, and the remaining hosts still complete.

use std::path::Path;

use crate::core::dispatch::{Dispatcher, Report};
use crate::core::lock::CycleLock;
use crate::core::notify::Notifier;
use crate::core::poller::Poller;
use crate::core::rate::rate;
use crate::core::store::Store;
use crate::core::threshold::evaluate_interface;
use crate::error::Result;

/// Process-mode switches relevant to a single cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Compute and report but never persist updated counters or debounce
    /// state; used to inspect state without disturbing another consumer's
    /// baseline.
    pub observe_only: bool,
    /// Aggregated-report mode: crossings accumulate into one severity +
    /// message pair instead of dispatching individually.
    pub report: bool,
    /// Aggregated sub-mode: include a line per interface even absent any
    /// crossing.
    pub summarize: bool,
}

/// What one cycle produced.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Present in aggregated-report mode.
    pub report: Option<Report>,
    pub hosts_polled: usize,
    pub hosts_failed: usize,
    pub notifications_sent: usize,
}

/// Run one full poll cycle against the given hosts.
///
/// Fails with `LockBusy` without touching the store when another invocation
/// holds the lock, and with `StoreCorrupt` before evaluating anything when
/// the persisted state cannot be trusted.
pub fn run_cycle(
    store_path: &Path,
    hosts: &[String],
    poller: &mut dyn Poller,
    notifier: &dyn Notifier,
    options: &CycleOptions,
) -> Result<CycleOutcome> {
    let lock = CycleLock::acquire(&CycleLock::path_for_store(store_path))?;

    let mut store = Store::load(store_path)?;
    let mut dispatcher = if options.report {
        Dispatcher::aggregated(notifier, options.summarize)
    } else {
        Dispatcher::direct(notifier)
    };

    let mut hosts_polled = 0;
    let mut hosts_failed = 0;

    for host in hosts {
        match evaluate_host(&mut store, host, poller, &mut dispatcher) {
            HostResult::Polled => hosts_polled += 1,
            HostResult::Skipped => hosts_failed += 1,
        }
    }

    if !options.observe_only {
        store.save(store_path)?;
    }
    lock.release();

    let (report, notifications_sent) = dispatcher.finish();
    Ok(CycleOutcome {
        report,
        hosts_polled,
        hosts_failed,
        notifications_sent,
    })
}

enum HostResult {
    Polled,
    Skipped,
}

fn evaluate_host(
    store: &mut Store,
    host: &str,
    poller: &mut dyn Poller,
    dispatcher: &mut Dispatcher<'_>,
) -> HostResult {
    let Some(record) = store.hosts.get_mut(host) else {
        dispatcher.host_unregistered(host);
        return HostResult::Skipped;
    };

    let indices: Vec<u32> = record.interfaces.values().map(|i| i.index).collect();
    let sample = match poller.poll(host, &indices) {
        Ok(sample) => sample,
        Err(e) => {
            dispatcher.host_unreachable(host, &e.to_string());
            return HostResult::Skipped;
        }
    };

    // Elapsed device time since the previous poll. No stored uptime (first
    // poll, or after reset) forces re-baselining, as does a device restart
    // observed as a non-positive delta.
    let elapsed_ticks = match record.uptime {
        Some(prev) => sample.uptime_ticks as i64 - prev as i64,
        None => 0,
    };
    record.uptime = Some(sample.uptime_ticks);

    for (name, iface) in record.interfaces.iter_mut() {
        let Some(counters) = sample.counters.get(&iface.index) else {
            // Device answered but not for this index; leave its baseline
            // alone rather than record counters we did not see.
            log::warn!("host {} returned no counters for {} (index {})", host, name, iface.index);
            continue;
        };

        let in_rate = rate(iface.last_in, counters.in_octets, elapsed_ticks);
        let out_rate = rate(iface.last_out, counters.out_octets, elapsed_ticks);

        let evaluation =
            evaluate_interface(iface, in_rate, out_rate, dispatcher.report_mode());
        log::debug!(
            "{}/{}: in={:?} out={:?} B/s, crossed in={} out={}",
            host,
            name,
            in_rate,
            out_rate,
            evaluation.in_flagged,
            evaluation.out_flagged
        );
        for crossing in &evaluation.crossings {
            dispatcher.dispatch(host, name, crossing);
        }
        if evaluation.crossings.is_empty() {
            dispatcher.interface_quiet(host, name, in_rate, out_rate);
        }

        iface.last_in = Some(counters.in_octets);
        iface.last_out = Some(counters.out_octets);
    }

    HostResult::Polled
}
