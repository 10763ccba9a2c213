//! `trafmon poll` - direct-notification poll cycles, optionally looping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::engine::{run_cycle, CycleOptions, CycleOutcome};
use crate::core::notify::{MailConfig, MailNotifier};
use crate::core::poller::SnmpPoller;
use crate::error::TrafmonError;

use super::{hosts_from, store_path_from};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let hosts = hosts_from(matches);
    let store_path = store_path_from(matches)?;
    let community = matches.get_one::<String>("community").unwrap();
    let interval = matches.get_one::<u64>("interval").copied();
    let observe_only = matches.get_flag("observe");

    let mut poller = SnmpPoller::new(community)?;
    let notifier = MailNotifier::new(MailConfig::from_env());
    let options = CycleOptions {
        observe_only,
        report: false,
        summarize: false,
    };

    match interval {
        None => {
            match run_cycle(&store_path, &hosts, &mut poller, &notifier, &options) {
                Ok(outcome) => print_outcome(&outcome, observe_only),
                Err(e) if e.is_lock_busy() => print_lock_busy(),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
        Some(secs) => run_loop(
            secs,
            &store_path,
            &hosts,
            &mut poller,
            &notifier,
            &options,
        ),
    }
}

fn run_loop(
    interval_secs: u64,
    store_path: &std::path::Path,
    hosts: &[String],
    poller: &mut SnmpPoller,
    notifier: &MailNotifier,
    options: &CycleOptions,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("{}", "Stopping after the current cycle...".yellow().bold());
        running_flag.store(false, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    println!(
        "{} {}",
        "Polling every".white(),
        format!("{}s", interval_secs).cyan().bold()
    );

    while running.load(Ordering::Relaxed) {
        match run_cycle(store_path, hosts, poller, notifier, options) {
            Ok(outcome) => print_outcome(&outcome, options.observe_only),
            // Another invocation owns this cycle; ours just skips it.
            Err(e) if e.is_lock_busy() => print_lock_busy(),
            Err(e @ TrafmonError::StoreCorrupt { .. }) => return Err(e.into()),
            Err(e) => log::error!("cycle failed: {}", e),
        }

        // Sleep in short slices so Ctrl+C stays responsive.
        let mut remaining = interval_secs;
        while remaining > 0 && running.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(1));
            remaining -= 1;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &CycleOutcome, observe_only: bool) {
    let mut summary = format!(
        "Polled {} host(s), {} notification(s) sent",
        outcome.hosts_polled, outcome.notifications_sent
    );
    if outcome.hosts_failed > 0 {
        summary.push_str(&format!(", {} host(s) unreachable", outcome.hosts_failed));
    }

    if outcome.hosts_failed > 0 {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }
    if observe_only {
        println!("{}", "Observe mode: stored state left untouched".dimmed());
    }
}

fn print_lock_busy() {
    println!(
        "{}",
        "Another trafmon run holds the lock; skipping this cycle".yellow()
    );
}
