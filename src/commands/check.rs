//! `trafmon check` - aggregated-report mode for Nagios-style scheduling.
//!
//! Prints one severity + message line on stdout and exits 0 (normal),
//! 1 (warning) or 2 (critical). A busy lock exits at the normal status so a
//! blocked check is never mistaken for a bandwidth alert.

use anyhow::Result;
use clap::ArgMatches;

use crate::core::engine::{run_cycle, CycleOptions};
use crate::core::notify::{MailConfig, MailNotifier};
use crate::core::poller::SnmpPoller;

use super::{hosts_from, store_path_from};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let hosts = hosts_from(matches);
    let store_path = store_path_from(matches)?;
    let community = matches.get_one::<String>("community").unwrap();
    let options = CycleOptions {
        observe_only: matches.get_flag("observe"),
        report: true,
        summarize: matches.get_flag("summarize"),
    };

    let mut poller = SnmpPoller::new(community)?;
    let notifier = MailNotifier::new(MailConfig::from_env());

    match run_cycle(&store_path, &hosts, &mut poller, &notifier, &options) {
        Ok(outcome) => {
            // report is always present in aggregated mode
            let report = outcome.report.unwrap_or_default();
            println!("{}", report.render());
            std::process::exit(report.severity.exit_code());
        }
        Err(e) if e.is_lock_busy() => {
            println!("OK - another trafmon invocation holds the lock");
            std::process::exit(0);
        }
        Err(e) => Err(e.into()),
    }
}
