//! `trafmon show` - render the stored state for humans.

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::dispatch::fmt_rate;
use crate::core::store::Store;
use crate::core::threshold::{AlertTarget, ListKind};

use super::store_path_from;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let store_path = store_path_from(matches)?;
    // Read-only: saves are atomic whole-file replaces, so no lock is needed.
    let store = Store::load(&store_path)?;

    if store.hosts.is_empty() {
        println!("{}", "No hosts registered.".yellow());
        println!();
        println!("{}", "To register an interface, run:".white());
        println!(
            "  {}",
            "trafmon register --host <host> --interface <name>".cyan().bold()
        );
        return Ok(());
    }

    println!(
        "{} {}",
        "Store:".white(),
        store_path.display().to_string().cyan().bold()
    );
    println!();

    for (host, record) in &store.hosts {
        let uptime = match record.uptime {
            Some(ticks) => format!("uptime tick {}", ticks),
            None => "no baseline".to_string(),
        };
        println!("{} {}", host.cyan().bold(), format!("({})", uptime).dimmed());

        for (name, iface) in &record.interfaces {
            let counters = match (iface.last_in, iface.last_out) {
                (Some(i), Some(o)) => format!("in {} / out {} bytes", i, o),
                _ => "no counters yet".to_string(),
            };
            println!(
                "  {} {} {}",
                name.white().bold(),
                format!("[ifIndex {}]", iface.index).dimmed(),
                counters.dimmed()
            );

            for kind in ListKind::ALL {
                let hits = iface.hits.get(kind);
                for threshold in iface.threshold_list(kind) {
                    let target = match &threshold.target {
                        AlertTarget::Email(addr) => addr.clone(),
                        AlertTarget::Warning => "report: warning".to_string(),
                        AlertTarget::Critical => "report: critical".to_string(),
                    };
                    println!(
                        "    {} {} {} {}",
                        kind.to_string().magenta(),
                        fmt_rate(threshold.rate).yellow(),
                        format!(
                            "every {} consecutive poll(s), streak {}",
                            threshold.required_hits, hits
                        )
                        .dimmed(),
                        format!("-> {}", target).white()
                    );
                }
            }

            if !iface.has_thresholds() {
                println!("    {}", "no thresholds configured".dimmed());
            }
        }
    }

    Ok(())
}
