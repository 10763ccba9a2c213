//! `trafmon reset` - discard stored counters and debounce state.
//!
//! Thresholds survive a reset; the next poll only re-establishes baselines.

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::lock::CycleLock;
use crate::core::store::Store;

use super::store_path_from;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let host = matches.get_one::<String>("host");
    let store_path = store_path_from(matches)?;

    let lock = CycleLock::acquire(&CycleLock::path_for_store(&store_path))?;
    let mut store = Store::load(&store_path)?;
    store.reset_counters(host.map(String::as_str))?;
    store.save(&store_path)?;
    lock.release();

    match host {
        Some(name) => println!(
            "{} {}",
            "Cleared counters for".green().bold(),
            name.cyan().bold()
        ),
        None => println!("{}", "Cleared counters for all hosts".green().bold()),
    }
    println!(
        "{}",
        "Configured thresholds were kept; the next poll re-baselines.".dimmed()
    );

    Ok(())
}
