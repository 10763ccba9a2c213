//! `trafmon register` - resolve an interface's ifIndex and add it to the store.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::lock::CycleLock;
use crate::core::poller::{Poller, SnmpPoller};
use crate::core::store::Store;

use super::store_path_from;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let host = matches.get_one::<String>("host").unwrap();
    let interface = matches.get_one::<String>("interface").unwrap();
    let community = matches.get_one::<String>("community").unwrap();
    let store_path = store_path_from(matches)?;

    let mut poller = SnmpPoller::new(community)?;
    let index = poller
        .resolve_index(host, interface)
        .with_context(|| format!("could not resolve '{}' on {}", interface, host))?;

    let lock = CycleLock::acquire(&CycleLock::path_for_store(&store_path))?;
    let mut store = Store::load(&store_path)?;
    store.register_interface(host, interface, index);
    store.save(&store_path)?;
    lock.release();

    println!(
        "{} {} {}",
        "Registered".green().bold(),
        format!("{}/{}", host, interface).cyan().bold(),
        format!("(ifIndex {})", index).dimmed()
    );
    println!(
        "{}",
        "Add thresholds with 'trafmon threshold add' to start alerting.".dimmed()
    );

    Ok(())
}
