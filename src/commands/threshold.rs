//! `trafmon threshold` - configure alert thresholds on a registered interface.

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::dispatch::fmt_rate;
use crate::core::lock::CycleLock;
use crate::core::store::Store;
use crate::core::threshold::{AlertTarget, ListKind, Threshold};

use super::store_path_from;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("add", sub_matches)) => execute_add(sub_matches),
        _ => {
            println!("Use 'trafmon threshold --help' for more information.");
            Ok(())
        }
    }
}

fn execute_add(matches: &ArgMatches) -> Result<()> {
    let host = matches.get_one::<String>("host").unwrap();
    let interface = matches.get_one::<String>("interface").unwrap();
    let kind: ListKind = matches
        .get_one::<String>("list")
        .unwrap()
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let rate = *matches.get_one::<f64>("rate").unwrap();
    let hits = *matches.get_one::<u32>("hits").unwrap();
    let target = AlertTarget::parse(matches.get_one::<String>("target").unwrap())
        .map_err(|e| anyhow!(e))?;
    let store_path = store_path_from(matches)?;

    if rate <= 0.0 {
        return Err(anyhow!("threshold rate must be positive (bytes per second)"));
    }

    let lock = CycleLock::acquire(&CycleLock::path_for_store(&store_path))?;
    let mut store = Store::load(&store_path)?;
    store.add_threshold(host, interface, kind, Threshold::new(rate, hits, target))?;
    store.save(&store_path)?;
    lock.release();

    println!(
        "{} {} {} {}",
        "Added".green().bold(),
        kind.to_string().cyan().bold(),
        format!("threshold at {}", fmt_rate(rate)).white(),
        format!("on {}/{} ({} consecutive polls)", host, interface, hits.max(1)).dimmed()
    );

    Ok(())
}
