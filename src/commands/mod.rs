// Command handlers module
pub mod check;
pub mod poll;
pub mod register;
pub mod reset;
pub mod show;
pub mod threshold;

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use crate::core::store::default_store_path;

/// Store path from `--store`, falling back to the per-user default.
pub(crate) fn store_path_from(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<String>("store") {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(default_store_path()?),
    }
}

pub(crate) fn hosts_from(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("host")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
