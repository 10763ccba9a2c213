//! Persistent counter store.
//!
//! One versioned JSON document maps each monitored host to its last-observed
//! uptime tick and per-interface counter/threshold state. Saves go through a
//! temporary file in the same directory followed by an atomic rename, so a
//! concurrent reader never observes a half-written store.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::threshold::{ListKind, Threshold};
use crate::error::{Result, TrafmonError};

/// Current on-disk document version.
pub const STORE_VERSION: u32 = 1;

/// One consecutive-hit counter per threshold list.
///
/// The counter is shared across all thresholds in its list and is cleared
/// whenever the list's condition fails to hold on a poll.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceCounters {
    #[serde(default)]
    pub max_in: u32,
    #[serde(default)]
    pub max_out: u32,
    #[serde(default)]
    pub min_in: u32,
    #[serde(default)]
    pub min_out: u32,
}

impl DebounceCounters {
    pub fn get(&self, kind: ListKind) -> u32 {
        match kind {
            ListKind::MaxIn => self.max_in,
            ListKind::MaxOut => self.max_out,
            ListKind::MinIn => self.min_in,
            ListKind::MinOut => self.min_out,
        }
    }

    pub fn set(&mut self, kind: ListKind, value: u32) {
        match kind {
            ListKind::MaxIn => self.max_in = value,
            ListKind::MaxOut => self.max_out = value,
            ListKind::MinIn => self.min_in = value,
            ListKind::MinOut => self.min_out = value,
        }
    }

    pub fn clear(&mut self) {
        *self = DebounceCounters::default();
    }
}

/// Per-interface counter baseline and threshold configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Device ifIndex used to address this interface when polling. Opaque to
    /// the monitoring core; only the poller interprets it.
    pub index: u32,
    /// Last observed cumulative byte counters. `None` means no baseline.
    #[serde(default)]
    pub last_in: Option<u64>,
    #[serde(default)]
    pub last_out: Option<u64>,
    #[serde(default)]
    pub max_in: Vec<Threshold>,
    #[serde(default)]
    pub max_out: Vec<Threshold>,
    #[serde(default)]
    pub min_in: Vec<Threshold>,
    #[serde(default)]
    pub min_out: Vec<Threshold>,
    #[serde(default)]
    pub hits: DebounceCounters,
}

impl InterfaceRecord {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            last_in: None,
            last_out: None,
            max_in: Vec::new(),
            max_out: Vec::new(),
            min_in: Vec::new(),
            min_out: Vec::new(),
            hits: DebounceCounters::default(),
        }
    }

    pub fn threshold_list(&self, kind: ListKind) -> &Vec<Threshold> {
        match kind {
            ListKind::MaxIn => &self.max_in,
            ListKind::MaxOut => &self.max_out,
            ListKind::MinIn => &self.min_in,
            ListKind::MinOut => &self.min_out,
        }
    }

    pub fn threshold_list_mut(&mut self, kind: ListKind) -> &mut Vec<Threshold> {
        match kind {
            ListKind::MaxIn => &mut self.max_in,
            ListKind::MaxOut => &mut self.max_out,
            ListKind::MinIn => &mut self.min_in,
            ListKind::MinOut => &mut self.min_out,
        }
    }

    /// Discard counter baseline and debounce state, keeping thresholds.
    pub fn reset_counters(&mut self) {
        self.last_in = None;
        self.last_out = None;
        self.hits.clear();
    }

    pub fn has_thresholds(&self) -> bool {
        ListKind::ALL
            .iter()
            .any(|&kind| !self.threshold_list(kind).is_empty())
    }
}

/// Per-host record: uptime proxy plus registered interfaces.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Last observed sysUpTime tick count. Used only to derive elapsed time
    /// between two polls; a decrease signals a device restart.
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceRecord>,
}

/// Root store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    #[serde(default)]
    pub hosts: BTreeMap<String, HostRecord>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            hosts: BTreeMap::new(),
        }
    }
}

impl Store {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. An existing file that cannot be
    /// parsed, or that carries an unknown version, is a fatal corruption
    /// error: proceeding could silently drop configured thresholds on the
    /// next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Store::default());
        }

        let data = fs::read_to_string(path)?;
        let store: Store = serde_json::from_str(&data)
            .map_err(|e| TrafmonError::store_corrupt(path, e.to_string()))?;

        if store.version != STORE_VERSION {
            return Err(TrafmonError::store_corrupt(
                path,
                format!(
                    "unsupported store version {} (expected {})",
                    store.version, STORE_VERSION
                ),
            ));
        }

        Ok(store)
    }

    /// Persist the store to `path` via temp-file-and-rename in the target
    /// directory, so readers only ever see a complete document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".trafmon-store")
            .suffix(".tmp")
            .tempfile_in(&dir)?;

        let data = serde_json::to_string_pretty(self)
            .map_err(|e| TrafmonError::store_corrupt(path, e.to_string()))?;
        tmp.write_all(data.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }

    pub fn host(&self, host: &str) -> Option<&HostRecord> {
        self.hosts.get(host)
    }

    pub fn host_mut(&mut self, host: &str) -> Result<&mut HostRecord> {
        self.hosts
            .get_mut(host)
            .ok_or_else(|| TrafmonError::UnknownHost(host.to_string()))
    }

    /// Register (or re-register) an interface under a host.
    ///
    /// Re-registration refreshes the polled index but keeps thresholds, so a
    /// device that renumbered its interfaces is healed without losing
    /// configuration. Counters are re-baselined either way.
    pub fn register_interface(&mut self, host: &str, interface: &str, index: u32) {
        let record = self.hosts.entry(host.to_string()).or_default();
        match record.interfaces.get_mut(interface) {
            Some(existing) => {
                existing.index = index;
                existing.reset_counters();
            }
            None => {
                record
                    .interfaces
                    .insert(interface.to_string(), InterfaceRecord::new(index));
            }
        }
    }

    /// Append a threshold to one of an interface's four lists.
    pub fn add_threshold(
        &mut self,
        host: &str,
        interface: &str,
        kind: ListKind,
        threshold: Threshold,
    ) -> Result<()> {
        let record = self.host_mut(host)?;
        let iface = record.interfaces.get_mut(interface).ok_or_else(|| {
            TrafmonError::UnknownInterface {
                host: host.to_string(),
                interface: interface.to_string(),
            }
        })?;
        iface.threshold_list_mut(kind).push(threshold);
        Ok(())
    }

    /// Reset mode: discard counters and debounce state (for one host, or for
    /// all hosts), preserving configured thresholds. The next poll after a
    /// reset only establishes baselines.
    pub fn reset_counters(&mut self, host: Option<&str>) -> Result<()> {
        match host {
            Some(name) => {
                let record = self.host_mut(name)?;
                record.uptime = None;
                for iface in record.interfaces.values_mut() {
                    iface.reset_counters();
                }
            }
            None => {
                for record in self.hosts.values_mut() {
                    record.uptime = None;
                    for iface in record.interfaces.values_mut() {
                        iface.reset_counters();
                    }
                }
            }
        }
        Ok(())
    }
}

/// Default per-user store path; `--store` overrides it so independent
/// configurations (one per Nagios host) never contend on a shared lock.
pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| TrafmonError::config("could not determine local data directory"))?;
    Ok(data_dir.join("trafmon").join("counters.json"))
}
