//! Device counter polling over SNMP.
//!
//! The engine only sees the [`Poller`] trait: give it a host and a set of
//! interface indices, get back the device uptime and cumulative in/out byte
//! counters. [`SnmpPoller`] implements it by shelling out to the net-snmp
//! `snmpget`/`snmpwalk` binaries, located once via `which` and cached for
//! the life of the process. Any transport or parse problem surfaces as a
//! per-host error; the engine skips that host for the cycle and leaves its
//! stored baseline untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, TrafmonError};

const SYS_UPTIME_OID: &str = ".1.3.6.1.2.1.1.3.0";
const IF_DESCR_OID: &str = ".1.3.6.1.2.1.2.2.1.2";
const IF_IN_OCTETS_OID: &str = ".1.3.6.1.2.1.2.2.1.10";
const IF_OUT_OCTETS_OID: &str = ".1.3.6.1.2.1.2.2.1.16";

/// Cumulative byte counters for one interface direction pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub in_octets: u64,
    pub out_octets: u64,
}

/// One device sample: uptime ticks plus counters per requested index.
#[derive(Debug, Clone, Default)]
pub struct PollSample {
    /// sysUpTime in hundredths of a second.
    pub uptime_ticks: u64,
    pub counters: HashMap<u32, InterfaceCounters>,
}

/// Black-box counter source for the monitoring engine.
pub trait Poller {
    /// Fetch uptime and counters for the given interface indices.
    fn poll(&mut self, host: &str, indices: &[u32]) -> Result<PollSample>;

    /// Resolve a human-readable interface name to the device's ifIndex
    /// (registration time only).
    fn resolve_index(&mut self, host: &str, ifname: &str) -> Result<u32>;
}

/// Polls devices with the net-snmp command line tools.
pub struct SnmpPoller {
    snmpget: PathBuf,
    snmpwalk: PathBuf,
    community: String,
    timeout_secs: u32,
}

impl SnmpPoller {
    pub fn new(community: &str) -> Result<Self> {
        let snmpget = which::which("snmpget")
            .map_err(|_| TrafmonError::config("snmpget not found in PATH (install net-snmp)"))?;
        let snmpwalk = which::which("snmpwalk")
            .map_err(|_| TrafmonError::config("snmpwalk not found in PATH (install net-snmp)"))?;
        Ok(Self {
            snmpget,
            snmpwalk,
            community: community.to_string(),
            timeout_secs: 5,
        })
    }

    fn run(&self, binary: &Path, host: &str, output_opts: &str, oids: &[String]) -> Result<String> {
        let output = Command::new(binary)
            .arg("-v")
            .arg("2c")
            .arg("-c")
            .arg(&self.community)
            .arg("-t")
            .arg(self.timeout_secs.to_string())
            .arg(output_opts)
            .arg(host)
            .args(oids)
            .output()
            .map_err(|e| TrafmonError::poll(host, format!("failed to run snmp tool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrafmonError::poll(host, stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Poller for SnmpPoller {
    fn poll(&mut self, host: &str, indices: &[u32]) -> Result<PollSample> {
        let mut oids = Vec::with_capacity(1 + indices.len() * 2);
        oids.push(SYS_UPTIME_OID.to_string());
        for index in indices {
            oids.push(format!("{}.{}", IF_IN_OCTETS_OID, index));
            oids.push(format!("{}.{}", IF_OUT_OCTETS_OID, index));
        }

        // -OqvtU: values only, timeticks as a raw integer, no units.
        let stdout = self.run(&self.snmpget, host, "-OqvtU", &oids)?;
        let values =
            parse_counter_values(&stdout).map_err(|reason| TrafmonError::poll(host, reason))?;

        if values.len() != 1 + indices.len() * 2 {
            return Err(TrafmonError::poll(
                host,
                format!(
                    "expected {} values, device returned {}",
                    1 + indices.len() * 2,
                    values.len()
                ),
            ));
        }

        let mut sample = PollSample {
            uptime_ticks: values[0],
            counters: HashMap::new(),
        };
        for (slot, index) in indices.iter().enumerate() {
            sample.counters.insert(
                *index,
                InterfaceCounters {
                    in_octets: values[1 + slot * 2],
                    out_octets: values[2 + slot * 2],
                },
            );
        }

        Ok(sample)
    }

    fn resolve_index(&mut self, host: &str, ifname: &str) -> Result<u32> {
        // -Onq: numeric OIDs, quick output ("<oid> <value>" per line).
        let stdout = self.run(
            &self.snmpwalk,
            host,
            "-Onq",
            &[IF_DESCR_OID.to_string()],
        )?;

        for line in stdout.lines() {
            if let Some((index, descr)) = parse_descr_line(line) {
                if descr == ifname {
                    return Ok(index);
                }
            }
        }

        Err(TrafmonError::UnknownInterface {
            host: host.to_string(),
            interface: ifname.to_string(),
        })
    }
}

/// Parse `snmpget -OqvtU` output: one bare numeric value per line.
fn parse_counter_values(stdout: &str) -> std::result::Result<Vec<u64>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<u64>()
                .map_err(|_| format!("unparseable counter value '{}'", line))
        })
        .collect()
}

/// Parse one `snmpwalk -Onq` ifDescr line into (ifIndex, description).
fn parse_descr_line(line: &str) -> Option<(u32, &str)> {
    let (oid, value) = line.trim().split_once(' ')?;
    let index = oid.rsplit('.').next()?.parse().ok()?;
    Some((index, value.trim().trim_matches('"')))
}
