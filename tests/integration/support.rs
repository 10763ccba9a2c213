//! Shared fixtures: a scripted poller and a recording notifier.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use trafmon::core::notify::{Notifier, NotifyError};
use trafmon::core::poller::{InterfaceCounters, PollSample, Poller};
use trafmon::error::TrafmonError;

/// Poller that replays pre-scripted samples per host.
#[derive(Default)]
pub struct ScriptedPoller {
    samples: HashMap<String, VecDeque<PollSample>>,
    unreachable: Vec<String>,
}

impl ScriptedPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sample(&mut self, host: &str, sample: PollSample) {
        self.samples
            .entry(host.to_string())
            .or_default()
            .push_back(sample);
    }

    pub fn mark_unreachable(&mut self, host: &str) {
        self.unreachable.push(host.to_string());
    }
}

impl Poller for ScriptedPoller {
    fn poll(&mut self, host: &str, _indices: &[u32]) -> Result<PollSample, TrafmonError> {
        if self.unreachable.iter().any(|h| h == host) {
            return Err(TrafmonError::poll(host, "timed out"));
        }
        self.samples
            .get_mut(host)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| TrafmonError::poll(host, "no scripted sample left"))
    }

    fn resolve_index(&mut self, host: &str, ifname: &str) -> Result<u32, TrafmonError> {
        Err(TrafmonError::UnknownInterface {
            host: host.to_string(),
            interface: ifname.to_string(),
        })
    }
}

/// Build a poll sample from (ifIndex, in_octets, out_octets) triples.
pub fn sample(uptime_ticks: u64, counters: &[(u32, u64, u64)]) -> PollSample {
    let mut sample = PollSample {
        uptime_ticks,
        counters: HashMap::new(),
    };
    for &(index, in_octets, out_octets) in counters {
        sample.counters.insert(
            index,
            InterfaceCounters {
                in_octets,
                out_octets,
            },
        );
    }
    sample
}

/// Notifier that records deliveries instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
