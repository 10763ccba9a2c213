//! Debounced threshold evaluation.
//!
//! Each interface carries four independent threshold lists (max-in, max-out,
//! min-in, min-out). A list shares one consecutive-hit counter across all of
//! its thresholds; the counter increments on every poll the list's condition
//! holds and resets to zero on the first poll it does not.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::store::InterfaceRecord;

/// Traffic direction of a threshold list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Crossing predicate of a threshold list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Max lists: the measured rate exceeds the limit.
    Above,
    /// Min lists: the measured rate falls short of the limit.
    Below,
}

impl Comparison {
    pub fn holds(self, rate: f64, limit: f64) -> bool {
        match self {
            Comparison::Above => rate > limit,
            Comparison::Below => rate < limit,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Above => write!(f, "above"),
            Comparison::Below => write!(f, "below"),
        }
    }
}

/// Identifies one of the four threshold lists on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    MaxIn,
    MaxOut,
    MinIn,
    MinOut,
}

impl ListKind {
    pub const ALL: [ListKind; 4] = [
        ListKind::MaxIn,
        ListKind::MaxOut,
        ListKind::MinIn,
        ListKind::MinOut,
    ];

    pub fn direction(self) -> Direction {
        match self {
            ListKind::MaxIn | ListKind::MinIn => Direction::In,
            ListKind::MaxOut | ListKind::MinOut => Direction::Out,
        }
    }

    pub fn comparison(self) -> Comparison {
        match self {
            ListKind::MaxIn | ListKind::MaxOut => Comparison::Above,
            ListKind::MinIn | ListKind::MinOut => Comparison::Below,
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::MaxIn => write!(f, "max-in"),
            ListKind::MaxOut => write!(f, "max-out"),
            ListKind::MinIn => write!(f, "min-in"),
            ListKind::MinOut => write!(f, "min-out"),
        }
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max-in" => Ok(ListKind::MaxIn),
            "max-out" => Ok(ListKind::MaxOut),
            "min-in" => Ok(ListKind::MinIn),
            "min-out" => Ok(ListKind::MinOut),
            other => Err(format!(
                "invalid threshold list '{}' (expected max-in, max-out, min-in or min-out)",
                other
            )),
        }
    }
}

/// Where a triggered threshold sends its alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertTarget {
    /// Notify this address directly.
    Email(String),
    /// Reserved sentinel: raise the aggregated report to warning.
    Warning,
    /// Reserved sentinel: raise the aggregated report to critical.
    Critical,
}

impl AlertTarget {
    /// Strict parse for the CLI: sentinels or a plausible mail address.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "warn" => Ok(AlertTarget::Warning),
            "crit" => Ok(AlertTarget::Critical),
            addr if addr.contains('@') => Ok(AlertTarget::Email(addr.to_string())),
            other => Err(format!(
                "invalid alert target '{}' (expected an email address, 'warn' or 'crit')",
                other
            )),
        }
    }
}

impl From<String> for AlertTarget {
    fn from(s: String) -> Self {
        match s.as_str() {
            "warn" => AlertTarget::Warning,
            "crit" => AlertTarget::Critical,
            _ => AlertTarget::Email(s),
        }
    }
}

impl From<AlertTarget> for String {
    fn from(t: AlertTarget) -> Self {
        match t {
            AlertTarget::Email(addr) => addr,
            AlertTarget::Warning => "warn".to_string(),
            AlertTarget::Critical => "crit".to_string(),
        }
    }
}

/// A single configured threshold within a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Limit in bytes per second.
    pub rate: f64,
    /// Consecutive crossing polls required before an alert fires.
    #[serde(default = "default_required_hits")]
    pub required_hits: u32,
    pub target: AlertTarget,
}

fn default_required_hits() -> u32 {
    1
}

impl Threshold {
    pub fn new(rate: f64, required_hits: u32, target: AlertTarget) -> Self {
        Self {
            rate,
            required_hits: required_hits.max(1),
            target,
        }
    }
}

/// A threshold crossing that the dispatcher should act on.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub target: AlertTarget,
    pub direction: Direction,
    pub comparison: Comparison,
    /// Value of the list's consecutive-hit counter at dispatch time.
    pub hits: u32,
    pub measured: f64,
    pub limit: f64,
}

/// Outcome of evaluating all four lists on one interface for one poll.
#[derive(Debug, Default)]
pub struct InterfaceEvaluation {
    pub crossings: Vec<Crossing>,
    /// True when any inbound predicate held this poll, alert or not.
    pub in_flagged: bool,
    /// True when any outbound predicate held this poll, alert or not.
    pub out_flagged: bool,
}

/// Evaluate one interface against its configured thresholds.
///
/// `report_mode` makes every crossing dispatch immediately; outside it a
/// crossing dispatches only on the poll where the list's counter reaches the
/// threshold's `required_hits` exactly, so a continuing streak does not
/// re-notify until the counter has reset and climbed back up.
pub fn evaluate_interface(
    record: &mut InterfaceRecord,
    in_rate: Option<f64>,
    out_rate: Option<f64>,
    report_mode: bool,
) -> InterfaceEvaluation {
    let mut evaluation = InterfaceEvaluation::default();

    for kind in ListKind::ALL {
        let rate = match kind.direction() {
            Direction::In => in_rate,
            Direction::Out => out_rate,
        };
        let held = evaluate_list(record, kind, rate, report_mode, &mut evaluation.crossings);
        match kind.direction() {
            Direction::In => evaluation.in_flagged |= held,
            Direction::Out => evaluation.out_flagged |= held,
        }
    }

    evaluation
}

fn evaluate_list(
    record: &mut InterfaceRecord,
    kind: ListKind,
    rate: Option<f64>,
    report_mode: bool,
    crossings: &mut Vec<Crossing>,
) -> bool {
    // A crossing is only ever considered for a strictly positive rate; a
    // missing baseline or an idle counter clears the streak like any other
    // non-crossing poll.
    let rate = match rate {
        Some(r) if r > 0.0 => r,
        _ => {
            record.hits.set(kind, 0);
            return false;
        }
    };

    let comparison = kind.comparison();
    let held: Vec<usize> = record
        .threshold_list(kind)
        .iter()
        .enumerate()
        .filter(|(_, t)| comparison.holds(rate, t.rate))
        .map(|(i, _)| i)
        .collect();

    if held.is_empty() {
        record.hits.set(kind, 0);
        return false;
    }

    let hits = record.hits.get(kind) + 1;
    record.hits.set(kind, hits);

    for i in held {
        let threshold = &record.threshold_list(kind)[i];
        if report_mode || hits == threshold.required_hits {
            crossings.push(Crossing {
                target: threshold.target.clone(),
                direction: kind.direction(),
                comparison,
                hits,
                measured: rate,
                limit: threshold.rate,
            });
        }
    }

    true
}
