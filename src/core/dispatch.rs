//! Alert routing: direct email notification or aggregated severity report.
//!
//! In aggregated-report mode every crossing (and every per-host failure)
//! lands as a line in a [`Report`] whose severity only ever escalates within
//! a cycle; the process exit code communicates the final severity to Nagios.
//! Email targets are handed to the [`Notifier`] collaborator; a transport
//! failure is logged and never rolls back debounce state.

use std::fmt;

use humansize::{format_size, DECIMAL};

use crate::core::notify::Notifier;
use crate::core::threshold::{AlertTarget, Crossing};

/// Aggregated-report severity, ordered so that escalation is a plain max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Pure merge: critical outranks warning outranks normal. An aggregate
    /// starts at normal and never de-escalates within one cycle.
    pub fn escalate(self, other: Severity) -> Severity {
        self.max(other)
    }

    /// Nagios-compatible process exit code.
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Normal => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Accumulated aggregated-report state for one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            severity: Severity::Normal,
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, severity: Severity, line: String) {
        self.severity = self.severity.escalate(severity);
        self.lines.push(line);
    }

    /// One status line for the whole cycle, Nagios plugin style.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            format!("{} - all interfaces within thresholds", self.severity)
        } else {
            format!("{} - {}", self.severity, self.lines.join("; "))
        }
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable bytes-per-second.
pub fn fmt_rate(rate: f64) -> String {
    format!("{}/s", format_size(rate.round().max(0.0) as u64, DECIMAL))
}

fn fmt_opt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => fmt_rate(r),
        None => "no baseline".to_string(),
    }
}

/// Routes crossings to their targets for one poll cycle.
///
/// The aggregator is an explicit value owned here and returned at the end of
/// the cycle; nothing is accumulated in global state.
pub struct Dispatcher<'a> {
    notifier: &'a dyn Notifier,
    report: Option<Report>,
    summarize: bool,
    notifications_sent: usize,
}

impl<'a> Dispatcher<'a> {
    /// Direct-notification mode: email targets notify at the debounce point,
    /// severity sentinels have nowhere to land and are skipped.
    pub fn direct(notifier: &'a dyn Notifier) -> Self {
        Self {
            notifier,
            report: None,
            summarize: false,
            notifications_sent: 0,
        }
    }

    /// Aggregated-report mode; `summarize` adds a line per interface even
    /// absent any crossing.
    pub fn aggregated(notifier: &'a dyn Notifier, summarize: bool) -> Self {
        Self {
            notifier,
            report: Some(Report::new()),
            summarize,
            notifications_sent: 0,
        }
    }

    pub fn report_mode(&self) -> bool {
        self.report.is_some()
    }

    /// Route one crossing event.
    pub fn dispatch(&mut self, host: &str, interface: &str, crossing: &Crossing) {
        match &crossing.target {
            AlertTarget::Warning | AlertTarget::Critical => {
                let severity = if crossing.target == AlertTarget::Critical {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                match &mut self.report {
                    Some(report) => report.push(
                        severity,
                        format!(
                            "{}/{} {} {} {} {}",
                            host,
                            interface,
                            crossing.direction,
                            fmt_rate(crossing.measured),
                            crossing.comparison,
                            fmt_rate(crossing.limit),
                        ),
                    ),
                    None => {
                        log::warn!(
                            "threshold on {}/{} targets the aggregated report but this is \
                             a direct-notification run; crossing not reported",
                            host,
                            interface
                        );
                    }
                }
            }
            AlertTarget::Email(to) => {
                let subject = format!(
                    "[trafmon] {}/{}: {} traffic {} {}",
                    host,
                    interface,
                    crossing.direction,
                    crossing.comparison,
                    fmt_rate(crossing.limit)
                );
                let body = format!(
                    "Host: {}\nInterface: {}\nDirection: {}\nMeasured: {} ({} limit {})\n\
                     Consecutive polls: {}\nTime: {}\n",
                    host,
                    interface,
                    crossing.direction,
                    fmt_rate(crossing.measured),
                    crossing.comparison,
                    fmt_rate(crossing.limit),
                    crossing.hits,
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                );
                match self.notifier.notify(to, &subject, &body) {
                    Ok(()) => self.notifications_sent += 1,
                    // Best effort: the debounce counter has already advanced
                    // and is not rolled back on delivery failure.
                    Err(e) => log::error!("notification to {} failed: {}", to, e),
                }
            }
        }
    }

    /// Summarize sub-mode line for an interface with no crossing this poll.
    pub fn interface_quiet(
        &mut self,
        host: &str,
        interface: &str,
        in_rate: Option<f64>,
        out_rate: Option<f64>,
    ) {
        if !self.summarize {
            return;
        }
        if let Some(report) = &mut self.report {
            report.push(
                Severity::Normal,
                format!(
                    "{}/{} in {} out {} ok",
                    host,
                    interface,
                    fmt_opt_rate(in_rate),
                    fmt_opt_rate(out_rate)
                ),
            );
        }
    }

    /// A host whose poll failed: never reported as normal. The aggregate is
    /// escalated so an unreachable host is distinguishable from one confirmed
    /// within thresholds.
    pub fn host_unreachable(&mut self, host: &str, reason: &str) {
        log::warn!("host {} skipped this cycle: {}", host, reason);
        if let Some(report) = &mut self.report {
            report.push(Severity::Warning, format!("{} unreachable", host));
        }
    }

    /// A host named on the command line but absent from the store.
    pub fn host_unregistered(&mut self, host: &str) {
        log::warn!("host {} has no registered interfaces", host);
        if let Some(report) = &mut self.report {
            report.push(Severity::Warning, format!("{} not registered", host));
        }
    }

    pub fn finish(self) -> (Option<Report>, usize) {
        (self.report, self.notifications_sent)
    }
}
