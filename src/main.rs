use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use trafmon::commands;

fn store_arg() -> Arg {
    Arg::new("store")
        .long("store")
        .value_name("PATH")
        .help("Override the store file path (default: per-user data directory)")
}

fn community_arg() -> Arg {
    Arg::new("community")
        .short('c')
        .long("community")
        .value_name("COMMUNITY")
        .help("SNMP v2c community string")
        .default_value("public")
}

fn hosts_arg() -> Arg {
    Arg::new("host")
        .short('H')
        .long("host")
        .value_name("HOST")
        .help("Host to poll (repeatable)")
        .action(ArgAction::Append)
        .required(true)
}

fn main() -> Result<()> {
    trafmon::init_logging();

    let matches = Command::new("trafmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("SNMP interface bandwidth monitor with debounced thresholds")
        .subcommand(
            Command::new("poll")
                .about("Poll hosts once (or in a loop) and send email notifications")
                .arg(hosts_arg())
                .arg(community_arg())
                .arg(store_arg())
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Repeat the poll cycle at this interval until interrupted")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("observe")
                        .long("observe")
                        .help("Compute and report but never persist updated state")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Poll hosts once and report severity Nagios-style (exit 0/1/2)")
                .arg(hosts_arg())
                .arg(community_arg())
                .arg(store_arg())
                .arg(
                    Arg::new("summarize")
                        .short('s')
                        .long("summarize")
                        .help("Include a line per interface even without a crossing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("observe")
                        .long("observe")
                        .help("Compute and report but never persist updated state")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Resolve an interface name on a device and add it to the store")
                .arg(
                    Arg::new("host")
                        .short('H')
                        .long("host")
                        .value_name("HOST")
                        .help("Device to query")
                        .required(true),
                )
                .arg(
                    Arg::new("interface")
                        .short('I')
                        .long("interface")
                        .value_name("NAME")
                        .help("Interface name as reported by the device (ifDescr)")
                        .required(true),
                )
                .arg(community_arg())
                .arg(store_arg()),
        )
        .subcommand(
            Command::new("threshold")
                .about("Manage alert thresholds (use 'trafmon threshold --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a threshold to one of an interface's lists")
                        .arg(
                            Arg::new("host")
                                .short('H')
                                .long("host")
                                .value_name("HOST")
                                .required(true),
                        )
                        .arg(
                            Arg::new("interface")
                                .short('I')
                                .long("interface")
                                .value_name("NAME")
                                .required(true),
                        )
                        .arg(
                            Arg::new("list")
                                .short('l')
                                .long("list")
                                .value_name("LIST")
                                .help("Threshold list: max-in, max-out, min-in or min-out")
                                .required(true),
                        )
                        .arg(
                            Arg::new("rate")
                                .short('r')
                                .long("rate")
                                .value_name("BYTES_PER_SEC")
                                .help("Limit in bytes per second")
                                .value_parser(clap::value_parser!(f64))
                                .required(true),
                        )
                        .arg(
                            Arg::new("hits")
                                .long("hits")
                                .value_name("COUNT")
                                .help("Consecutive crossing polls required before alerting")
                                .value_parser(clap::value_parser!(u32).range(1..))
                                .default_value("1"),
                        )
                        .arg(
                            Arg::new("target")
                                .short('t')
                                .long("target")
                                .value_name("TARGET")
                                .help("Email address, or 'warn'/'crit' for the check report")
                                .required(true),
                        )
                        .arg(store_arg()),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show registered hosts, interfaces and thresholds")
                .arg(store_arg()),
        )
        .subcommand(
            Command::new("reset")
                .about("Discard stored counters and debounce state, keeping thresholds")
                .arg(
                    Arg::new("host")
                        .short('H')
                        .long("host")
                        .value_name("HOST")
                        .help("Reset only this host (default: all hosts)"),
                )
                .arg(store_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("poll", sub_matches)) => commands::poll::execute(sub_matches),
        Some(("check", sub_matches)) => commands::check::execute(sub_matches),
        Some(("register", sub_matches)) => commands::register::execute(sub_matches),
        Some(("threshold", sub_matches)) => commands::threshold::execute(sub_matches),
        Some(("show", sub_matches)) => commands::show::execute(sub_matches),
        Some(("reset", sub_matches)) => commands::reset::execute(sub_matches),
        _ => {
            println!("Welcome to trafmon!");
            println!("Use 'trafmon --help' for more information.");
            Ok(())
        }
    }
}
