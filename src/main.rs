use std::{process, time::Duration};

use anyhow::Result;
use clap::{
    arg, crate_authors, crate_name, crate_version, value_parser, ArgAction, ArgMatches, Command,
};
use log::LevelFilter;
use tcpsweep::{
    config::{ScanConfig, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT},
    error::ScanError,
    logger,
    port::PortRange,
    report, resolver,
    scan::Scanner,
};

struct ParsedArgs {
    level: LevelFilter,
    config: ScanConfig,
    targets: Vec<String>,
}

fn parse_args(matches: ArgMatches) -> Result<ParsedArgs, ScanError> {
    let level = if matches.get_flag("debug") {
        LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    };

    let ports = match matches.get_one::<String>("ports") {
        Some(raw) => raw.parse::<PortRange>()?,
        None => PortRange::default(),
    };

    let concurrency = matches
        .get_one::<usize>("concurrency")
        .copied()
        .unwrap_or(DEFAULT_CONCURRENCY);

    let timeout = matches
        .get_one::<u64>("timeout")
        .map(|&ms| Duration::from_millis(ms))
        .unwrap_or(DEFAULT_TIMEOUT);

    let deadline = matches
        .get_one::<u64>("deadline")
        .map(|&secs| Duration::from_secs(secs));

    let config = ScanConfig::new(ports)
        .with_concurrency(concurrency)
        .with_timeout(timeout)
        .with_deadline(deadline)
        .with_randomize(matches.get_flag("randomize"));
    config.validate()?;

    let targets = matches
        .get_many::<String>("target")
        .map(|ts| ts.cloned().collect())
        .unwrap_or_default();

    Ok(ParsedArgs {
        level,
        config,
        targets,
    })
}

/// Scans one target. Resolution errors are returned before any worker starts.
fn run_target(target: &str, config: &ScanConfig) -> Result<(), ScanError> {
    let ip = resolver::lookup(target)?;

    print!("{}", report::header(target, ip, config.ports));

    let outcome = Scanner::new(ip, config.clone())?.run()?;

    print!("{}", report::render(target, &outcome));

    Ok(())
}

fn main() -> Result<()> {
    let arg_matches = Command::new(crate_name!())
        .about(
            "Concurrent TCP connect scanner.\n\
            Reports which ports of a host accept a connection.",
        )
        .version(crate_version!())
        .arg_required_else_help(true)
        .author(crate_authors!())
        .args([
            // Miscellaneous arguments.
            arg!(-d --debug "Turns on debugging information").action(ArgAction::SetTrue),
            arg!(-v --verbose "Reports open ports as they are found").action(ArgAction::SetTrue),
            arg!(<target> ... "Addresses or hostnames to scan").required(true),
        ])
        .args([
            // Scan tuning.
            arg!(-p --ports <RANGE> "Single port or range such as 1-1024 (default: 1-1024)"),
            arg!(-c --concurrency <WORKERS> "Number of parallel workers (default: 100)")
                .value_parser(value_parser!(usize)),
            arg!(-t --timeout <MILLIS> "Connection timeout per port (default: 500)")
                .value_parser(value_parser!(u64)),
            arg!(--deadline <SECS> "Stop claiming new ports after this many seconds")
                .value_parser(value_parser!(u64)),
            arg!(-r --randomize "Probe ports in random order").action(ArgAction::SetTrue),
        ])
        .get_matches();

    // Extract arguments.
    let parsed = parse_args(arg_matches)?;

    logger::init(parsed.level);

    let mut failed = false;

    for (i, target) in parsed.targets.iter().enumerate() {
        if i > 0 {
            println!();
        }

        if let Err(e) = run_target(target, &parsed.config) {
            match e {
                ScanError::Resolution(_) => eprintln!("{}: {}", target, e),
                // Anything else is not specific to this target.
                _ => return Err(e.into()),
            }
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }

    Ok(())
}
