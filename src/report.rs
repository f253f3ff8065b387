use std::{fmt::Write, net::IpAddr};

use pad::PadStr;

use crate::{
    port::PortRange,
    scan::{ScanOutcome, ScanStatus},
};

pub fn header(target: &str, ip: IpAddr, ports: PortRange) -> String {
    if target == ip.to_string() {
        format!("Scanning {} ports {}\n", target, ports)
    } else {
        format!("Scanning {} ({}) ports {}\n", target, ip, ports)
    }
}

/// One line, the last thing printed for each scanned target.
pub fn summary(target: &str, outcome: &ScanOutcome) -> String {
    if outcome.open_ports.is_empty() {
        format!("{}: no open ports found", target)
    } else {
        let ports = outcome
            .open_ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}: open ports {}", target, ports)
    }
}

pub fn render(target: &str, outcome: &ScanOutcome) -> String {
    let mut out = format!(
        "Scan Duration: {:.4}s\n\n",
        outcome.elapsed.as_secs_f32()
    );

    if !outcome.open_ports.is_empty() {
        out.push_str("Port    State\n");
        outcome.open_ports.iter().for_each(|port| {
            let _ = writeln!(out, "{}open", port.to_string().pad_to_width(8));
        });
        out.push('\n');
    }

    let tally = &outcome.tally;
    let _ = writeln!(
        out,
        "Probed {}/{} ports: {} open, {} refused, {} timed out, {} unreachable, {} other",
        outcome.probed,
        outcome.enqueued,
        tally.open,
        tally.refused,
        tally.timeout,
        tally.unreachable,
        tally.other
    );

    if outcome.status == ScanStatus::Partial {
        let _ = writeln!(
            out,
            "Scan interrupted, {} ports were not probed",
            outcome.enqueued - outcome.probed
        );
    }

    out.push_str(&summary(target, outcome));
    out.push('\n');

    out
}
