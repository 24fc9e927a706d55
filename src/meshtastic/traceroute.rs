//! Parser for the text printed by `meshtastic --traceroute <id>`.
//!
//! ```text
//! Sending traceroute request to !ba4bf9d0 on channelIndex:0 (this could take a while)
//! Route traced towards destination:
//! !aabbccdd --> !1234abcd (6.25dB) --> !ba4bf9d0 (-3.5dB)
//! Route traced back to us:
//! !ba4bf9d0 --> !1234abcd (-1.0dB) --> !aabbccdd (5.75dB)
//! ```
//!
//! Parsing never fails: anything unrecognisable simply contributes no hops.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const FAILURE_PREFIX: &str = "Failed to traceroute";
/// Banner the CLI prints when it gives up waiting for a response.
const ABORT_PREFIX: &str = "Aborting due to";
const RETURN_MARKER: &str = "Route traced back to us:";
const HOP_SEPARATOR: &str = "-->";

/// One radio-to-radio relay with the SNR measured on that link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHop {
    pub from: String,
    pub to: String,
    /// dB
    pub signal_strength: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerouteResult {
    pub outbound_route: Vec<RouteHop>,
    pub inbound_route: Vec<RouteHop>,
    pub success: bool,
}

impl TracerouteResult {
    /// An unsuccessful result with both routes empty.
    pub fn failed() -> Self {
        Self::default()
    }

    /// Render a route the way the CLI prints it, for log lines.
    pub fn describe_route(route: &[RouteHop]) -> String {
        let Some(first) = route.first() else {
            return "(none)".to_string();
        };
        let mut out = first.from.clone();
        for hop in route {
            out.push_str(&format!(" --> {} ({}dB)", hop.to, hop.signal_strength));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outbound,
    Inbound,
}

fn hop_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(![\w]+)\s+\(([+-]?\d+(?:\.\d+)?)dB\)").expect("hop pattern is valid")
    })
}

/// Whether the CLI reported that no route could be traced at all.
fn is_failure(text: &str) -> bool {
    text.trim_start().starts_with(FAILURE_PREFIX)
        || text
            .lines()
            .any(|line| line.trim_start().starts_with(ABORT_PREFIX))
}

/// Match one adjacent pair of `-->` segments.
///
/// The origin is the first token of `origin_segment`. The destination must
/// read `!id (<signed decimal>dB)`; anything else, e.g. the `(?dB)` the CLI
/// prints for an unknown SNR, is not a resolvable hop and yields `None`.
pub fn parse_hop(origin_segment: &str, destination_segment: &str) -> Option<RouteHop> {
    let from = origin_segment.split(' ').next().unwrap_or_default();
    let caps = hop_pattern().captures(destination_segment)?;
    let signal_strength = caps[2].parse::<f64>().ok()?;
    Some(RouteHop {
        from: from.to_string(),
        to: caps[1].to_string(),
        signal_strength,
    })
}

/// Parse traceroute output into outbound and inbound hop sequences.
pub fn parse_traceroute(text: &str) -> TracerouteResult {
    if is_failure(text) {
        return TracerouteResult::failed();
    }

    let mut result = TracerouteResult::default();
    let mut direction = Direction::Outbound;
    for line in text.lines() {
        if line.contains(RETURN_MARKER) {
            direction = Direction::Inbound;
        }
        if !line.contains(HOP_SEPARATOR) {
            continue;
        }
        let segments: Vec<&str> = line.split(HOP_SEPARATOR).map(str::trim).collect();
        let route = match direction {
            Direction::Outbound => &mut result.outbound_route,
            Direction::Inbound => &mut result.inbound_route,
        };
        route.extend(
            segments
                .windows(2)
                .filter_map(|pair| parse_hop(pair[0], pair[1])),
        );
    }

    result.success = !result.outbound_route.is_empty() || !result.inbound_route.is_empty();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hop_reads_id_and_snr() {
        let hop = parse_hop("!aaa (0.0)", "!bbb (-5.2dB)").unwrap();
        assert_eq!(hop.from, "!aaa");
        assert_eq!(hop.to, "!bbb");
        assert_eq!(hop.signal_strength, -5.2);
    }

    #[test]
    fn parse_hop_accepts_integers_and_plus_sign() {
        assert_eq!(parse_hop("!a", "!b (7dB)").unwrap().signal_strength, 7.0);
        assert_eq!(parse_hop("!a", "!b (+3.25dB)").unwrap().signal_strength, 3.25);
    }

    #[test]
    fn parse_hop_skips_unknown_snr_and_annotations() {
        assert_eq!(parse_hop("!a", "!b (?dB)"), None);
        assert_eq!(parse_hop("!a", "done"), None);
        assert_eq!(parse_hop("!a", "!b (-5.2)"), None);
    }

    #[test]
    fn abort_banner_means_no_route() {
        let text = "Sending traceroute request to !1234 on channelIndex:0 (this could take a while)\n\
                    Aborting due to: Timed out waiting for traceroute\n";
        assert_eq!(parse_traceroute(text), TracerouteResult::failed());
    }

    #[test]
    fn describe_route_matches_cli_layout() {
        let result = parse_traceroute("!a --> !b (1.5dB) --> !c (-2dB)");
        assert_eq!(
            TracerouteResult::describe_route(&result.outbound_route),
            "!a --> !b (1.5dB) --> !c (-2dB)"
        );
        assert_eq!(TracerouteResult::describe_route(&[]), "(none)");
    }
}
