use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{line_floats, PairwiseTable};

// "2 (Pan_troglo) ... 1 (Homo_sapie)"
static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+ \((.+)\) \.\.\. \d+ \((.+)\)").expect("pair pattern compiles")
});

/// Maximum-likelihood comparison of two sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PairwiseStats {
    #[serde(rename = "lnL", skip_serializing_if = "Option::is_none")]
    pub lnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(rename = "S", skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    #[serde(rename = "N", skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    #[serde(rename = "dN", skip_serializing_if = "Option::is_none")]
    pub dn: Option<f64>,
    #[serde(rename = "dS", skip_serializing_if = "Option::is_none")]
    pub ds: Option<f64>,
}

/// Extract `runmode = -2` pairwise comparisons.
///
/// Each comparison starts with a `N (name) ... M (name)` header, followed by
/// an `lnL =` line and a `t= S= N= dN/dS= dN= dS=` summary line.
pub(super) fn parse(lines: &[&str]) -> PairwiseTable {
    let mut comparisons: Vec<((String, String), PairwiseStats)> = Vec::new();

    for line in lines {
        if let Some(caps) = PAIR.captures(line) {
            let pair = (caps[1].trim().to_owned(), caps[2].trim().to_owned());
            comparisons.push((pair, PairwiseStats::default()));
            continue;
        }

        let Some((_, stats)) = comparisons.last_mut() else {
            continue;
        };
        let floats = line_floats(line);

        if line.contains("lnL") && !floats.is_empty() {
            stats.lnl = Some(floats[0]);
        } else if line.contains("dN/dS=") {
            if let [t, s, n, omega, dn, ds] = floats.as_slice() {
                stats.t = Some(*t);
                stats.s = Some(*s);
                stats.n = Some(*n);
                stats.omega = Some(*omega);
                stats.dn = Some(*dn);
                stats.ds = Some(*ds);
            }
        }
    }

    debug!(count = comparisons.len(), "extracted pairwise comparisons");

    let mut table: PairwiseTable = BTreeMap::new();
    for ((first, second), stats) in comparisons {
        table
            .entry(second.clone())
            .or_default()
            .insert(first.clone(), stats);
        table.entry(first).or_default().insert(second, stats);
    }
    table
}
