//! Parser for CODEML result reports.
//!
//! A report is free-form text whose sections depend on how the engine was
//! configured. Parsing is a sequence of independent passes over the same
//! lines, each looking for its own landmarks and contributing nothing when
//! they are absent:
//!
//! 1. basics: program version, model headers and the site-class layout,
//! 2. site-class models: one record per `Model N:` block (or a single block),
//! 3. pairwise comparisons from `runmode = -2` runs,
//! 4. amino-acid distance matrices.
//!
//! A report that yields nothing from any pass is rejected.

mod basics;
mod distances;
mod models;
mod pairwise;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{CodemlError, CodemlResult};
use crate::fs::read_lines;

pub use distances::{DistanceMatrix, Distances};
pub use models::{
    BranchEstimates, GeneParameters, ModelParameters, SiteClass, SiteClassModel,
};
pub use pairwise::PairwiseStats;

/// Symmetric `seq_a -> seq_b -> stats` lookup of pairwise comparisons.
pub type PairwiseTable = BTreeMap<String, BTreeMap<String, PairwiseStats>>;

/// Everything extracted from a CODEML report.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CodemlResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codon_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_class_model: Option<String>,
    /// Number of genes when the alignment was analysed as separate data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lnl_max: Option<f64>,
    /// Site-class model results in report order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub site_class_models: Vec<SiteClassModel>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pairwise: PairwiseTable,
    #[serde(skip_serializing_if = "Distances::is_empty")]
    pub distances: Distances,
}

impl CodemlResults {
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.model.is_none()
            && self.codon_model.is_none()
            && self.site_class_model.is_none()
            && self.genes.is_none()
            && self.lnl_max.is_none()
            && self.site_class_models.is_empty()
            && self.pairwise.is_empty()
            && self.distances.is_empty()
    }

    /// Look up a site-class model by its number (e.g. 2 for M2).
    pub fn model_result(&self, number: u32) -> Option<&SiteClassModel> {
        self.site_class_models
            .iter()
            .find(|model| model.number == number)
    }

    /// Statistics for the comparison between two sequences, in either order.
    pub fn pairwise_stats(&self, first: &str, second: &str) -> Option<&PairwiseStats> {
        self.pairwise.get(first)?.get(second)
    }
}

/// Parse the CODEML report at `path`.
pub fn parse_results(path: &Path) -> CodemlResult<CodemlResults> {
    let lines = read_lines(path)?;
    parse_report(&lines, &path.display().to_string())
}

/// Parse a report that has already been split into lines.
pub fn parse_results_lines<S: AsRef<str>>(lines: &[S]) -> CodemlResult<CodemlResults> {
    parse_report(lines, "report")
}

fn parse_report<S: AsRef<str>>(lines: &[S], source: &str) -> CodemlResult<CodemlResults> {
    let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();

    let (mut results, layout) = basics::parse(&lines);
    results.site_class_models = models::parse(&lines, &layout);
    results.pairwise = pairwise::parse(&lines);
    results.distances = distances::parse(&lines);

    debug!(
        source,
        models = results.site_class_models.len(),
        pairs = results.pairwise.len(),
        "parsed codeml report"
    );

    if results.is_empty() {
        return Err(CodemlError::EmptyResult(source.to_owned()));
    }
    Ok(results)
}

static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.\d+").expect("float pattern compiles"));

/// Every decimal number on `line`, in order.
fn line_floats(line: &str) -> Vec<f64> {
    FLOAT
        .find_iter(line)
        .filter_map(|found| found.as_str().parse().ok())
        .collect()
}

/// Byte offset of the first decimal number on `line`.
fn first_float_offset(line: &str) -> Option<usize> {
    FLOAT.find(line).map(|found| found.start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_are_collected_in_order() {
        assert_eq!(
            line_floats("lnL(ntime: 19  np: 22):  -2021.348300      +0.000000"),
            vec![-2021.3483, 0.0]
        );
        assert!(line_floats("Model 1: NearlyNeutral (2 categories)").is_empty());
    }

    #[test]
    fn noise_only_report_is_empty() {
        let err = parse_results_lines(&["", "nothing to see", "   "]).unwrap_err();
        assert!(matches!(err, CodemlError::EmptyResult(_)));
    }

    #[test]
    fn version_alone_is_enough() {
        let results =
            parse_results_lines(&["CODONML (in paml version 4.4, January 2010)  aln.phy"])
                .unwrap();
        assert_eq!(results.version.as_deref(), Some("4.4"));
    }
}
