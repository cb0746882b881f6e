use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::basics::{ModelLayout, MODEL_BLOCK};
use super::line_floats;

static TREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\([\w #:',.()]*\);\s*$").expect("tree pattern compiles")
});
static BRANCH_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\d+\.\.\d+)[\s+\d+\.\d+]+").expect("branch row pattern compiles")
});
static PARAM_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^lnL\(ntime:\s+\d+\s+np:\s+(\d+)\)").expect("np pattern compiles")
});
// Named parameters such as "p0=  0.99043  p=  0.36657 q=  1.04445". A name
// glued to a bracket, as in "(p1=  0.00957)", is not picked up.
static NAMED_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([a-z]\d?)\s*=\s+(\d+\.\d+)").expect("parameter pattern compiles")
});
static GENE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^gene # (\d+)").expect("gene pattern compiles"));
static BRANCH_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"branch type (\d+)").expect("branch type pattern compiles"));
static SITE_CLASS_OMEGA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}\.\d{5}").expect("omega pattern compiles"));

/// Results for one site-class (NSsites) model.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SiteClassModel {
    pub number: u32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dn_tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omega_tree: Option<String>,
    #[serde(skip_serializing_if = "ModelParameters::is_empty")]
    pub parameters: ModelParameters,
}

impl SiteClassModel {
    fn new(number: u32, description: impl Into<String>) -> Self {
        SiteClassModel {
            number,
            description: description.into(),
            ..SiteClassModel::default()
        }
    }
}

/// Parameter estimates reported for a model.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ModelParameters {
    /// The raw estimate line, in the layout `in.codeml` expects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_errors: Option<String>,
    /// Relative rates per gene; the first gene is the reference at 1.0.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gene_rates: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kappa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    /// Per-branch-class omegas of branch models (`w (dN/dS) for branches`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_omegas: Vec<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub genes: BTreeMap<u32, GeneParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dn_tree_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_tree_length: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub site_classes: Vec<SiteClass>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub branches: BTreeMap<String, BranchEstimates>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub named: BTreeMap<String, f64>,
}

impl ModelParameters {
    pub fn is_empty(&self) -> bool {
        *self == ModelParameters::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeneParameters {
    pub kappa: f64,
    pub omega: f64,
}

/// One site class of a site or branch-site model.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SiteClass {
    pub proportion: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    /// Clade model C omegas keyed by branch type.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub branch_types: BTreeMap<u32, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_omega: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_omega: Option<f64>,
}

/// A row of the per-branch dN/dS table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BranchEstimates {
    pub t: f64,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "S")]
    pub s: f64,
    pub omega: f64,
    #[serde(rename = "dN")]
    pub dn: f64,
    #[serde(rename = "dS")]
    pub ds: f64,
    #[serde(rename = "N*dN")]
    pub n_dn: f64,
    #[serde(rename = "S*dS")]
    pub s_ds: f64,
}

/// Extract every site-class model present in the report, in report order.
pub(super) fn parse(lines: &[&str], layout: &ModelLayout) -> Vec<SiteClassModel> {
    let models = match layout {
        ModelLayout::Single { name } => {
            let description = name.as_deref().unwrap_or("one-ratio");
            let mut model = SiteClassModel::new(model_number(description), description);
            parse_block(lines, &mut model);
            // Without a likelihood line the report holds no model fit at all
            // (pairwise or distance-only runs).
            if model.lnl.is_some() {
                vec![model]
            } else {
                Vec::new()
            }
        }
        ModelLayout::Multiple { blocks } => {
            debug!(blocks, "splitting report into model blocks");
            let mut collector = BlockCollector::default();
            for (idx, line) in lines.iter().enumerate() {
                if let Some(caps) = MODEL_BLOCK.captures(line) {
                    let Ok(number) = caps[1].parse::<u32>() else {
                        warn!(line = *line, "skipping model header with invalid number");
                        continue;
                    };
                    collector.enter_block(idx, SiteClassModel::new(number, caps[2].trim()));
                }
            }
            collector
                .finalize(lines.len())
                .into_iter()
                .map(|(range, mut model)| {
                    parse_block(&lines[range], &mut model);
                    model
                })
                .collect()
        }
    };

    debug!(count = models.len(), "extracted site-class models");
    models
}

/// Engine numbering of the named site-class models.
fn model_number(name: &str) -> u32 {
    match name {
        "one-ratio" => 0,
        "NearlyNeutral" => 1,
        "PositiveSelection" => 2,
        "discrete" => 3,
        "freqs" => 4,
        "gamma" => 5,
        "2gamma" => 6,
        "beta" => 7,
        "beta&w>1" => 8,
        "beta&gamma" => 9,
        "beta&gamma+1" => 10,
        "beta&normal>1" => 11,
        "0&2normal>1" => 12,
        "3normal>0" => 13,
        "M2a_rel" => 22,
        _ => 0,
    }
}

/// Splits a report into `Model N:` blocks, each running to the next header.
#[derive(Default)]
struct BlockCollector {
    finished: Vec<(std::ops::Range<usize>, SiteClassModel)>,
    current: Option<(usize, SiteClassModel)>,
}

impl BlockCollector {
    fn enter_block(&mut self, start: usize, model: SiteClassModel) {
        self.exit_block(start);
        self.current = Some((start, model));
    }

    fn exit_block(&mut self, end: usize) {
        if let Some((start, model)) = self.current.take() {
            self.finished.push((start..end, model));
        }
    }

    fn finalize(mut self, end: usize) -> Vec<(std::ops::Range<usize>, SiteClassModel)> {
        self.exit_block(end);
        self.finished
    }
}

#[derive(Default)]
struct BlockState {
    param_count: Option<usize>,
    expect_standard_errors: bool,
    expect_ds_tree: bool,
    expect_dn_tree: bool,
    expect_omega_tree: bool,
}

fn parse_block(lines: &[&str], model: &mut SiteClassModel) {
    let mut state = BlockState::default();
    let params = &mut model.parameters;

    for line in lines {
        let floats = line_floats(line);

        if line.contains("lnL(ntime:") && !floats.is_empty() {
            model.lnl = Some(floats[0]);
            if let Some(caps) = PARAM_COUNT.captures(line) {
                state.param_count = caps[1].parse().ok();
            }
        } else if Some(floats.len()) == state.param_count && !state.expect_standard_errors {
            params.parameter_list = Some(line.trim().to_owned());
        } else if line.contains("SEs for parameters:") {
            state.expect_standard_errors = true;
        } else if state.expect_standard_errors && Some(floats.len()) == state.param_count {
            params.standard_errors = Some(line.trim().to_owned());
            state.expect_standard_errors = false;
        } else if line.contains("tree length =") && !floats.is_empty() {
            model.tree_length = Some(floats[0]);
        } else if TREE.is_match(line) {
            // Only trees annotated with lengths or labels are worth keeping.
            if line.contains(':') || line.contains('#') {
                let tree = Some(line.trim().to_owned());
                if state.expect_ds_tree {
                    model.ds_tree = tree;
                    state.expect_ds_tree = false;
                } else if state.expect_dn_tree {
                    model.dn_tree = tree;
                    state.expect_dn_tree = false;
                } else if state.expect_omega_tree {
                    model.omega_tree = tree;
                    state.expect_omega_tree = false;
                } else {
                    model.tree = tree;
                }
            }
        } else if line.contains("dS tree:") {
            state.expect_ds_tree = true;
        } else if line.contains("dN tree:") {
            state.expect_dn_tree = true;
        } else if line.contains("w ratios as labels for TreeView:") {
            state.expect_omega_tree = true;
        } else if line.contains("rates for") && !floats.is_empty() {
            let mut rates = Vec::with_capacity(floats.len() + 1);
            rates.push(1.0);
            rates.extend_from_slice(&floats);
            params.gene_rates = rates;
        } else if line.contains("kappa (ts/tv)") && !floats.is_empty() {
            params.kappa = Some(floats[0]);
        } else if line.contains("omega (dN/dS)") && !floats.is_empty() {
            params.omega = Some(floats[0]);
        } else if line.contains("w (dN/dS)") && !floats.is_empty() {
            params.branch_omegas = floats;
        } else if let Some(caps) = GENE.captures(line) {
            if let (Ok(gene), [kappa, omega, ..]) = (caps[1].parse::<u32>(), floats.as_slice()) {
                params.genes.insert(
                    gene,
                    GeneParameters {
                        kappa: *kappa,
                        omega: *omega,
                    },
                );
            }
        } else if line.contains("tree length for dN") && !floats.is_empty() {
            params.dn_tree_length = Some(floats[0]);
        } else if line.contains("tree length for dS") && !floats.is_empty() {
            params.ds_tree_length = Some(floats[0]);
        } else if line.starts_with("p:") || line.starts_with("proportion") {
            params.site_classes = floats
                .iter()
                .map(|proportion| SiteClass {
                    proportion: *proportion,
                    ..SiteClass::default()
                })
                .collect();
        } else if line.starts_with("w:") {
            let omegas = SITE_CLASS_OMEGA
                .find_iter(line)
                .filter_map(|found| found.as_str().parse::<f64>().ok());
            for (class, omega) in params.site_classes.iter_mut().zip(omegas) {
                class.omega = Some(omega);
            }
        } else if line.contains("branch type ") {
            if let Some(caps) = BRANCH_TYPE.captures(line) {
                if let Ok(branch_type) = caps[1].parse::<u32>() {
                    // The branch type number itself is not a float, so every
                    // float on the line is a per-class omega.
                    for (class, omega) in params.site_classes.iter_mut().zip(&floats) {
                        class.branch_types.insert(branch_type, *omega);
                    }
                }
            }
        } else if line.starts_with("foreground w") {
            for (class, omega) in params.site_classes.iter_mut().zip(&floats) {
                class.foreground_omega = Some(*omega);
            }
        } else if line.starts_with("background w") {
            for (class, omega) in params.site_classes.iter_mut().zip(&floats) {
                class.background_omega = Some(*omega);
            }
        } else if let (Some(caps), false) = (BRANCH_ROW.captures(line), floats.is_empty()) {
            match parse_branch_row(line) {
                Some(row) => {
                    params.branches.insert(caps[1].to_owned(), row);
                }
                None => warn!(line = *line, "skipping malformed branch row"),
            }
        } else {
            for caps in NAMED_PARAM.captures_iter(line) {
                if let Ok(value) = caps[2].parse::<f64>() {
                    params.named.insert(caps[1].to_owned(), value);
                }
            }
        }
    }
}

// Parsed by column rather than with `line_floats` because rows may hold
// `nan`, which the decimal pattern skips and would shift every column.
fn parse_branch_row(line: &str) -> Option<BranchEstimates> {
    let columns: Vec<f64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    let [t, n, s, omega, dn, ds, n_dn, s_ds] = columns.as_slice() else {
        return None;
    };
    Some(BranchEstimates {
        t: *t,
        n: *n,
        s: *s,
        omega: *omega,
        dn: *dn,
        ds: *ds,
        n_dn: *n_dn,
        s_ds: *s_ds,
    })
}
