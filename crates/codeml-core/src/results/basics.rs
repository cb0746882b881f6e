use std::sync::LazyLock;

use regex::Regex;

use super::{line_floats, CodemlResults};

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+ \(in paml version (\d+\.\d+[a-z]*)").expect("version pattern compiles")
});
static MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Model:\s+(.+)").expect("model pattern compiles"));
static GENES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([0-9]+) genes: separate data\)").expect("genes pattern compiles")
});
// "Codon frequencies:" in 4.1, "Codon frequency model:" from 4.3 on.
static CODON_FREQ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Codon frequenc[a-z\s]{3,7}:\s+(.+)").expect("codon pattern compiles")
});
static SITE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Site-class models:\s*(\S*)").expect("site-class pattern compiles")
});
pub(super) static MODEL_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Model (\d+):\s+(.+)").expect("model block pattern compiles")
});

/// How site-class model results are laid out in a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ModelLayout {
    /// One model for the whole report, named by the `Site-class models:`
    /// header when the engine printed one.
    Single { name: Option<String> },
    /// Several `Model N:` blocks, one per requested model.
    Multiple { blocks: usize },
}

/// Extract header fields and work out how model results are laid out.
pub(super) fn parse(lines: &[&str]) -> (CodemlResults, ModelLayout) {
    let mut results = CodemlResults::default();
    let mut site_class_header: Option<String> = None;
    let mut blocks = 0usize;

    for line in lines {
        if let Some(caps) = VERSION.captures(line) {
            results.version = Some(caps[1].to_owned());
            continue;
        }

        if let Some(caps) = MODEL.captures(line) {
            results.model = Some(caps[1].trim().to_owned());
        }

        if let Some(caps) = GENES.captures(line) {
            results.genes = caps[1].parse().ok();
            continue;
        }

        if let Some(caps) = CODON_FREQ.captures(line) {
            results.codon_model = Some(caps[1].trim().to_owned());
            continue;
        }

        if let Some(caps) = SITE_CLASS.captures(line) {
            site_class_header = Some(caps[1].to_owned());
        }

        if MODEL_BLOCK.is_match(line) {
            blocks += 1;
        }

        if line.contains("ln Lmax") {
            if let Some(value) = line_floats(line).first() {
                results.lnl_max = Some(*value);
            }
        }
    }

    let layout = match site_class_header {
        Some(name) if !name.is_empty() && blocks < 2 => {
            results.site_class_model = Some(name.clone());
            ModelLayout::Single { name: Some(name) }
        }
        Some(_) => ModelLayout::Multiple { blocks },
        None if blocks >= 2 => ModelLayout::Multiple { blocks },
        None => ModelLayout::Single { name: None },
    };

    (results, layout)
}
