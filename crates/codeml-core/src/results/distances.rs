use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::{first_float_offset, line_floats};

/// Symmetric `seq_a -> seq_b -> distance` table.
pub type DistanceMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Amino-acid distance matrices printed for protein alignments.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Distances {
    /// Raw proportions of differing sites.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub raw: DistanceMatrix,
    /// Maximum-likelihood distances.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ml: DistanceMatrix,
}

impl Distances {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.ml.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatrixKind {
    Raw,
    Ml,
}

struct OpenMatrix {
    kind: MatrixKind,
    sequences: Vec<String>,
}

/// Extract the lower-triangular distance matrices.
///
/// A matrix starts at its heading and ends at the first blank line after
/// its first row. Each row is a sequence name followed by its distances to
/// every earlier row.
pub(super) fn parse(lines: &[&str]) -> Distances {
    let mut distances = Distances::default();
    let mut open: Option<OpenMatrix> = None;

    for line in lines {
        if line.contains("AA distances") {
            open = Some(OpenMatrix::new(MatrixKind::Raw));
            continue;
        }
        if line.contains("ML distances of aa seqs.") {
            open = Some(OpenMatrix::new(MatrixKind::Ml));
            continue;
        }

        let Some(matrix) = open.as_mut() else {
            continue;
        };

        if line.trim().is_empty() {
            if !matrix.sequences.is_empty() {
                open = None;
            }
            continue;
        }

        let name = match first_float_offset(line) {
            Some(offset) => line[..offset].trim(),
            None => line.trim(),
        };
        if name.is_empty() {
            warn!(line = *line, "skipping distance row without a sequence name");
            continue;
        }

        let target = match matrix.kind {
            MatrixKind::Raw => &mut distances.raw,
            MatrixKind::Ml => &mut distances.ml,
        };
        matrix.add_row(target, name, &line_floats(line));
    }

    debug!(
        raw = distances.raw.len(),
        ml = distances.ml.len(),
        "extracted distance matrices"
    );
    distances
}

impl OpenMatrix {
    fn new(kind: MatrixKind) -> Self {
        OpenMatrix {
            kind,
            sequences: Vec::new(),
        }
    }

    fn add_row(&mut self, target: &mut DistanceMatrix, name: &str, values: &[f64]) {
        target.entry(name.to_owned()).or_default();
        for (other, value) in self.sequences.iter().zip(values) {
            if let Some(row) = target.get_mut(name) {
                row.insert(other.clone(), *value);
            }
            target
                .entry(other.clone())
                .or_default()
                .insert(name.to_owned(), *value);
        }
        if !self.sequences.iter().any(|seen| seen == name) {
            self.sequences.push(name.to_owned());
        }
    }
}
