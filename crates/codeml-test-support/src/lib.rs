//! Shared fixtures for codeml crate tests.
//!
//! The reports are trimmed-down engine output: enough of each section for
//! the parser to find its landmarks, nothing more.

use std::fs;
use std::path::{Path, PathBuf};

/// A control file in the layout the engine ships, comments included.
pub const SAMPLE_CONTROL_FILE: &str = "\
      seqfile = alignment.phylip * sequence data filename
     treefile = species.tree
      outfile = results.out   * main result file name

        noisy = 9   * 0,1,2,3,9: how much rubbish on the screen
      verbose = 1
      runmode = 0

      seqtype = 1   * 1:codons; 2:AAs; 3:codons-->AAs
    CodonFreq = 2
        model = 0
      NSsites = 0 1 2
        icode = 0
    fix_kappa = 0
        kappa = 2
    fix_omega = 0
        omega = .4
    cleandata = 1
   Small_Diff = .5e-6
";

/// Three site-class models (M0, M1a, M2a) from one `NSsites = 0 1 2` run.
pub const MULTI_MODEL_REPORT: &str = "\
CODONML (in paml version 4.9j, February 2020)  alignment.phylip
Model: One dN/dS ratio, 
Codon frequency model: F3x4
Site-class models: 
ns =   3  ls = 176

Model 0: one-ratio

TREE #  1:  (1, 2, 3);   MP score: 14
lnL(ntime:  3  np:  5):   -902.510018      +0.000000
   0.01262   0.00100   0.03000   2.06281   0.25122

tree length =   0.04362

(1: 0.01262, 2: 0.00100, 3: 0.03000);

Detailed output identifying parameters

kappa (ts/tv) =  2.06281

omega (dN/dS) =  0.25122

dS tree:
(1: 0.04000, 2: 0.00300, 3: 0.09000);
dN tree:
(1: 0.01000, 2: 0.00080, 3: 0.02300);

Model 1: NearlyNeutral (2 categories)

TREE #  1:  (1, 2, 3);   MP score: 14
lnL(ntime:  3  np:  6):   -899.101322      +0.000000
   0.01300   0.00110   0.03100   2.10000   0.77615   0.10224

tree length =   0.04510

(1: 0.01300, 2: 0.00110, 3: 0.03100);

Detailed output identifying parameters

kappa (ts/tv) =  2.10000

dN/dS (w) for site classes (K=2)

p:   0.77615  0.22385
w:   0.10224  1.00000

Model 2: PositiveSelection (3 categories)

TREE #  1:  (1, 2, 3);   MP score: 14
lnL(ntime:  3  np:  8):   -898.872040      +0.000000
   0.01310   0.00110   0.03150   2.12000   0.77000   0.20000   0.10000   3.10000

tree length =   0.04570

(1: 0.01310, 2: 0.00110, 3: 0.03150);

Detailed output identifying parameters

kappa (ts/tv) =  2.12000

dN/dS (w) for site classes (K=3)

p:   0.77000  0.20000  0.03000
w:   0.10000  1.00000  3.10000

Time used:  0:02
";

/// One named site-class model, with standard errors and a branch table.
pub const SINGLE_MODEL_REPORT: &str = "\
CODONML (in paml version 4.4, January 2010)  alignment.phylip
Model: One dN/dS ratio, 
Codon frequency model: F3x4
Site-class models:  NearlyNeutral
ns =   3  ls = 176

TREE #  1:  (1, 2, 3);   MP score: 14
lnL(ntime:  3  np:  6):   -899.101322      +0.000000
   0.01300   0.00110   0.03100   2.10000   0.77615   0.10224
SEs for parameters:
   0.00200   0.00020   0.00400   0.30000   0.05000   0.02000

tree length =   0.04510

(1: 0.01300, 2: 0.00110, 3: 0.03100);

kappa (ts/tv) =  2.10000

p:   0.77615  0.22385
w:   0.10224  1.00000

 branch          t       N       S   dN/dS      dN      dS  N*dN  S*dS

   4..1      0.013   167.7    54.3  0.2512  0.0030  0.0120   0.5   0.7
   4..2      0.001   167.7    54.3  0.2512  0.0002  0.0009   0.0   0.1
";

/// A `runmode = -2` report comparing three sequences.
pub const PAIRWISE_REPORT: &str = "\
CODONML (in paml version 4.9j, February 2020)  alignment.phylip
Model: One dN/dS ratio, 
Codon frequency model: F3x4

pairwise comparison, codon frequencies: F3x4.


2 (Pan_troglo) ... 1 (Homo_sapie)
lnL = -291.465693
  0.01262 999.00000  0.00100

t= 0.0126  S=    81.4  N=   140.6  dN/dS= 0.0010  dN= 0.0000  dS= 0.0115


3 (Gorilla_go) ... 1 (Homo_sapie)
lnL = -301.234567
  0.02400  2.00000  0.25000

t= 0.0240  S=    81.0  N=   141.0  dN/dS= 0.2500  dN= 0.0040  dS= 0.0160


3 (Gorilla_go) ... 2 (Pan_troglo)
lnL = -298.765432
  0.02100  2.10000  0.30000

t= 0.0210  S=    80.9  N=   141.1  dN/dS= 0.3000  dN= 0.0042  dS= 0.0140
";

/// Amino-acid distance matrices from a protein alignment.
pub const AA_DISTANCE_REPORT: &str = "\
AAML (in paml version 4.9j, February 2020)  proteins.phylip
AA distances (raw proportions of different sites)

Homo_sapie  
Pan_troglo       0.0121
Gorilla_go       0.0162  0.0121

ML distances of aa seqs.

Homo_sapie  
Pan_troglo       0.0122
Gorilla_go       0.0164  0.0122

TREE #  1:  ((1, 2), 3);   MP score: -1
";

/// Output with none of the landmarks the parser looks for.
pub const EMPTY_REPORT: &str = "\

nothing to report here

";

/// Write `contents` to `dir/name` and return the full path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}
