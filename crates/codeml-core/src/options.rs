//! Typed option model for CODEML control files.
//!
//! The key set is closed: [`OptionKey`] enumerates every option the engine
//! understands, in the order they are written to a control file. Each key
//! carries a [`ValueKind`] describing its intrinsic domain, while the stored
//! [`OptionValue`] keeps whatever the caller (or the control-file reader)
//! supplied. `None` marks an option as unset; unset options are never
//! written out.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CodemlError, CodemlResult};

/// Every option recognised in a CODEML control file, in emission order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum OptionKey {
    Noisy,
    Verbose,
    RunMode,
    SeqType,
    CodonFreq,
    NData,
    Clock,
    AaDist,
    AaRateFile,
    Model,
    NsSites,
    ICode,
    MGene,
    FixKappa,
    Kappa,
    FixOmega,
    Omega,
    FixAlpha,
    Alpha,
    MAlpha,
    NCatG,
    GetSe,
    RateAncestor,
    SmallDiff,
    CleanData,
    FixBlength,
    Method,
}

impl OptionKey {
    pub const ALL: &'static [OptionKey] = &[
        OptionKey::Noisy,
        OptionKey::Verbose,
        OptionKey::RunMode,
        OptionKey::SeqType,
        OptionKey::CodonFreq,
        OptionKey::NData,
        OptionKey::Clock,
        OptionKey::AaDist,
        OptionKey::AaRateFile,
        OptionKey::Model,
        OptionKey::NsSites,
        OptionKey::ICode,
        OptionKey::MGene,
        OptionKey::FixKappa,
        OptionKey::Kappa,
        OptionKey::FixOmega,
        OptionKey::Omega,
        OptionKey::FixAlpha,
        OptionKey::Alpha,
        OptionKey::MAlpha,
        OptionKey::NCatG,
        OptionKey::GetSe,
        OptionKey::RateAncestor,
        OptionKey::SmallDiff,
        OptionKey::CleanData,
        OptionKey::FixBlength,
        OptionKey::Method,
    ];

    /// Name of the option as spelled in a control file.
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Noisy => "noisy",
            OptionKey::Verbose => "verbose",
            OptionKey::RunMode => "runmode",
            OptionKey::SeqType => "seqtype",
            OptionKey::CodonFreq => "CodonFreq",
            OptionKey::NData => "ndata",
            OptionKey::Clock => "clock",
            OptionKey::AaDist => "aaDist",
            OptionKey::AaRateFile => "aaRatefile",
            OptionKey::Model => "model",
            OptionKey::NsSites => "NSsites",
            OptionKey::ICode => "icode",
            OptionKey::MGene => "Mgene",
            OptionKey::FixKappa => "fix_kappa",
            OptionKey::Kappa => "kappa",
            OptionKey::FixOmega => "fix_omega",
            OptionKey::Omega => "omega",
            OptionKey::FixAlpha => "fix_alpha",
            OptionKey::Alpha => "alpha",
            OptionKey::MAlpha => "Malpha",
            OptionKey::NCatG => "ncatG",
            OptionKey::GetSe => "getSE",
            OptionKey::RateAncestor => "RateAncestor",
            OptionKey::SmallDiff => "Small_Diff",
            OptionKey::CleanData => "cleandata",
            OptionKey::FixBlength => "fix_blength",
            OptionKey::Method => "method",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            OptionKey::AaRateFile => ValueKind::Text,
            OptionKey::NsSites => ValueKind::SiteClasses,
            OptionKey::Kappa | OptionKey::Omega | OptionKey::Alpha | OptionKey::SmallDiff => {
                ValueKind::Real
            }
            OptionKey::Verbose
            | OptionKey::FixKappa
            | OptionKey::FixOmega
            | OptionKey::FixAlpha
            | OptionKey::MAlpha
            | OptionKey::GetSe
            | OptionKey::CleanData => ValueKind::Toggle,
            _ => ValueKind::Integer,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn default_value(self) -> Option<OptionValue> {
        let value = match self {
            OptionKey::Noisy => OptionValue::Int(9),
            OptionKey::Verbose => OptionValue::Int(1),
            OptionKey::RunMode => OptionValue::Int(0),
            OptionKey::SeqType => OptionValue::Int(2),
            OptionKey::CodonFreq => OptionValue::Int(2),
            OptionKey::NData => return None,
            OptionKey::Clock => OptionValue::Int(0),
            OptionKey::AaDist => OptionValue::Int(0),
            OptionKey::AaRateFile => OptionValue::Text("dat/jones.dat".into()),
            OptionKey::Model => OptionValue::Int(2),
            OptionKey::NsSites => OptionValue::SiteClasses(vec![0]),
            OptionKey::ICode => OptionValue::Int(0),
            OptionKey::MGene => OptionValue::Int(0),
            OptionKey::FixKappa => OptionValue::Int(0),
            OptionKey::Kappa => OptionValue::Int(2),
            OptionKey::FixOmega => OptionValue::Int(0),
            OptionKey::Omega => OptionValue::Real(0.4),
            OptionKey::FixAlpha => OptionValue::Int(1),
            OptionKey::Alpha => OptionValue::Int(0),
            OptionKey::MAlpha => OptionValue::Int(0),
            OptionKey::NCatG => OptionValue::Int(8),
            OptionKey::GetSe => OptionValue::Int(0),
            OptionKey::RateAncestor => OptionValue::Int(1),
            OptionKey::SmallDiff => OptionValue::Real(0.5e-6),
            OptionKey::CleanData => OptionValue::Int(1),
            OptionKey::FixBlength => return None,
            OptionKey::Method => OptionValue::Int(0),
        };
        Some(value)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = CodemlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OptionKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| CodemlError::InvalidOption(value.to_owned()))
    }
}

/// Intrinsic domain of an option.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Integer,
    Real,
    Text,
    /// Integer used as an on/off switch.
    Toggle,
    SiteClasses,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Integer => "an integer",
            ValueKind::Real => "a real number",
            ValueKind::Text => "a file name",
            ValueKind::Toggle => "0 or 1",
            ValueKind::SiteClasses => "a list of site classes",
        })
    }
}

/// A value assigned to an option.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Real(f64),
    Text(String),
    SiteClasses(Vec<i64>),
}

impl OptionValue {
    /// Infer a scalar value from control-file text.
    ///
    /// Text containing a decimal point is tried as a real, anything else as
    /// an integer; when the conversion fails the raw text is kept.
    pub fn infer(raw: &str) -> OptionValue {
        if raw.contains('.') {
            raw.parse::<f64>()
                .map(OptionValue::Real)
                .unwrap_or_else(|_| OptionValue::Text(raw.to_owned()))
        } else {
            raw.parse::<i64>()
                .map(OptionValue::Int)
                .unwrap_or_else(|_| OptionValue::Text(raw.to_owned()))
        }
    }

    /// Parse `raw` the way a control file assigns it to `key`.
    pub fn parse_for(key: OptionKey, raw: &str) -> CodemlResult<OptionValue> {
        match key.kind() {
            ValueKind::SiteClasses => Self::parse_site_classes(raw),
            _ => Ok(Self::infer(raw)),
        }
    }

    /// Parse a whitespace separated list of site-class model numbers.
    ///
    /// An empty list is rejected as a blank site class.
    pub fn parse_site_classes(raw: &str) -> CodemlResult<OptionValue> {
        let classes = raw
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<i64>()
                    .map_err(|_| CodemlError::SiteClass(token.to_owned()))
            })
            .collect::<CodemlResult<Vec<_>>>()?;
        if classes.is_empty() {
            return Err(CodemlError::SiteClass(String::new()));
        }
        Ok(OptionValue::SiteClasses(classes))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(value) => write!(f, "{value}"),
            OptionValue::Real(value) => f.write_str(&format_real(*value)),
            OptionValue::Text(value) => f.write_str(value),
            OptionValue::SiteClasses(values) => {
                let joined = values
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                f.write_str(&joined)
            }
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Real(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<Vec<i64>> for OptionValue {
    fn from(value: Vec<i64>) -> Self {
        OptionValue::SiteClasses(value)
    }
}

// Finite reals always carry a decimal point so they are read back as reals.
fn format_real(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Current value of every CODEML option.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    values: Vec<Option<OptionValue>>,
}

impl Options {
    /// Options with every key unset.
    pub fn unset() -> Self {
        Options {
            values: vec![None; OptionKey::ALL.len()],
        }
    }

    pub fn get(&self, name: &str) -> CodemlResult<Option<&OptionValue>> {
        let key = name.parse::<OptionKey>()?;
        Ok(self.get_key(key))
    }

    pub fn get_key(&self, key: OptionKey) -> Option<&OptionValue> {
        self.values[key.index()].as_ref()
    }

    /// Assign `value` to the option called `name`; `None` unsets it.
    pub fn set(&mut self, name: &str, value: impl Into<Option<OptionValue>>) -> CodemlResult<()> {
        let key = name.parse::<OptionKey>()?;
        self.set_key(key, value)
    }

    /// Assign `value` to `key` as-is.
    ///
    /// No numeric coercion happens here. Values are only checked for what a
    /// control file can hold: lists go to `NSsites` and nowhere else, a list
    /// needs at least one class, and text must survive a write and re-read.
    pub fn set_key(
        &mut self,
        key: OptionKey,
        value: impl Into<Option<OptionValue>>,
    ) -> CodemlResult<()> {
        let value = value.into();
        if let Some(value) = &value {
            check_value(key, value)?;
        }
        self.values[key.index()] = value;
        Ok(())
    }

    /// Ordered view of every option, unset ones included.
    pub fn snapshot(&self) -> impl Iterator<Item = (OptionKey, Option<&OptionValue>)> + '_ {
        OptionKey::ALL
            .iter()
            .map(move |key| (*key, self.values[key.index()].as_ref()))
    }

    /// Options that will be written to a control file.
    pub fn assigned(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> + '_ {
        self.snapshot()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
    }

    /// Human-readable listing of every option, one `key = value` per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.snapshot() {
            match value {
                Some(value) => out.push_str(&format!("{key} = {value}\n")),
                None => out.push_str(&format!("{key} = None\n")),
            }
        }
        out
    }
}

fn check_value(key: OptionKey, value: &OptionValue) -> CodemlResult<()> {
    let invalid = |reason: String| CodemlError::InvalidValue {
        key: key.as_str().to_owned(),
        reason,
    };

    let is_list = matches!(value, OptionValue::SiteClasses(_));
    let wants_list = key.kind() == ValueKind::SiteClasses;
    if is_list != wants_list {
        return Err(invalid(format!("expected {}, got '{value}'", key.kind())));
    }

    match value {
        OptionValue::SiteClasses(classes) if classes.is_empty() => {
            Err(CodemlError::SiteClass(String::new()))
        }
        OptionValue::Text(text) => {
            if let Some(bad) = text.chars().find(|c| UNWRITABLE.contains(c)) {
                Err(invalid(format!("text may not contain {bad:?}")))
            } else if text.trim() != text {
                Err(invalid("text may not start or end with whitespace".into()))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

// Characters that would end the value or start another line when written.
const UNWRITABLE: [char; 4] = ['*', '=', '\n', '\r'];

impl Default for Options {
    fn default() -> Self {
        Options {
            values: OptionKey::ALL
                .iter()
                .map(|key| key.default_value())
                .collect(),
        }
    }
}
