use serde::Serialize;
use std::fmt;

/// Display band for a grade or an average on the 0-10 scale.
///
/// | Range          | Band    |
/// |----------------|---------|
/// | < 5            | Danger  |
/// | >= 5 and < 6   | Warning |
/// | >= 6           | Good    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Danger,
    Warning,
    Good,
}

pub fn band(value: f64) -> Band {
    match value {
        v if v < 5.0 => Band::Danger,
        v if v < 6.0 => Band::Warning,
        _ => Band::Good,
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Band::Danger => "danger",
            Band::Warning => "warning",
            Band::Good => "good",
        })
    }
}
