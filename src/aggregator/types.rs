//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies a grading period. Upstream sends either a number or a label.
///
/// Keys are normalised so `1`, `1.0` and `"1"` name the same period: any
/// integral value becomes `Number`, anything else keeps its text as `Label`.
/// Numeric periods sort before labelled ones, numbers ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum PeriodKey {
    Number(i64),
    Label(String),
}

impl PeriodKey {
    /// `Number` when `text` is the canonical spelling of an integer, else `Label`.
    pub fn parse(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => PeriodKey::Number(n),
            _ => PeriodKey::Label(text.to_string()),
        }
    }

    fn from_float(v: f64) -> Self {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            PeriodKey::Number(v as i64)
        } else {
            PeriodKey::Label(v.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PeriodKeyVisitor;

        impl serde::de::Visitor<'_> for PeriodKeyVisitor {
            type Value = PeriodKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a period number or label")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<PeriodKey, E> {
                Ok(PeriodKey::Number(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<PeriodKey, E> {
                Ok(i64::try_from(v)
                    .map(PeriodKey::Number)
                    .unwrap_or_else(|_| PeriodKey::Label(v.to_string())))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<PeriodKey, E> {
                Ok(PeriodKey::from_float(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<PeriodKey, E> {
                Ok(PeriodKey::parse(v))
            }
        }

        deserializer.deserialize_any(PeriodKeyVisitor)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Number(n) => write!(f, "{n}"),
            PeriodKey::Label(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PeriodKey {
    fn from(n: i64) -> Self {
        PeriodKey::Number(n)
    }
}

impl From<&str> for PeriodKey {
    fn from(s: &str) -> Self {
        PeriodKey::parse(s)
    }
}

/// A single grade event as returned by the upstream grades endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub period_pos: PeriodKey,
    pub subject_desc: String,
    #[serde(default)]
    pub decimal_value: Option<f64>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub no_average: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub evt_date: Option<String>,
    #[serde(default)]
    pub notes_for_family: Option<String>,
    #[serde(default)]
    pub component_desc: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
}

impl Default for PeriodKey {
    fn default() -> Self {
        PeriodKey::Number(1)
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// A retained grade, carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeDetail {
    pub decimal_value: f64,
    pub evt_date: Option<String>,
    pub notes_for_family: Option<String>,
    pub component_desc: Option<String>,
    pub teacher_name: Option<String>,
}

/// Statistics for one subject within one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub count: usize,
    pub grades: Vec<GradeDetail>,
    pub average: f64,
    /// Grade the next assessment needs for the average to reach 6.0.
    /// `None` once the average is already there.
    pub needed_for_6: Option<f64>,
}

impl SubjectSummary {
    pub fn values(&self) -> Vec<f64> {
        self.grades.iter().map(|g| g.decimal_value).collect()
    }
}

/// All subjects of one period plus the flattened period average.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub subjects: BTreeMap<String, SubjectSummary>,
    pub period_average: f64,
}

impl PeriodSummary {
    pub fn subject(&self, name: &str) -> Option<&SubjectSummary> {
        self.subjects.get(name)
    }

    /// Number of retained grades across every subject of the period.
    pub fn grade_count(&self) -> usize {
        self.subjects.values().map(|s| s.count).sum()
    }
}

/// Complete aggregation result, consumed by the report layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub periods: BTreeMap<PeriodKey, PeriodSummary>,
    pub overall_average: f64,
}

impl AggregateResult {
    pub fn period(&self, key: impl Into<PeriodKey>) -> Option<&PeriodSummary> {
        self.periods.get(&key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Number of retained grades across every period.
    pub fn grade_count(&self) -> usize {
        self.periods.values().map(PeriodSummary::grade_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(value: serde_json::Value) -> PeriodKey {
        PeriodKey::deserialize(value).unwrap()
    }

    #[test]
    fn test_integral_keys_are_numbers() {
        assert_eq!(key(json!(1)), PeriodKey::Number(1));
        assert_eq!(key(json!("1")), PeriodKey::Number(1));
        assert_eq!(key(json!(2.0)), PeriodKey::Number(2));
        assert_eq!(key(json!(-3)), PeriodKey::Number(-3));
    }

    #[test]
    fn test_other_keys_are_labels() {
        assert_eq!(key(json!(1.5)), PeriodKey::Label("1.5".into()));
        assert_eq!(key(json!("Q2")), PeriodKey::Label("Q2".into()));
        // Not the canonical spelling of 1, so a different period.
        assert_eq!(key(json!("01")), PeriodKey::Label("01".into()));
    }

    #[test]
    fn test_rejects_non_scalar() {
        assert!(PeriodKey::deserialize(json!(null)).is_err());
        assert!(PeriodKey::deserialize(json!([1])).is_err());
    }

    #[test]
    fn test_grade_count_sums_periods() {
        let mut result = AggregateResult::default();
        for (period, count) in [(1, 2), (2, 3)] {
            let mut summary = PeriodSummary::default();
            summary.subjects.insert(
                "Math".to_string(),
                SubjectSummary {
                    count,
                    ..Default::default()
                },
            );
            result.periods.insert(PeriodKey::Number(period), summary);
        }

        assert_eq!(result.grade_count(), 5);
        assert_eq!(AggregateResult::default().grade_count(), 0);
    }

    #[test]
    fn test_from_str_matches_number() {
        assert_eq!(PeriodKey::from("3"), PeriodKey::from(3i64));
    }
}
