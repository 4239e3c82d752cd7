use crate::aggregator::types::{AggregateResult, GradeDetail, GradeRecord, PeriodSummary};
use crate::aggregator::utility::{mean, needed_for_target};
use crate::error::GradeError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Average a subject must reach to count as passing.
pub const PASSING_AVERAGE: f64 = 6.0;

/// Colour upstream uses to mark grades that do not count towards averages.
const EXCLUDED_COLOR: &str = "blue";

/// Returns `true` if the record contributes to averages.
///
/// A grade of exactly `0.0` is a real grade; only a missing value excludes it.
pub fn is_retained(record: &GradeRecord) -> bool {
    !record.no_average
        && record.color.as_deref() != Some(EXCLUDED_COLOR)
        && record.decimal_value.is_some()
}

/// Aggregates raw grade records into per-subject, per-period and overall averages.
///
/// Excluded records never create a period or subject entry. Grades keep
/// their input order within a subject.
pub fn aggregate(records: &[GradeRecord]) -> AggregateResult {
    let mut periods: BTreeMap<_, PeriodSummary> = BTreeMap::new();

    for record in records {
        let Some(value) = record.decimal_value.filter(|_| is_retained(record)) else {
            continue;
        };

        let subject = periods
            .entry(record.period_pos.clone())
            .or_default()
            .subjects
            .entry(record.subject_desc.clone())
            .or_default();

        subject.count += 1;
        subject.grades.push(GradeDetail {
            decimal_value: value,
            evt_date: record.evt_date.clone(),
            notes_for_family: record.notes_for_family.clone(),
            component_desc: record.component_desc.clone(),
            teacher_name: record.teacher_name.clone(),
        });
    }

    for period in periods.values_mut() {
        let mut period_values = Vec::new();

        for subject in period.subjects.values_mut() {
            let values = subject.values();
            subject.average = mean(&values);
            subject.needed_for_6 = needed_for_target(&values, PASSING_AVERAGE);
            period_values.extend(values);
        }

        // Flattened: subjects with more grades weigh more.
        period.period_average = mean(&period_values);
    }

    let period_averages: Vec<f64> = periods.values().map(|p| p.period_average).collect();

    AggregateResult {
        overall_average: mean(&period_averages),
        periods,
    }
}

/// Validates an upstream grades payload and aggregates it.
///
/// # Errors
///
/// Returns [`GradeError::MalformedInput`] if the payload has no `grades`
/// array or any record cannot be interpreted. Nothing is aggregated in
/// that case.
pub fn aggregate_payload(payload: &Value) -> Result<AggregateResult, GradeError> {
    let raw = payload
        .get("grades")
        .ok_or_else(|| GradeError::MalformedInput("payload has no `grades` field".into()))?
        .as_array()
        .ok_or_else(|| GradeError::MalformedInput("`grades` is not an array".into()))?;

    let records = raw
        .iter()
        .enumerate()
        .map(|(i, item)| {
            GradeRecord::deserialize(item)
                .map_err(|e| GradeError::MalformedInput(format!("grade record {i}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(aggregate(&records))
}

/// Parses a JSON document and aggregates it, see [`aggregate_payload`].
pub fn aggregate_json(json: &str) -> Result<AggregateResult, GradeError> {
    let payload: Value = serde_json::from_str(json)
        .map_err(|e| GradeError::MalformedInput(format!("invalid JSON: {e}")))?;
    aggregate_payload(&payload)
}
