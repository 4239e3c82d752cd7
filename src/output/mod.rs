//! Rendering and persistence of aggregated grades.
//!
//! Supports a plain-text report, JSON serialization, and CSV append.

mod band;

pub use band::{Band, band};

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::aggregator::{AggregateResult, GradeDetail};

/// Plain-text view of an [`AggregateResult`]: periods in key order, subjects
/// by name, grades in the order they were given.
pub struct TextReport<'a>(pub &'a AggregateResult);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(
            f,
            "Overall average: {:.1} [{}]",
            result.overall_average,
            band(result.overall_average)
        )?;

        if result.is_empty() {
            return writeln!(f, "No grades yet.");
        }

        for (period, summary) in &result.periods {
            writeln!(f)?;
            writeln!(
                f,
                "Period {}  {:.1} [{}]",
                period,
                summary.period_average,
                band(summary.period_average)
            )?;

            for (name, subject) in &summary.subjects {
                let grades = subject
                    .grades
                    .iter()
                    .map(|g| g.decimal_value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");

                write!(
                    f,
                    "  {:<24} {:<24} {:>4.1} [{}]",
                    name,
                    grades,
                    subject.average,
                    band(subject.average)
                )?;
                if let Some(needed) = subject.needed_for_6 {
                    write!(f, "  Need: {needed:.1}")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

pub fn render_text(result: &AggregateResult) -> String {
    TextReport(result).to_string()
}

/// Detail text for a single grade.
pub fn grade_detail(grade: &GradeDetail) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    let notes = grade
        .notes_for_family
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("No notes");

    format!(
        "Grade: {}\nDate: {}\nComponent: {}\nTeacher: {}\nNotes: {}",
        grade.decimal_value,
        field(&grade.evt_date),
        field(&grade.component_desc),
        field(&grade.teacher_name),
        notes
    )
}

/// Pretty-printed JSON for the aggregate.
pub fn to_json(result: &AggregateResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// One CSV row per (period, subject).
#[derive(Debug, Serialize)]
pub struct SubjectRow {
    pub period: String,
    pub subject: String,
    pub count: usize,
    pub average: f64,
    pub needed_for_6: Option<f64>,
    pub period_average: f64,
    pub overall_average: f64,
}

pub fn subject_rows(result: &AggregateResult) -> Vec<SubjectRow> {
    result
        .periods
        .iter()
        .flat_map(|(period, summary)| {
            summary.subjects.iter().map(move |(name, subject)| SubjectRow {
                period: period.to_string(),
                subject: name.clone(),
                count: subject.count,
                average: subject.average,
                needed_for_6: subject.needed_for_6,
                period_average: summary.period_average,
                overall_average: result.overall_average,
            })
        })
        .collect()
}

/// Appends one row per subject to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_subject_rows(path: &str, result: &AggregateResult) -> Result<usize> {
    let file_exists = Path::new(path).exists();
    let rows = subject_rows(result);
    debug!(path, file_exists, rows = rows.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}
