use gradebook::aggregator::{PeriodKey, aggregate_json, aggregate_payload};
use gradebook::output::{render_text, subject_rows};
use gradebook::GradeError;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn test_full_pipeline() {
    let json = include_str!("fixtures/grades.json");
    let result = aggregate_json(json).expect("Failed to aggregate fixture");

    // Period 5 only holds an excluded grade, so it never appears.
    let keys: Vec<&PeriodKey> = result.periods.keys().collect();
    assert_eq!(keys, vec![&PeriodKey::Number(1), &PeriodKey::Number(3)]);

    let first = result.period(1i64).unwrap();
    let math = first.subject("MATEMATICA").unwrap();
    assert_eq!(math.count, 2);
    assert_close(math.average, 6.0);
    assert_eq!(math.needed_for_6, None);
    assert_eq!(math.grades[1].notes_for_family.as_deref(), Some("Buon miglioramento"));

    let history = first.subject("STORIA").unwrap();
    assert_eq!(history.count, 1);
    assert_eq!(history.needed_for_6, Some(8.0));

    assert!(first.subject("INGLESE").is_none());
    // (5 + 7 + 4) / 3
    assert_close(first.period_average, 16.0 / 3.0);

    let third = result.period(3i64).unwrap();
    let english = third.subject("INGLESE").unwrap();
    assert_eq!(english.count, 2);
    assert_close(english.average, 3.75);
    // 6 * 3 - 7.5 = 10.5, clamped
    assert_eq!(english.needed_for_6, Some(10.0));
    // (6.5 + 7.5 + 0) / 3
    assert_close(third.period_average, 14.0 / 3.0);

    assert_close(result.overall_average, (16.0 / 3.0 + 14.0 / 3.0) / 2.0);
}

#[test]
fn test_invariants_hold_for_fixture() {
    let result = aggregate_json(include_str!("fixtures/grades.json")).unwrap();

    for period in result.periods.values() {
        let mut sum = 0.0;
        let mut count = 0;
        for subject in period.subjects.values() {
            assert_eq!(subject.count, subject.grades.len());
            assert!((0.0..=10.0).contains(&subject.average));
            match subject.needed_for_6 {
                Some(needed) => {
                    assert!(subject.average < 6.0);
                    assert!((0.0..=10.0).contains(&needed));
                }
                None => assert!(subject.average >= 6.0),
            }
            sum += subject.values().iter().sum::<f64>();
            count += subject.count;
        }
        assert_close(period.period_average, sum / count as f64);
    }

    // Neither blue grade (9 and 10) may surface anywhere.
    for period in result.periods.values() {
        for subject in period.subjects.values() {
            assert!(subject.grades.iter().all(|g| g.decimal_value < 9.0));
        }
    }
}

#[test]
fn test_empty_payload() {
    let result = aggregate_json(r#"{"grades": []}"#).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.overall_average, 0.0);
    assert!(subject_rows(&result).is_empty());
}

#[test]
fn test_missing_grades_is_malformed() {
    let err = aggregate_payload(&serde_json::json!({ "marks": [] })).unwrap_err();
    assert!(matches!(err, GradeError::MalformedInput(_)));
}

#[test]
fn test_string_periods_are_labels() {
    let payload = serde_json::json!({
        "grades": [
            { "periodPos": "Q2", "subjectDesc": "FISICA", "decimalValue": 5.5 },
            { "periodPos": 2, "subjectDesc": "FISICA", "decimalValue": 6.0 }
        ]
    });
    let result = aggregate_payload(&payload).unwrap();

    assert!(result.period("Q2").is_some());
    assert!(result.period(2i64).is_some());
    let text = render_text(&result);
    assert!(text.find("Period 2").unwrap() < text.find("Period Q2").unwrap());
}

#[test]
fn test_report_renders_fixture() {
    let result = aggregate_json(include_str!("fixtures/grades.json")).unwrap();
    let text = render_text(&result);

    assert!(text.contains("Period 1"));
    assert!(text.contains("Period 3"));
    assert!(!text.contains("Period 5"));
    assert!(text.contains("Need: 10.0"));

    let rows = subject_rows(&result);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].period, "1");
}

#[test]
fn test_mixed_period_spellings_share_a_section() {
    let payload = serde_json::json!({
        "grades": [
            { "periodPos": 1, "subjectDesc": "LATINO", "decimalValue": 4.0 },
            { "periodPos": "1", "subjectDesc": "LATINO", "decimalValue": 8.0 },
            { "periodPos": 1.0, "subjectDesc": "GRECO", "decimalValue": 6.0 }
        ]
    });
    let result = aggregate_payload(&payload).unwrap();

    assert_eq!(result.periods.len(), 1);
    assert_close(result.period(1i64).unwrap().subject("LATINO").unwrap().average, 6.0);
    assert_eq!(result.grade_count(), 3);
    assert_eq!(render_text(&result).matches("Period 1").count(), 1);
}
