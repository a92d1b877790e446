//! End-to-end checks of the built-in courses through the table store.

use grades_core::{Grades, Patches};
use grades_course::default_catalog;
use grades_model::{CellValue, ErrorCode, Row};

fn cs101_row(id: &str, hw: i32, midterm: i32, fin: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("firstName", "Ada")
        .with("lastName", "Lovelace")
        .with("hw1", hw)
        .with("hw2", hw)
        .with("hw3", hw)
        .with("midterm", midterm)
        .with("final", fin)
}

#[test]
fn cs101_computes_total_and_letter_grade() {
    let course = default_catalog().get("cs101").expect("cs101");
    let grades = Grades::from_rows(
        course,
        [cs101_row("s1", 100, 90, 95), cs101_row("s2", 50, 60, 70)],
    )
    .expect("load rows");

    let full = grades.full_table();
    // 30 * 1.0 + 30 * 0.9 + 40 * 0.95 = 95
    assert_eq!(full[0].get("total"), Some(&CellValue::Number(95.0)));
    assert_eq!(full[0].get("grade"), Some(&CellValue::from("A")));
    // 30 * 0.5 + 30 * 0.6 + 40 * 0.7 = 61
    assert_eq!(full[1].get("total"), Some(&CellValue::Number(61.0)));
    assert_eq!(full[1].get("grade"), Some(&CellValue::from("D")));

    let stats: Vec<&str> = full
        .iter()
        .filter(|row| row.is_statistic())
        .map(|row| row.stat.as_str())
        .collect();
    assert_eq!(stats, vec!["count", "min", "max", "avg", "median", "stddev"]);

    let count = &full[2];
    assert_eq!(count.get("hw1"), Some(&CellValue::Number(2.0)));
    assert_eq!(count.get("firstName"), Some(&CellValue::empty()));

    let avg = &full[5];
    assert_eq!(avg.get("midterm"), Some(&CellValue::Number(75.0)));
    assert_eq!(avg.get("final"), Some(&CellValue::Number(82.5)));
    // 30 * 0.75 + 30 * 0.75 + 40 * 0.825 = 78
    assert_eq!(avg.get("total"), Some(&CellValue::Number(78.0)));
    assert_eq!(avg.get("grade"), Some(&CellValue::from("C")));
}

#[test]
fn cs101_blank_scores_count_as_minimum() {
    let course = default_catalog().get("cs101").expect("cs101");
    let grades = Grades::new(course)
        .upsert_row(cs101_row("s1", 100, 100, 100))
        .and_then(|grades| {
            grades.upsert_row(
                cs101_row("s2", 100, 100, 100).with("final", CellValue::empty()),
            )
        })
        .expect("load rows");
    let report = grades.full_table_report();
    assert!(report.errors.is_empty(), "{}", report.errors);
    assert_eq!(report.table[1].get("total"), Some(&CellValue::Number(60.0)));
}

#[test]
fn cs220_passes_notes_through_patches() {
    let course = default_catalog().get("cs220").expect("cs220");
    let row = Row::new()
        .with("id", "s1")
        .with("name", "Grace")
        .with("prj1", 40)
        .with("prj2", 45)
        .with("quiz", 8)
        .with("notes", "");
    let grades = Grades::from_rows(course, [row]).expect("load rows");

    let patches = Patches::from([(
        "s1".to_string(),
        Row::new().with("notes", 3).with("quiz", 9),
    )]);
    let next = grades.patch(&patches).expect("patch");
    let full = next.full_table();
    assert_eq!(full[0].get("notes"), Some(&CellValue::Number(3.0)));
    assert_eq!(full[0].get("points"), Some(&CellValue::Number(94.0)));
    assert_eq!(full[1].stat, "avg");
    assert_eq!(full[1].get("points"), Some(&CellValue::Number(94.0)));
}

#[test]
fn cs220_rejects_out_of_range_quiz() {
    let course = default_catalog().get("cs220").expect("cs220");
    let row = Row::new()
        .with("id", "s1")
        .with("name", "Grace")
        .with("prj1", 40)
        .with("prj2", 45)
        .with("quiz", 11)
        .with("notes", "");
    let errors = Grades::new(course).upsert_row(row).expect_err("quiz out of range");
    assert!(errors.has_code(ErrorCode::Range));
    assert!(errors.mentions(ErrorCode::Range, "quiz"));
}
