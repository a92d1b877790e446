//! Property tests for validation and immutability.

use std::sync::Arc;

use grades_core::{Grades, Patches};
use grades_model::{CellValue, Course, ErrorCode, Row};
use proptest::prelude::*;

const MIN: f64 = 10.0;
const MAX: f64 = 90.0;

fn course() -> Arc<Course> {
    Arc::new(
        Course::builder("cs101", "id")
            .id_col("id")
            .score_col("hw1", MIN, MAX)
            .score_col("hw2", MIN, MAX)
            .info_col("section")
            .build()
            .expect("build course"),
    )
}

fn snapshot(grades: &Grades) -> Vec<Row> {
    grades.raw_table().into_iter().cloned().collect()
}

fn table(scores: &[f64]) -> Grades {
    let rows = scores.iter().enumerate().map(|(idx, score)| {
        Row::new()
            .with("id", format!("s{idx}"))
            .with("hw1", *score)
    });
    Grades::from_rows(course(), rows).expect("load rows")
}

proptest! {
    #[test]
    fn in_range_scores_are_accepted(score in MIN..=MAX) {
        let grades = table(&[MIN]);
        let row = Row::new().with("id", "new").with("hw1", score);
        prop_assert!(grades.upsert_row(row).is_ok());
    }

    #[test]
    fn out_of_range_scores_fail_with_range(score in prop_oneof![-1000.0..MIN, (MAX + 0.001)..1000.0]) {
        let grades = table(&[MIN, MAX]);
        let before = snapshot(&grades);

        let row = Row::new().with("id", "new").with("hw1", score);
        let errors = grades.upsert_row(row).expect_err("out of range upsert");
        prop_assert!(errors.has_code(ErrorCode::Range));

        let patches = Patches::from([("s0".to_string(), Row::new().with("hw1", score))]);
        let errors = grades.patch(&patches).expect_err("out of range patch");
        prop_assert!(errors.has_code(ErrorCode::Range));
        prop_assert_eq!(snapshot(&grades), before);
    }

    #[test]
    fn add_column_keeps_predecessor_intact(scores in prop::collection::vec(MIN..=MAX, 0..8)) {
        let grades = table(&scores);
        let before = snapshot(&grades);
        let next = grades.add_column("section").expect("add section");

        prop_assert_eq!(snapshot(&grades), before);
        prop_assert_eq!(next.len(), grades.len());
        for row in next.raw_table() {
            prop_assert_eq!(row.get("section"), Some(&CellValue::empty()));
            prop_assert_eq!(row.col_ids().collect::<Vec<_>>(), vec!["id", "hw1", "section"]);
        }
    }

    #[test]
    fn column_set_must_match_exactly(drop_hw1 in any::<bool>(), scores in prop::collection::vec(MIN..=MAX, 1..5)) {
        let grades = table(&scores);
        let row = if drop_hw1 {
            Row::new().with("id", "new")
        } else {
            Row::new().with("id", "new").with("hw1", MIN).with("hw2", MIN)
        };
        let errors = grades.upsert_row(row).expect_err("column mismatch");
        let expected = if drop_hw1 { "missing columns hw1" } else { "new columns hw2" };
        prop_assert!(errors.mentions(ErrorCode::BadArg, expected));
    }

    #[test]
    fn unknown_rows_never_patch(id in "[a-z]{3,6}", score in MIN..=MAX) {
        let grades = table(&[MIN]);
        let before = snapshot(&grades);
        let patches = Patches::from([(id.clone(), Row::new().with("hw1", score))]);
        let errors = grades.patch(&patches).expect_err("unknown row");
        prop_assert!(errors.mentions(ErrorCode::BadArg, &id));
        prop_assert_eq!(snapshot(&grades), before);
    }
}
