//! Rendering of a built-in course's tables loaded from CSV.

use std::sync::Arc;

use grades_cli::ingest::{read_patches, read_rows};
use grades_cli::render::{Grid, JsonReport, to_json};
use grades_core::Grades;
use grades_course::default_catalog;
use grades_model::Course;

const CS220_CSV: &str = "\
id,name,prj1,prj2,quiz,notes
s1,Grace,40,45,8,
s2,Alan,30,50,10,late
";

fn cs220() -> Arc<Course> {
    default_catalog().get("cs220").expect("cs220")
}

fn load(course: &Arc<Course>) -> Grades {
    let rows = read_rows(course, CS220_CSV.as_bytes()).expect("read rows");
    Grades::from_rows(Arc::clone(course), rows).expect("load rows")
}

#[test]
fn full_table_csv() {
    let course = cs220();
    let grades = load(&course);
    let output = Grid::from_full(&course, &grades.full_table())
        .to_csv()
        .expect("render csv");
    insta::assert_snapshot!("full_table_csv", output);
}

#[test]
fn raw_table_csv_has_active_columns_only() {
    let course = cs220();
    let grades = load(&course);
    let col_ids = grades.col_ids().expect("active columns");
    let output = Grid::from_raw(col_ids, &grades.raw_table())
        .to_csv()
        .expect("render csv");
    assert_eq!(
        output,
        "id,name,prj1,prj2,quiz,notes\ns1,Grace,40,45,8,\ns2,Alan,30,50,10,late\n"
    );
}

#[test]
fn patched_table_renders_as_json() {
    let course = cs220();
    let patches = read_patches(r#"{"s2": {"prj1": 35}}"#.as_bytes()).expect("read patches");
    let grades = load(&course).patch(&patches).expect("patch");
    let report = grades.full_table_report();
    let json = to_json(&JsonReport {
        course: &course.id,
        table: &report.table,
        errors: &report.errors,
    })
    .expect("render json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse json");
    assert_eq!(value["course"], "cs220");
    assert_eq!(value["errors"], serde_json::json!([]));
    assert_eq!(value["table"][1]["points"], 95.0);
    assert_eq!(value["table"][2]["$stat"], "avg");
    assert_eq!(value["table"][2]["prj1"], 37.5);
}

#[test]
fn rejected_rows_report_their_position() {
    let course = cs220();
    let csv = "id,name,prj1,prj2,quiz,notes\ns1,Grace,40,45,8,\ns2,Alan,30,abc,10,\n";
    let rows = read_rows(&course, csv.as_bytes()).expect("read rows");
    let errors = Grades::from_rows(Arc::clone(&course), rows).expect_err("bad score");
    assert_eq!(
        errors.to_string(),
        "RANGE: row 2: prj2 value 'abc' is not a number"
    );
}
