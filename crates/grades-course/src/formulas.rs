#![deny(unsafe_code)]

//! Formula library for calculated columns and calculated rows.
//!
//! Row formulas read raw cells only. Within one column pass a formula never
//! sees another calculated column's value for the same row, so formulas that
//! build on each other recompute from the scores.
//!
//! Aggregates skip non-numeric cells (for example the empty placeholder of a
//! freshly added column).

use std::sync::Arc;

use grades_model::{CellValue, ColFn, ColKind, ColumnDef, Course, GradeError, Row};

/// Sum of every numeric score cell in the row.
pub fn sum_scores(course: &Course, row: &Row) -> Result<CellValue, GradeError> {
    let total: f64 = course
        .cols()
        .iter()
        .filter(|col| col.col_kind() == ColKind::Score)
        .filter_map(|col| row.get(&col.col_id).and_then(CellValue::as_number))
        .sum();
    Ok(CellValue::Number(total))
}

/// Weighted percentage over score columns.
///
/// Each column contributes `weight * (value - min) / (max - min)`; the result
/// is scaled to 0..=100 by the total weight. Blank or missing cells count as the
/// column minimum.
pub fn weighted_percent(weights: Vec<(String, f64)>) -> ColFn {
    Arc::new(move |course: &Course, row: &Row| {
        percent(course, row, &weights).map(CellValue::Number)
    })
}

/// Letter grade derived from [`weighted_percent`] and descending cutoffs.
///
/// `cutoffs` pairs a minimum percentage with its letter; the first cutoff the
/// percentage reaches wins, and anything below all cutoffs gets `fallback`.
pub fn letter_grade(
    weights: Vec<(String, f64)>,
    cutoffs: Vec<(f64, String)>,
    fallback: impl Into<String>,
) -> ColFn {
    let fallback = fallback.into();
    Arc::new(move |course: &Course, row: &Row| {
        let pct = percent(course, row, &weights)?;
        let letter = cutoffs
            .iter()
            .find(|(min, _)| pct >= *min)
            .map_or(fallback.as_str(), |(_, letter)| letter.as_str());
        Ok(CellValue::from(letter))
    })
}

fn percent(course: &Course, row: &Row, weights: &[(String, f64)]) -> Result<f64, GradeError> {
    let mut earned = 0.0;
    let mut total_weight = 0.0;
    for (col_id, weight) in weights {
        let Some((min, max)) = course.col(col_id).and_then(ColumnDef::score_range) else {
            return Err(GradeError::bad_arg(format!(
                "{col_id} is not a score column"
            )));
        };
        let span = max - min;
        if span <= 0.0 {
            return Err(GradeError::range(format!("{col_id} has an empty range")));
        }
        let value = match row.get(col_id) {
            Some(CellValue::Number(value)) => *value,
            Some(cell) if cell.is_blank() => min,
            None => min,
            Some(cell) => {
                return Err(GradeError::range(format!(
                    "{col_id} value '{cell}' is not a number"
                )));
            }
        };
        earned += weight * (value - min) / span;
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        return Err(GradeError::bad_arg("weights must sum to a positive value"));
    }
    Ok(earned * 100.0 / total_weight)
}

fn numbers(values: &[CellValue]) -> Vec<f64> {
    values.iter().filter_map(CellValue::as_number).collect()
}

fn non_empty(values: &[CellValue]) -> Result<Vec<f64>, GradeError> {
    let numbers = numbers(values);
    if numbers.is_empty() {
        return Err(GradeError::bad_arg("no numeric values"));
    }
    Ok(numbers)
}

/// Number of numeric cells.
pub fn count(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    Ok(CellValue::Number(numbers(values).len() as f64))
}

pub fn min(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    let numbers = non_empty(values)?;
    Ok(CellValue::Number(numbers.into_iter().fold(f64::INFINITY, f64::min)))
}

pub fn max(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    let numbers = non_empty(values)?;
    Ok(CellValue::Number(
        numbers.into_iter().fold(f64::NEG_INFINITY, f64::max),
    ))
}

/// Arithmetic mean.
pub fn mean(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    let numbers = non_empty(values)?;
    Ok(CellValue::Number(average(&numbers)))
}

pub fn median(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    let mut numbers = non_empty(values)?;
    numbers.sort_by(f64::total_cmp);
    let mid = numbers.len() / 2;
    let value = if numbers.len() % 2 == 0 {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    } else {
        numbers[mid]
    };
    Ok(CellValue::Number(value))
}

/// Population standard deviation.
pub fn std_dev(_: &Course, values: &[CellValue]) -> Result<CellValue, GradeError> {
    let numbers = non_empty(values)?;
    let avg = average(&numbers);
    let variance = numbers.iter().map(|n| (n - avg).powi(2)).sum::<f64>() / numbers.len() as f64;
    Ok(CellValue::Number(variance.sqrt()))
}

fn average(numbers: &[f64]) -> f64 {
    numbers.iter().sum::<f64>() / numbers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Course {
        Course::builder("t", "id")
            .id_col("id")
            .score_col("hw", 0.0, 10.0)
            .score_col("exam", 0.0, 100.0)
            .build()
            .expect("build course")
    }

    fn nums(values: &[f64]) -> Vec<CellValue> {
        values.iter().copied().map(CellValue::Number).collect()
    }

    #[test]
    fn aggregates_skip_text() {
        let course = course();
        let mut values = nums(&[1.0, 4.0, 2.0]);
        values.push(CellValue::empty());
        assert_eq!(count(&course, &values), Ok(CellValue::Number(3.0)));
        assert_eq!(min(&course, &values), Ok(CellValue::Number(1.0)));
        assert_eq!(max(&course, &values), Ok(CellValue::Number(4.0)));
        assert_eq!(median(&course, &values), Ok(CellValue::Number(2.0)));
        assert!(mean(&course, &[CellValue::empty()]).is_err());
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        let course = course();
        assert_eq!(
            median(&course, &nums(&[4.0, 1.0, 3.0, 2.0])),
            Ok(CellValue::Number(2.5))
        );
    }

    #[test]
    fn std_dev_is_population() {
        let course = course();
        assert_eq!(
            std_dev(&course, &nums(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])),
            Ok(CellValue::Number(2.0))
        );
    }

    #[test]
    fn weighted_percent_normalizes_ranges() {
        let course = course();
        let f = weighted_percent(vec![("hw".to_string(), 1.0), ("exam".to_string(), 3.0)]);
        let row = Row::new().with("hw", 5).with("exam", 100);
        assert_eq!(f(&course, &row), Ok(CellValue::Number(87.5)));
    }

    #[test]
    fn weighted_percent_rejects_unknown_column() {
        let course = course();
        let f = weighted_percent(vec![("quiz".to_string(), 1.0)]);
        assert!(f(&course, &Row::new()).is_err());
    }

    #[test]
    fn letter_grade_picks_first_reached_cutoff() {
        let course = course();
        let f = letter_grade(
            vec![("exam".to_string(), 1.0)],
            vec![(90.0, "A".to_string()), (80.0, "B".to_string())],
            "F",
        );
        let grade = |exam: i32| f(&course, &Row::new().with("exam", exam));
        assert_eq!(grade(95), Ok(CellValue::from("A")));
        assert_eq!(grade(80), Ok(CellValue::from("B")));
        assert_eq!(grade(10), Ok(CellValue::from("F")));
    }
}
