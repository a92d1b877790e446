#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use grades_model::Row;

/// Raw rows keyed by row id, in first-insertion order.
///
/// Rows are reference counted so that a derived store only allocates the rows
/// it touched; everything else is shared with its predecessor.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawRows {
    order: Vec<String>,
    rows: HashMap<String, Arc<Row>>,
}

impl RawRows {
    pub(crate) fn get(&self, row_id: &str) -> Option<&Arc<Row>> {
        self.rows.get(row_id)
    }

    pub(crate) fn contains(&self, row_id: &str) -> bool {
        self.rows.contains_key(row_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Row>)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| (id.as_str(), row)))
    }

    /// Inserts or replaces one row; a replaced row keeps its position.
    #[must_use]
    pub(crate) fn with_row(&self, row_id: String, row: Row) -> RawRows {
        let mut next = self.clone();
        if !next.rows.contains_key(&row_id) {
            next.order.push(row_id.clone());
        }
        next.rows.insert(row_id, Arc::new(row));
        next
    }

    /// Replaces existing rows; ids not already present are ignored.
    #[must_use]
    pub(crate) fn with_replaced<I>(&self, updates: I) -> RawRows
    where
        I: IntoIterator<Item = (String, Row)>,
    {
        let mut next = self.clone();
        for (row_id, row) in updates {
            if let Some(slot) = next.rows.get_mut(&row_id) {
                *slot = Arc::new(row);
            }
        }
        next
    }

    /// Rebuilds every row through `f`.
    #[must_use]
    pub(crate) fn map_rows<F>(&self, mut f: F) -> RawRows
    where
        F: FnMut(&Row) -> Row,
    {
        let rows = self
            .rows
            .iter()
            .map(|(id, row)| (id.clone(), Arc::new(f(row))))
            .collect();
        RawRows {
            order: self.order.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_keeps_insertion_position() {
        let rows = RawRows::default()
            .with_row("b".to_string(), Row::new().with("id", "b"))
            .with_row("a".to_string(), Row::new().with("id", "a"))
            .with_row("b".to_string(), Row::new().with("id", "b").with("hw1", 1));
        assert_eq!(rows.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(rows.len(), 2);
        assert!(rows.get("b").is_some_and(|row| row.contains("hw1")));
    }

    #[test]
    fn untouched_rows_are_shared() {
        let before = RawRows::default()
            .with_row("a".to_string(), Row::new().with("id", "a"))
            .with_row("b".to_string(), Row::new().with("id", "b"));
        let after = before.with_replaced([("a".to_string(), Row::new().with("id", "a2"))]);
        let shared = |rows: &RawRows, id: &str| Arc::clone(rows.get(id).expect("row"));
        assert!(Arc::ptr_eq(&shared(&before, "b"), &shared(&after, "b")));
        assert!(!Arc::ptr_eq(&shared(&before, "a"), &shared(&after, "a")));
        assert_eq!(
            before.get("a").and_then(|row| row.get("id").cloned()),
            Some(grades_model::CellValue::from("a"))
        );
    }
}
