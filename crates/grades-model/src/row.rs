#![deny(unsafe_code)]

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::CellValue;

/// Key of the statistic marker column in a full-table row.
pub const STAT_HDR: &str = "$stat";

/// An ordered mapping from column id to cell value.
///
/// Insertion order is preserved; rows held by a table store are kept sorted
/// by the course's column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    pub fn get(&self, col_id: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(id, _)| id == col_id)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, col_id: &str) -> bool {
        self.cells.iter().any(|(id, _)| id == col_id)
    }

    /// Sets `col_id`, replacing an existing value in place or appending.
    pub fn insert(&mut self, col_id: impl Into<String>, value: CellValue) {
        let col_id = col_id.into();
        match self.cells.iter_mut().find(|(id, _)| *id == col_id) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((col_id, value)),
        }
    }

    /// Builder-style [`Row::insert`].
    #[must_use]
    pub fn with(mut self, col_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(col_id, value.into());
        self
    }

    pub fn remove(&mut self, col_id: &str) -> Option<CellValue> {
        let idx = self.cells.iter().position(|(id, _)| id == col_id)?;
        Some(self.cells.remove(idx).1)
    }

    /// Overlays every cell of `patch` onto this row.
    pub fn merge(&mut self, patch: &Row) {
        for (col_id, value) in &patch.cells {
            self.insert(col_id.clone(), value.clone());
        }
    }

    pub fn col_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(|(id, _)| id.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> + '_ {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> + '_ {
        self.cells.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stable sort of the cells by a key derived from the column id.
    pub fn sort_by_key<K, F>(&mut self, mut key: F)
    where
        K: Ord,
        F: FnMut(&str) -> K,
    {
        self.cells.sort_by_key(|(id, _)| key(id));
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (col_id, value) in iter {
            row.insert(col_id, value.into());
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (col_id, value) in &self.cells {
            map.serialize_entry(col_id, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column id to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((col_id, value)) = access.next_entry::<String, CellValue>()? {
                    row.insert(col_id, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// A row of the fully evaluated table: statistic marker plus cells.
///
/// The marker is empty for ordinary rows and holds the calculated-row label
/// for synthetic aggregate rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullRow {
    pub stat: String,
    pub cells: Row,
}

impl FullRow {
    pub fn ordinary(cells: Row) -> Self {
        Self {
            stat: String::new(),
            cells,
        }
    }

    pub fn statistic(label: impl Into<String>, cells: Row) -> Self {
        Self {
            stat: label.into(),
            cells,
        }
    }

    pub fn is_statistic(&self) -> bool {
        !self.stat.is_empty()
    }

    pub fn get(&self, col_id: &str) -> Option<&CellValue> {
        self.cells.get(col_id)
    }
}

impl Serialize for FullRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() + 1))?;
        map.serialize_entry(STAT_HDR, &self.stat)?;
        for (col_id, value) in self.cells.iter() {
            map.serialize_entry(col_id, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut row = Row::new().with("id", "s1").with("hw1", 90);
        row.insert("id", CellValue::from("s2"));
        assert_eq!(row.col_ids().collect::<Vec<_>>(), vec!["id", "hw1"]);
        assert_eq!(row.get("id"), Some(&CellValue::from("s2")));
    }

    #[test]
    fn deserialize_keeps_document_order() {
        let row: Row = serde_json::from_str(r#"{"hw2": 5, "id": "s1", "hw1": 7}"#)
            .expect("parse row");
        assert_eq!(row.col_ids().collect::<Vec<_>>(), vec!["hw2", "id", "hw1"]);
    }

    #[test]
    fn full_row_serializes_marker_first() {
        let row = FullRow::statistic("avg", Row::new().with("id", "").with("hw1", 90));
        let json = serde_json::to_string(&row).expect("serialize full row");
        assert_eq!(json, r#"{"$stat":"avg","id":"","hw1":90.0}"#);
    }
}
