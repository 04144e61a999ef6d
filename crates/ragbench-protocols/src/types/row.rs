//! Ordered result rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Metadata;

/// A single result row with columns in select order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column, replacing an earlier value with the same name.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert into an unordered metadata map.
    pub fn into_metadata(self) -> Metadata {
        self.columns.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_preserves_order() {
        let row = Row::new().with("title", "t").with("id", 1).with("body", "b");
        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["title", "id", "body"]);
    }

    #[test]
    fn test_row_push_replaces() {
        let mut row = Row::new().with("id", 1);
        row.push("id", 2);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("id"), Some(&json!(2)));
    }

    #[test]
    fn test_row_get_missing() {
        let row = Row::new();
        assert!(row.is_empty());
        assert!(row.get("id").is_none());
    }

    #[test]
    fn test_into_metadata() {
        let row = Row::new().with("id", 7).with("text", "hello");
        let meta = row.into_metadata();
        assert_eq!(meta.get("id"), Some(&json!(7)));
        assert_eq!(meta.get("text"), Some(&json!("hello")));
    }
}
