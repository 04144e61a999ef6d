//! Keyword predicate building and scoring.
//!
//! Everything here is pure: column metadata in, SQL and scores out.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use ragbench_protocols::{
    is_valid_identifier, ColumnInfo, Metadata, Row, SqlDialect, CUSTOM_SQL_KEY, USER_ID_KEY,
};

/// Columns checked, in order, for a row's primary content.
const CONTENT_COLUMNS: [&str; 4] = ["text", "content", "title", "name"];

/// A parameterized keyword query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Why a table was left out of a keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSkip {
    NoTextColumns,
    UnknownFilterColumn(String),
}

impl fmt::Display for TableSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTextColumns => write!(f, "no textual columns"),
            Self::UnknownFilterColumn(column) => {
                write!(f, "filter column '{}' not in table", column)
            }
        }
    }
}

/// Build `SELECT * FROM t WHERE (c1 LIKE ? OR c1 LIKE ? ...) AND f = ? LIMIT n`.
///
/// Every textual column is matched against every distinct query word, so a
/// row sharing any word with the query is a candidate. Textual columns are
/// those whose declared type contains `text`, `varchar` or `char`. `%`, `_`
/// and `\` in the query match literally. Filters are equality predicates in
/// key order; `user_id` is not applied here.
pub fn build_keyword_statement(
    dialect: SqlDialect,
    table: &str,
    columns: &[ColumnInfo],
    text: &str,
    filters: &Metadata,
    limit: usize,
) -> Result<KeywordStatement, TableSkip> {
    let textual: Vec<&ColumnInfo> = columns.iter().filter(|c| c.is_textual()).collect();
    if textual.is_empty() {
        return Err(TableSkip::NoTextColumns);
    }

    let known: BTreeSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let mut filter_keys: Vec<&String> = filters
        .keys()
        .filter(|k| k.as_str() != USER_ID_KEY && k.as_str() != CUSTOM_SQL_KEY)
        .collect();
    filter_keys.sort();

    if let Some(unknown) = filter_keys
        .iter()
        .find(|k| !is_valid_identifier(k) || !known.contains(k.as_str()))
    {
        return Err(TableSkip::UnknownFilterColumn(unknown.to_string()));
    }

    let patterns: Vec<Value> = query_terms(text)
        .into_iter()
        .map(|term| Value::String(format!("%{}%", escape_like(&term))))
        .collect();
    let mut args = Vec::with_capacity(textual.len() * patterns.len() + filter_keys.len());

    let mut likes = Vec::with_capacity(textual.len() * patterns.len());
    for column in &textual {
        let column = dialect.quote_ident(&column.name);
        for pattern in &patterns {
            likes.push(like_predicate(dialect, &column));
            args.push(pattern.clone());
        }
    }
    let mut sql = format!(
        "SELECT * FROM {} WHERE ({})",
        dialect.quote_ident(table),
        likes.join(" OR ")
    );

    for key in filter_keys {
        let column = dialect.quote_ident(key);
        match &filters[key] {
            Value::Null => sql.push_str(&format!(" AND {} IS NULL", column)),
            value @ (Value::Array(_) | Value::Object(_)) => {
                sql.push_str(&format!(" AND {} = ?", column));
                args.push(Value::String(value.to_string()));
            }
            value => {
                sql.push_str(&format!(" AND {} = ?", column));
                args.push(value.clone());
            }
        }
    }
    sql.push_str(&format!(" LIMIT {}", limit));

    Ok(KeywordStatement { sql, args })
}

/// Distinct whitespace-separated words, case-insensitively, in first-seen
/// order. A blank query yields one empty term.
fn query_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let terms: Vec<String> = text
        .split_whitespace()
        .filter(|word| seen.insert(word.to_lowercase()))
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        vec![String::new()]
    } else {
        terms
    }
}

/// Escape `LIKE` wildcards with a backslash.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// MySQL escapes with backslash by default; SQLite needs it spelled out.
fn like_predicate(dialect: SqlDialect, column: &str) -> String {
    match dialect {
        SqlDialect::MySql => format!("{} LIKE ?", column),
        SqlDialect::Sqlite => format!("{} LIKE ? ESCAPE '\\'", column),
    }
}

/// `|query ∩ content| / |query|` over lower-cased whitespace-split word sets.
pub fn word_overlap(query: &str, content: &str) -> f32 {
    let query_words: BTreeSet<String> = query.split_whitespace().map(str::to_lowercase).collect();
    let content_words: BTreeSet<String> =
        content.split_whitespace().map(str::to_lowercase).collect();
    if query_words.is_empty() || content_words.is_empty() {
        return 0.0;
    }

    let shared = query_words.intersection(&content_words).count();
    shared as f32 / query_words.len() as f32
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First truthy of `text`, `content`, `title`, `name`; otherwise every
/// truthy value joined with spaces.
pub fn extract_content(row: &Row) -> String {
    for column in CONTENT_COLUMNS {
        if let Some(value) = row.get(column).filter(|v| is_truthy(v)) {
            return display_value(value);
        }
    }
    row.values()
        .filter(|v| is_truthy(v))
        .map(display_value)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The row's `id` column rendered as a string.
pub(crate) fn row_id(row: &Row) -> Option<String> {
    row.get("id").filter(|v| !v.is_null()).map(display_value)
}

#[cfg(test)]
#[path = "keyword_tests.rs"]
mod tests;
