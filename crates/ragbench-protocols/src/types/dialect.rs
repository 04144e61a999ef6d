//! SQL dialects understood by the template renderer and adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Canonical DDL form (InnoDB, utf8mb4).
    #[default]
    MySql,
    Sqlite,
}

impl SqlDialect {
    /// Quote an identifier for this dialect.
    ///
    /// Embedded quote characters are doubled.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_mysql() {
        assert_eq!(SqlDialect::MySql.quote_ident("users"), "`users`");
        assert_eq!(SqlDialect::MySql.quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_quote_ident_sqlite() {
        assert_eq!(SqlDialect::Sqlite.quote_ident("users"), "\"users\"");
        assert_eq!(SqlDialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(SqlDialect::Sqlite.to_string(), "sqlite");
        let json = serde_json::to_string(&SqlDialect::MySql).unwrap();
        assert_eq!(json, "\"mysql\"");
    }
}
