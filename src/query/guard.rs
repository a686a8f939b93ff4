//! Static SQL validation
//!
//! Last gate before execution. The compiler only emits conforming SQL,
//! but every statement is checked again here so nothing reaches the
//! store on an upstream mistake. Checks run in a fixed order: statement
//! shape, table allow-list, keyword deny-list, column allow-list.
//! Rejection reasons go to the log, never to the user.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::SqlGuardError;
use crate::query::SENSOR_TABLE;

lazy_static! {
    /// Single-quoted literals, stripped before any token scan so quoted
    /// text is never mistaken for a keyword or column.
    static ref STRING_LITERAL: Regex = Regex::new(r"'[^']*'").unwrap();
    static ref SELECT_HEAD: Regex = Regex::new(r"(?i)^\s*SELECT\b").unwrap();
    static ref FROM_TABLE: Regex =
        Regex::new(r"(?i)\bFROM\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref JOIN_TABLE: Regex =
        Regex::new(r"(?i)\bJOIN\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref FROM_SUBQUERY: Regex = Regex::new(r"(?i)\bFROM\s*\(").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// Allow/deny tables for generated SQL. Lists are tiny; membership is a
/// linear scan.
pub struct SqlGuard {
    deny_keywords: Vec<&'static str>,
    allowed_tables: Vec<&'static str>,
    allowed_columns: Vec<&'static str>,
    statement_keywords: Vec<&'static str>,
    functions: Vec<&'static str>,
}

impl SqlGuard {
    pub fn new() -> Self {
        Self {
            deny_keywords: vec![
                "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "ATTACH", "PRAGMA", "EXEC",
            ],
            allowed_tables: vec![SENSOR_TABLE],
            allowed_columns: vec![
                "timestamp",
                "sensor_type",
                "value",
                "location",
                "unit",
                "time_period",
                "avg_value",
                "min_value",
                "max_value",
                "data_points",
            ],
            statement_keywords: vec![
                "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "AS", "GROUP", "BY", "ORDER",
                "LIMIT", "OFFSET", "DESC", "ASC", "UNION", "ALL", "DISTINCT", "IN", "IS", "NULL",
                "BETWEEN", "LIKE", "HAVING", "CASE", "WHEN", "THEN", "ELSE", "END", "ON", "JOIN",
            ],
            functions: vec![
                "AVG",
                "MIN",
                "MAX",
                "COUNT",
                "SUM",
                "TOTAL",
                "DATE",
                "DATETIME",
                "STRFTIME",
                "JULIANDAY",
                "ROUND",
                "ABS",
            ],
        }
    }

    /// Run every check in order. `Ok(())` means the statement may execute;
    /// any rejection is fatal for the turn.
    pub fn validate(&self, sql: &str) -> Result<(), SqlGuardError> {
        let result = self.check(sql);
        if let Err(ref err) = result {
            tracing::warn!(error = %err, "rejected generated sql");
        }
        result
    }

    fn check(&self, sql: &str) -> Result<(), SqlGuardError> {
        self.check_statement_shape(sql)?;
        let stripped = STRING_LITERAL.replace_all(sql, " ");
        self.check_tables(&stripped)?;
        self.check_deny_keywords(&stripped)?;
        self.check_columns(&stripped)?;
        Ok(())
    }

    /// One statement, and its head is SELECT. A trailing `;` is
    /// tolerated; `;` followed by anything else is not.
    fn check_statement_shape(&self, sql: &str) -> Result<(), SqlGuardError> {
        if let Some(pos) = sql.find(';') {
            if sql[pos + 1..].chars().any(|c| !c.is_whitespace()) {
                return Err(SqlGuardError::MultipleStatements);
            }
        }
        if !SELECT_HEAD.is_match(sql) {
            return Err(SqlGuardError::NotSelect);
        }
        Ok(())
    }

    fn check_tables(&self, sql: &str) -> Result<(), SqlGuardError> {
        if FROM_SUBQUERY.is_match(sql) {
            return Err(SqlGuardError::ForbiddenTable {
                table: "subquery".to_string(),
            });
        }
        let mut referenced = false;
        for caps in FROM_TABLE
            .captures_iter(sql)
            .chain(JOIN_TABLE.captures_iter(sql))
        {
            referenced = true;
            let table = &caps[1];
            if !self.table_allowed(table) {
                return Err(SqlGuardError::ForbiddenTable {
                    table: table.to_string(),
                });
            }
        }
        if !referenced {
            return Err(SqlGuardError::ForbiddenTable {
                table: "<none>".to_string(),
            });
        }
        Ok(())
    }

    /// Whole-token scan, so a column like `updates` never trips the
    /// `UPDATE` entry.
    fn check_deny_keywords(&self, sql: &str) -> Result<(), SqlGuardError> {
        for token in IDENTIFIER.find_iter(sql) {
            let word = token.as_str();
            if contains_word(&self.deny_keywords, word) {
                return Err(SqlGuardError::ForbiddenKeyword {
                    keyword: word.to_ascii_uppercase(),
                });
            }
        }
        Ok(())
    }

    fn check_columns(&self, sql: &str) -> Result<(), SqlGuardError> {
        for token in IDENTIFIER.find_iter(sql) {
            let word = token.as_str();
            if contains_word(&self.statement_keywords, word)
                || contains_word(&self.functions, word)
                || self.table_allowed(word)
                || contains_word(&self.allowed_columns, word)
            {
                continue;
            }
            return Err(SqlGuardError::ForbiddenColumn {
                column: word.to_string(),
            });
        }
        Ok(())
    }

    fn table_allowed(&self, table: &str) -> bool {
        contains_word(&self.allowed_tables, table)
    }
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_word(list: &[&'static str], word: &str) -> bool {
    list.iter().any(|w| w.eq_ignore_ascii_case(word))
}
