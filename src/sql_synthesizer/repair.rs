//! Repair pipeline for provider SQL replies.
//!
//! Each step is a pure `&str -> String` function and is idempotent on its
//! own output. `postprocess` applies them in order; `validate` decides
//! whether the result may be executed.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"(?i)```(?:sql)?").unwrap();
    static ref LEADING_LABEL: Regex = Regex::new(r"(?i)^\s*(?:(?:sql|query)\s*:\s*)+").unwrap();
    static ref SELECT_AT_LINE_START: Regex = Regex::new(r"(?im)^[ \t]*select\b").unwrap();
    static ref SELECT_ANYWHERE: Regex = Regex::new(r"(?i)\bselect\b").unwrap();
    static ref STARTS_WITH_SELECT: Regex = Regex::new(r"(?i)^select\b").unwrap();
    static ref FROM_CLAUSE: Regex = Regex::new(r"(?i)\bfrom\b").unwrap();
    static ref CLAUSE_AFTER_SOURCE: Regex =
        Regex::new(r"(?i)\b(?:where|group\s+by|having|order\s+by|limit)\b").unwrap();
}

pub fn has_retrieval_keyword(sql: &str) -> bool {
    SELECT_ANYWHERE.is_match(sql)
}

pub fn has_source_clause(sql: &str) -> bool {
    FROM_CLAUSE.is_match(sql)
}

/// Step 1: drop code-fence markers and a leading `SQL:` / `Query:` label.
pub fn strip_fences(reply: &str) -> String {
    let unfenced = FENCE.replace_all(reply, "");
    LEADING_LABEL.replace(unfenced.trim(), "").trim().to_string()
}

/// Step 2: discard prose in front of the first `SELECT`.
///
/// A `SELECT` that opens a line wins over one buried in a sentence, so
/// "Here is how to select it:\nSELECT ..." keeps the real statement.
pub fn drop_leading_prose(sql: &str) -> String {
    let start = SELECT_AT_LINE_START
        .find(sql)
        .map(|m| m.start() + (m.as_str().len() - m.as_str().trim_start().len()))
        .or_else(|| SELECT_ANYWHERE.find(sql).map(|m| m.start()));

    match start {
        Some(idx) => sql[idx..].trim().to_string(),
        None => sql.trim().to_string(),
    }
}

/// Step 3: reduce a multi-line reply to one line.
///
/// A first line that already holds both `SELECT` and `FROM` is kept alone;
/// otherwise all non-blank lines are joined with single spaces.
pub fn collapse_lines(sql: &str) -> String {
    let lines: Vec<&str> = sql
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match lines.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [first, ..] if has_retrieval_keyword(first) && has_source_clause(first) => first.to_string(),
        _ => lines.join(" "),
    }
}

/// Step 4: drop trailing statement terminators.
pub fn strip_terminator(sql: &str) -> String {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Step 5: splice `FROM <table>` into a `SELECT` that lacks one.
///
/// The clause goes right before the earliest WHERE / GROUP BY / HAVING /
/// ORDER BY / LIMIT, or at the end when none is present.
pub fn inject_source_clause(sql: &str, table_name: &str) -> String {
    if !has_retrieval_keyword(sql) || has_source_clause(sql) {
        return sql.to_string();
    }

    let insert_at = CLAUSE_AFTER_SOURCE
        .find(sql)
        .map(|m| m.start())
        .unwrap_or(sql.len());

    let before = sql[..insert_at].trim_end();
    let after = sql[insert_at..].trim_start();
    format!("{} FROM {} {}", before, table_name, after)
        .trim()
        .to_string()
}

/// Apply all repair steps in order.
pub fn postprocess(reply: &str, table_name: &str) -> String {
    let sql = strip_fences(reply);
    let sql = drop_leading_prose(&sql);
    let sql = collapse_lines(&sql);
    let sql = strip_terminator(&sql);
    inject_source_clause(&sql, table_name)
}

/// Why a repaired query is not executable, if it is not.
pub fn validate(sql: &str) -> std::result::Result<(), String> {
    if !STARTS_WITH_SELECT.is_match(sql) {
        return Err("query does not start with SELECT".to_string());
    }
    if !has_source_clause(sql) {
        return Err("query has no FROM clause".to_string());
    }
    Ok(())
}

/// Table names referenced right after FROM / JOIN.
pub fn source_tables(sql: &str) -> Vec<String> {
    lazy_static! {
        static ref SOURCE_TABLE: Regex =
            Regex::new(r#"(?i)\b(?:from|join)\s+["`\[]?([A-Za-z_][A-Za-z0-9_]*)"#).unwrap();
    }
    SOURCE_TABLE
        .captures_iter(sql)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
