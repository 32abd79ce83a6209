//! Analysis History Store
//!
//! Records each question asked, the query it produced and how it ended.
//! SQLite (bundled) behind a single mutex-guarded connection.

use crate::error::{AnalystError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Succeeded,
    Failed,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Succeeded => "succeeded",
            HistoryStatus::Failed => "failed",
        }
    }
}

impl FromStr for HistoryStatus {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "succeeded" => Ok(HistoryStatus::Succeeded),
            "failed" => Ok(HistoryStatus::Failed),
            other => Err(AnalystError::Storage(format!("Unknown history status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub question: String,
    pub sql: Option<String>,
    pub status: HistoryStatus,
    pub row_count: Option<usize>,
    pub interpretation: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn succeeded(question: &str, sql: &str, row_count: usize, interpretation: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            sql: Some(sql.to_string()),
            status: HistoryStatus::Succeeded,
            row_count: Some(row_count),
            interpretation: Some(interpretation.to_string()),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn failed(question: &str, sql: Option<&str>, error_message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            sql: sql.map(str::to_string),
            status: HistoryStatus::Failed,
            row_count: None,
            interpretation: None,
            error_message: Some(error_message.to_string()),
            created_at: Utc::now(),
        }
    }
}

pub struct HistoryStore {
    db: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)
            .map_err(|e| AnalystError::Storage(format!("Failed to open database: {}", e)))?;
        let store = Self { db: Mutex::new(db) };
        store.init_schema()?;
        info!("History store opened at {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()
            .map_err(|e| AnalystError::Storage(format!("Failed to open database: {}", e)))?;
        let store = Self { db: Mutex::new(db) };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AnalystError::Storage("history connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_history (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                sql_query TEXT,
                status TEXT NOT NULL,
                row_count INTEGER,
                interpretation TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(|e| AnalystError::Storage(format!("Failed to create table: {}", e)))?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_created_at ON analysis_history(created_at)",
            [],
        )
        .map_err(|e| AnalystError::Storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    pub fn record(&self, entry: &HistoryEntry) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            r#"
            INSERT INTO analysis_history
            (id, question, sql_query, status, row_count, interpretation, error_message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.id.to_string(),
                entry.question,
                entry.sql,
                entry.status.as_str(),
                entry.row_count.map(|n| n as i64),
                entry.interpretation,
                entry.error_message,
                entry.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AnalystError::Storage(format!("Failed to insert history entry: {}", e)))?;

        debug!("Recorded history entry {} ({})", entry.id, entry.status.as_str());
        Ok(())
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            r#"
            SELECT id, question, sql_query, status, row_count, interpretation, error_message, created_at
            FROM analysis_history
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], read_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row_to_entry(row?)?);
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize> {
        let db = self.conn()?;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM analysis_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

type RawRow = (
    String,
    String,
    Option<String>,
    String,
    Option<i64>,
    Option<String>,
    Option<String>,
    String,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn row_to_entry(raw: RawRow) -> Result<HistoryEntry> {
    let (id, question, sql, status, row_count, interpretation, error_message, created_at) = raw;
    Ok(HistoryEntry {
        id: Uuid::parse_str(&id).map_err(|e| AnalystError::Storage(format!("Bad history id {}: {}", id, e)))?,
        question,
        sql,
        status: status.parse()?,
        row_count: row_count.map(|n| n as usize),
        interpretation,
        error_message,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| AnalystError::Storage(format!("Bad timestamp {}: {}", created_at, e)))?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let store = HistoryStore::open_in_memory().unwrap();
        let ok = HistoryEntry::succeeded("Average Tenure", "SELECT AVG(Tenure) FROM data", 1, "About 6 months");
        store.record(&ok).unwrap();

        let entries = store.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, ok.id);
        assert_eq!(entries[0].status, HistoryStatus::Succeeded);
        assert_eq!(entries[0].row_count, Some(1));
        assert_eq!(entries[0].sql.as_deref(), Some("SELECT AVG(Tenure) FROM data"));
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let store = HistoryStore::open_in_memory().unwrap();
        for i in 0..3 {
            let mut entry = HistoryEntry::failed(&format!("q{}", i), None, "provider down");
            entry.created_at = Utc::now() + chrono::Duration::seconds(i);
            store.record(&entry).unwrap();
        }

        let entries = store.recent(2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "q2");
        assert_eq!(entries[1].question, "q1");
        assert_eq!(entries[0].error_message.as_deref(), Some("provider down"));
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        {
            let store = HistoryStore::open(&path).unwrap();
            store.record(&HistoryEntry::failed("q", Some("SELECT x FROM data"), "bad column")).unwrap();
        }
        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
