//! SQLite-backed repository via libsql. Implements every store port on one database file.
//!
//! All tables live in `<data_dir>/tutor_match.db`. The schema is created idempotently at
//! connect; each operation opens its own connection from the shared `Database` handle.
//! Row mapping helpers are shared with the per-aggregate impl files in this module.

use crate::domain::DomainError;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use libsql::{Connection, Database, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const DB_FILE: &str = "tutor_match.db";

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('student', 'tutor', 'admin')),
    password_hash TEXT NOT NULL,
    date_joined TEXT NOT NULL
)"#;

const STUDENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE
)"#;

const TUTORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tutors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
    subject TEXT NOT NULL,
    hourly_rate_cents INTEGER NOT NULL,
    availability TEXT NOT NULL,
    hours_taught INTEGER NOT NULL DEFAULT 0 CHECK (hours_taught >= 0)
)"#;

const STUDENT_REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS student_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    frequency TEXT NOT NULL,
    day_of_week TEXT NOT NULL,
    preferred_time TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    additional_details TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
)"#;

const TUTOR_REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tutor_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tutor_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    languages TEXT NOT NULL,
    day_of_week TEXT NOT NULL,
    available_time TEXT NOT NULL,
    level_can_teach TEXT NOT NULL,
    additional_details TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'available',
    created_at TEXT NOT NULL
)"#;

const LESSONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS lessons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tutor_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    student_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    subject TEXT NOT NULL,
    day_of_week TEXT NOT NULL,
    start_time TEXT NOT NULL,
    duration INTEGER NOT NULL CHECK (duration > 0),
    frequency TEXT NOT NULL,
    location TEXT NOT NULL DEFAULT 'Online',
    status TEXT NOT NULL DEFAULT 'scheduled',
    student_request_id INTEGER REFERENCES student_requests (id) ON DELETE SET NULL,
    tutor_request_id INTEGER REFERENCES tutor_requests (id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
)"#;

const INVOICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students (id) ON DELETE CASCADE,
    tutor_id INTEGER NOT NULL REFERENCES tutors (id) ON DELETE CASCADE,
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    status TEXT NOT NULL DEFAULT 'unpaid',
    created_at TEXT NOT NULL,
    due_date TEXT
)"#;

const FEEDBACK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
)"#;

const SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER REFERENCES users (id) ON DELETE CASCADE,
    flashes_json TEXT NOT NULL DEFAULT '[]',
    expires_at TEXT NOT NULL
)"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_student_requests_student ON student_requests (student_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_tutor_requests_day ON tutor_requests (day_of_week, status)",
    "CREATE INDEX IF NOT EXISTS idx_lessons_tutor ON lessons (tutor_id)",
    "CREATE INDEX IF NOT EXISTS idx_lessons_student ON lessons (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_invoices_student ON invoices (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions (expires_at)",
];

/// SQLite repository. One database file (tutor_match.db) in the given base directory.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join(DB_FILE);
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // journal_mode and synchronous return a row; execute fails when rows come back.
        drain(&conn, "PRAGMA journal_mode=WAL").await?;
        drain(&conn, "PRAGMA synchronous=NORMAL").await?;

        for ddl in [
            USERS_TABLE,
            STUDENTS_TABLE,
            TUTORS_TABLE,
            STUDENT_REQUESTS_TABLE,
            TUTOR_REQUESTS_TABLE,
            LESSONS_TABLE,
            INVOICES_TABLE,
            FEEDBACK_TABLE,
            SESSIONS_TABLE,
        ]
        .into_iter()
        .chain(INDEXES.iter().copied())
        {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// A fresh connection with foreign keys enforced and a busy timeout set.
    pub(super) async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(repo_err)?;
        drain(&conn, "PRAGMA busy_timeout = 5000").await?;
        Ok(conn)
    }

    /// Runs a `SELECT COUNT(*)`/`SUM` style query that yields one integer.
    pub(super) async fn scalar(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn.query(sql, params).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(row.get::<i64>(0).unwrap_or(0)),
            None => Ok(0),
        }
    }
}

async fn drain(conn: &Connection, pragma: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(pragma, ())
        .await
        .map_err(|e| DomainError::Repo(format!("{pragma} failed: {e}")))?;
    while rows.next().await.map_err(repo_err)?.is_some() {}
    Ok(())
}

pub(super) fn repo_err(e: libsql::Error) -> DomainError {
    DomainError::Repo(e.to_string())
}

pub(super) fn int(row: &Row, idx: i32) -> Result<i64, DomainError> {
    row.get::<i64>(idx).map_err(repo_err)
}

pub(super) fn text(row: &Row, idx: i32) -> Result<String, DomainError> {
    row.get::<String>(idx).map_err(repo_err)
}

/// NULL reads as `None`.
pub(super) fn opt_int(row: &Row, idx: i32) -> Option<i64> {
    row.get::<i64>(idx).ok()
}

pub(super) fn opt_text(row: &Row, idx: i32) -> Option<String> {
    row.get::<String>(idx).ok()
}

/// Parses a stored choice or other `FromStr` column.
pub(super) fn parsed<T: FromStr>(row: &Row, idx: i32) -> Result<T, DomainError> {
    let raw = text(row, idx)?;
    raw.parse()
        .map_err(|_| DomainError::Repo(format!("unreadable value {raw:?} in column {idx}")))
}

pub(super) fn timestamp(row: &Row, idx: i32) -> Result<DateTime<Utc>, DomainError> {
    let raw = text(row, idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::Repo(format!("bad timestamp {raw:?}: {e}")))
}

pub(super) fn time(row: &Row, idx: i32) -> Result<NaiveTime, DomainError> {
    let raw = text(row, idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT)
        .map_err(|e| DomainError::Repo(format!("bad time {raw:?}: {e}")))
}

pub(super) fn date(row: &Row, idx: i32) -> Result<NaiveDate, DomainError> {
    let raw = text(row, idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| DomainError::Repo(format!("bad date {raw:?}: {e}")))
}

pub(super) fn opt_date(row: &Row, idx: i32) -> Result<Option<NaiveDate>, DomainError> {
    match opt_text(row, idx) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| DomainError::Repo(format!("bad date {raw:?}: {e}"))),
    }
}

const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed-width UTC so text order equals time order.
pub(super) fn ts_text(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn time_text(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub(super) fn date_text(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Row count as reported by `execute`, widened for the `count_*` ports.
pub(super) fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::SqliteRepo;
    use crate::domain::{NewUser, Role};
    use crate::ports::UserRepo;
    use tempfile::TempDir;

    /// Fresh database in a temp dir. Keep the dir alive for the test's duration.
    pub async fn repo() -> (TempDir, SqliteRepo) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path()).await.unwrap();
        (dir, repo)
    }

    pub async fn user(repo: &SqliteRepo, username: &str, role: Role) -> crate::domain::User {
        let name = username.trim_start_matches('@');
        repo.create_user(
            &NewUser {
                username: username.to_string(),
                first_name: name.to_string(),
                last_name: "Tester".to_string(),
                email: format!("{name}@example.org"),
                role,
            },
            "hash",
        )
        .await
        .unwrap()
    }
}
