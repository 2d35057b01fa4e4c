//! Browser sessions: login state and pending flash messages.

use super::sqlite_repo::{SqliteRepo, opt_int, repo_err, text, timestamp, ts_text};
use crate::domain::DomainError;
use crate::ports::{Flash, SessionRecord, SessionStore};
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::debug;

#[async_trait::async_trait]
impl SessionStore for SqliteRepo {
    async fn load_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT user_id, flashes_json, expires_at FROM sessions \
                 WHERE token = ?1 AND expires_at > ?2",
                params![token, ts_text(now)],
            )
            .await
            .map_err(repo_err)?;
        let Some(row) = rows.next().await.map_err(repo_err)? else {
            return Ok(None);
        };
        // A corrupt flash list is dropped rather than failing the request.
        let flashes: Vec<Flash> = serde_json::from_str(&text(&row, 1)?).unwrap_or_default();
        Ok(Some(SessionRecord {
            user_id: opt_int(&row, 0),
            flashes,
            expires_at: timestamp(&row, 2)?,
        }))
    }

    async fn save_session(&self, token: &str, record: &SessionRecord) -> Result<(), DomainError> {
        let flashes_json = serde_json::to_string(&record.flashes)
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO sessions (token, user_id, flashes_json, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (token) DO UPDATE SET
                user_id = excluded.user_id,
                flashes_json = excluded.flashes_json,
                expires_at = excluded.expires_at
            "#,
            params![
                token,
                record.user_id,
                flashes_json,
                ts_text(record.expires_at)
            ],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .await
            .map_err(repo_err)?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![ts_text(now)],
            )
            .await
            .map_err(repo_err)?;
        debug!(removed, "expired sessions purged");
        Ok(removed)
    }
}
