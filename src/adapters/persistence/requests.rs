//! Student lesson requests and tutor availability.

use super::sqlite_repo::{SqliteRepo, int, parsed, repo_err, text, time, time_text, timestamp, ts_text};
use crate::domain::{
    DomainError, NewStudentRequest, NewTutorRequest, StudentRequest, StudentRequestStatus,
    TutorRequest, TutorRequestStatus,
};
use crate::ports::{RequestRepo, StudentRequestFilter, TutorRequestFilter};
use chrono::Utc;
use libsql::{Row, params};
use tracing::info;

const STUDENT_REQUEST_COLUMNS: &str = "id, student_id, language, frequency, day_of_week, \
     preferred_time, difficulty, additional_details, status, created_at";
const TUTOR_REQUEST_COLUMNS: &str = "id, tutor_id, languages, day_of_week, available_time, \
     level_can_teach, additional_details, status, created_at";

fn student_request_from_row(row: &Row) -> Result<StudentRequest, DomainError> {
    Ok(StudentRequest {
        id: int(row, 0)?,
        student_id: int(row, 1)?,
        language: text(row, 2)?,
        frequency: parsed(row, 3)?,
        day_of_week: parsed(row, 4)?,
        preferred_time: time(row, 5)?,
        difficulty: parsed(row, 6)?,
        additional_details: text(row, 7)?,
        status: parsed(row, 8)?,
        created_at: timestamp(row, 9)?,
    })
}

fn tutor_request_from_row(row: &Row) -> Result<TutorRequest, DomainError> {
    Ok(TutorRequest {
        id: int(row, 0)?,
        tutor_id: int(row, 1)?,
        languages: text(row, 2)?,
        day_of_week: parsed(row, 3)?,
        available_time: time(row, 4)?,
        level_can_teach: parsed(row, 5)?,
        additional_details: text(row, 6)?,
        status: parsed(row, 7)?,
        created_at: timestamp(row, 8)?,
    })
}

#[async_trait::async_trait]
impl RequestRepo for SqliteRepo {
    async fn insert_student_request(
        &self,
        student_id: i64,
        request: &NewStudentRequest,
    ) -> Result<StudentRequest, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO student_requests
                (student_id, language, frequency, day_of_week, preferred_time, difficulty,
                 additional_details, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                student_id,
                request.language.as_str(),
                request.frequency.as_str(),
                request.day_of_week.as_str(),
                time_text(request.preferred_time),
                request.difficulty.as_str(),
                request.additional_details.as_str(),
                StudentRequestStatus::Pending.as_str(),
                ts_text(Utc::now())
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = conn.last_insert_rowid();
        info!(request_id = id, student_id, language = %request.language, "student request stored");
        self.get_student_request(id)
            .await?
            .ok_or(DomainError::not_found("student request", id))
    }

    async fn get_student_request(&self, id: i64) -> Result<Option<StudentRequest>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {STUDENT_REQUEST_COLUMNS} FROM student_requests WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => student_request_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_student_requests(
        &self,
        filter: StudentRequestFilter,
    ) -> Result<Vec<StudentRequest>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {STUDENT_REQUEST_COLUMNS} FROM student_requests \
             WHERE (?1 IS NULL OR student_id = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY created_at DESC, id DESC"
        );
        let mut rows = conn
            .query(
                &sql,
                params![filter.student_id, filter.status.map(|s| s.as_str())],
            )
            .await
            .map_err(repo_err)?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            requests.push(student_request_from_row(&row)?);
        }
        Ok(requests)
    }

    async fn transition_student_request(
        &self,
        id: i64,
        from: StudentRequestStatus,
        to: StudentRequestStatus,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE student_requests SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id, from.as_str(), to.as_str()],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn insert_tutor_request(
        &self,
        tutor_id: i64,
        request: &NewTutorRequest,
    ) -> Result<TutorRequest, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO tutor_requests
                (tutor_id, languages, day_of_week, available_time, level_can_teach,
                 additional_details, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                tutor_id,
                request.languages.as_str(),
                request.day_of_week.as_str(),
                time_text(request.available_time),
                request.level_can_teach.as_str(),
                request.additional_details.as_str(),
                TutorRequestStatus::Available.as_str(),
                ts_text(Utc::now())
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = conn.last_insert_rowid();
        info!(request_id = id, tutor_id, languages = %request.languages, "tutor availability stored");
        self.get_tutor_request(id)
            .await?
            .ok_or(DomainError::not_found("tutor request", id))
    }

    async fn get_tutor_request(&self, id: i64) -> Result<Option<TutorRequest>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {TUTOR_REQUEST_COLUMNS} FROM tutor_requests WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => tutor_request_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_tutor_requests(
        &self,
        filter: TutorRequestFilter,
    ) -> Result<Vec<TutorRequest>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {TUTOR_REQUEST_COLUMNS} FROM tutor_requests \
             WHERE (?1 IS NULL OR tutor_id = ?1) AND (?2 IS NULL OR status = ?2) \
               AND (?3 IS NULL OR day_of_week = ?3) \
             ORDER BY created_at DESC, id DESC"
        );
        let mut rows = conn
            .query(
                &sql,
                params![
                    filter.tutor_id,
                    filter.status.map(|s| s.as_str()),
                    filter.day_of_week.map(|d| d.as_str())
                ],
            )
            .await
            .map_err(repo_err)?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            requests.push(tutor_request_from_row(&row)?);
        }
        Ok(requests)
    }

    async fn transition_tutor_request(
        &self,
        id: i64,
        from: TutorRequestStatus,
        to: TutorRequestStatus,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE tutor_requests SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id, from.as_str(), to.as_str()],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }
}
