//! Lesson schedules and the pairing transaction.

use super::sqlite_repo::{
    SqliteRepo, count, int, opt_int, parsed, repo_err, text, time, time_text, timestamp, ts_text,
};
use crate::domain::{
    DomainError, LessonSchedule, LessonStatus, LessonUpdate, LessonView, NewLesson,
    StudentRequestStatus, TutorRequestStatus,
};
use crate::ports::{LessonFilter, LessonRepo, PairRejection};
use chrono::Utc;
use libsql::{Connection, Row, TransactionBehavior, params};
use tracing::{info, warn};

const LESSON_VIEW_SELECT: &str = r#"
SELECT l.id, l.tutor_id, l.student_id, l.subject, l.day_of_week, l.start_time, l.duration,
       l.frequency, l.location, l.status, l.student_request_id, l.tutor_request_id, l.created_at,
       t.first_name || ' ' || t.last_name, s.first_name || ' ' || s.last_name
FROM lessons l
JOIN users t ON t.id = l.tutor_id
JOIN users s ON s.id = l.student_id
"#;

/// Monday first, matching the week as shown on dashboards.
const DAY_ORDER: &str = "CASE l.day_of_week \
     WHEN 'monday' THEN 1 WHEN 'tuesday' THEN 2 WHEN 'wednesday' THEN 3 \
     WHEN 'thursday' THEN 4 WHEN 'friday' THEN 5 WHEN 'saturday' THEN 6 \
     WHEN 'sunday' THEN 7 ELSE 8 END";

fn lesson_view_from_row(row: &Row) -> Result<LessonView, DomainError> {
    let duration = int(row, 6)?;
    let lesson = LessonSchedule {
        id: int(row, 0)?,
        tutor_id: int(row, 1)?,
        student_id: int(row, 2)?,
        subject: text(row, 3)?,
        day_of_week: parsed(row, 4)?,
        start_time: time(row, 5)?,
        duration: u32::try_from(duration)
            .map_err(|_| DomainError::Repo(format!("bad lesson duration {duration}")))?,
        frequency: parsed(row, 7)?,
        location: text(row, 8)?,
        status: parsed(row, 9)?,
        student_request_id: opt_int(row, 10),
        tutor_request_id: opt_int(row, 11),
        created_at: timestamp(row, 12)?,
    };
    Ok(LessonView {
        end_time: lesson.end_time(),
        lesson,
        tutor_name: text(row, 13)?,
        student_name: text(row, 14)?,
    })
}

async fn insert_on(conn: &Connection, lesson: &NewLesson) -> Result<i64, libsql::Error> {
    conn.execute(
        r#"
        INSERT INTO lessons
            (tutor_id, student_id, subject, day_of_week, start_time, duration, frequency,
             location, status, student_request_id, tutor_request_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            lesson.tutor_id,
            lesson.student_id,
            lesson.subject.as_str(),
            lesson.day_of_week.as_str(),
            time_text(lesson.start_time),
            i64::from(lesson.duration),
            lesson.frequency.as_str(),
            lesson.location.as_str(),
            LessonStatus::Scheduled.as_str(),
            lesson.student_request_id,
            lesson.tutor_request_id,
            ts_text(Utc::now())
        ],
    )
    .await?;
    Ok(conn.last_insert_rowid())
}

impl SqliteRepo {
    async fn lesson_schedule(&self, id: i64) -> Result<LessonSchedule, DomainError> {
        self.get_lesson(id)
            .await?
            .map(|view| view.lesson)
            .ok_or(DomainError::not_found("lesson", id))
    }
}

#[async_trait::async_trait]
impl LessonRepo for SqliteRepo {
    async fn get_lesson(&self, id: i64) -> Result<Option<LessonView>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{LESSON_VIEW_SELECT} WHERE l.id = ?1");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => lesson_view_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_lessons(&self, filter: LessonFilter) -> Result<Vec<LessonView>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "{LESSON_VIEW_SELECT} \
             WHERE (?1 IS NULL OR l.tutor_id = ?1) AND (?2 IS NULL OR l.student_id = ?2) \
               AND (?3 IS NULL OR l.status = ?3) \
             ORDER BY {DAY_ORDER}, l.start_time, l.id"
        );
        let mut rows = conn
            .query(
                &sql,
                params![
                    filter.tutor_id,
                    filter.student_id,
                    filter.status.map(|s| s.as_str())
                ],
            )
            .await
            .map_err(repo_err)?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            lessons.push(lesson_view_from_row(&row)?);
        }
        Ok(lessons)
    }

    async fn update_lesson(&self, id: i64, update: &LessonUpdate) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                r#"
                UPDATE lessons
                SET subject = ?2, day_of_week = ?3, start_time = ?4, duration = ?5,
                    frequency = ?6, status = ?7, location = ?8
                WHERE id = ?1
                "#,
                params![
                    id,
                    update.subject.as_str(),
                    update.day_of_week.as_str(),
                    time_text(update.start_time),
                    i64::from(update.duration),
                    update.frequency.as_str(),
                    update.status.as_str(),
                    update.location.as_str()
                ],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn set_lesson_status(&self, id: i64, status: LessonStatus) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE lessons SET status = ?2 WHERE id = ?1",
                params![id, status.as_str()],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn delete_lesson(&self, id: i64) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM lessons WHERE id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn pair_requests(
        &self,
        student_request_id: i64,
        tutor_request_id: i64,
        lesson: &NewLesson,
    ) -> Result<Result<LessonSchedule, PairRejection>, DomainError> {
        let conn = self.conn().await?;
        // Immediate: take the write lock up front so the status checks cannot race.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;

        let student_moved = tx
            .execute(
                "UPDATE student_requests SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![
                    student_request_id,
                    StudentRequestStatus::Pending.as_str(),
                    StudentRequestStatus::Approved.as_str()
                ],
            )
            .await
            .map_err(repo_err)?;
        if student_moved == 0 {
            tx.rollback().await.map_err(repo_err)?;
            warn!(student_request_id, "pairing refused: student request not pending");
            return Ok(Err(PairRejection::StudentRequestNotPending));
        }

        let tutor_moved = tx
            .execute(
                "UPDATE tutor_requests SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![
                    tutor_request_id,
                    TutorRequestStatus::Available.as_str(),
                    TutorRequestStatus::Scheduled.as_str()
                ],
            )
            .await
            .map_err(repo_err)?;
        if tutor_moved == 0 {
            tx.rollback().await.map_err(repo_err)?;
            warn!(tutor_request_id, "pairing refused: tutor request not available");
            return Ok(Err(PairRejection::TutorRequestNotAvailable));
        }

        let id = insert_on(&tx, lesson).await.map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        info!(
            lesson_id = id,
            student_request_id, tutor_request_id, "requests paired into lesson"
        );
        self.lesson_schedule(id).await.map(Ok)
    }

    async fn count_lessons(&self, status: Option<LessonStatus>) -> Result<u64, DomainError> {
        self.scalar(
            "SELECT COUNT(*) FROM lessons WHERE ?1 IS NULL OR status = ?1",
            params![status.map(|s| s.as_str())],
        )
        .await
        .map(count)
    }
}
