//! Invoices and site feedback.

use super::sqlite_repo::{
    SqliteRepo, count, date, date_text, int, opt_date, parsed, repo_err, text, timestamp, ts_text,
};
use crate::domain::{
    DomainError, Feedback, Invoice, InvoiceStatus, InvoiceView, Money, NewFeedback, NewInvoice,
};
use crate::ports::{FeedbackRepo, InvoiceFilter, InvoiceRepo};
use chrono::Utc;
use libsql::{Row, params};
use tracing::info;

const INVOICE_VIEW_SELECT: &str = r#"
SELECT i.id, i.student_id, i.tutor_id, i.amount_cents, i.status, i.created_at, i.due_date,
       su.id, su.username, tu.id, tu.username
FROM invoices i
JOIN students s ON s.id = i.student_id
JOIN users su ON su.id = s.user_id
JOIN tutors t ON t.id = i.tutor_id
JOIN users tu ON tu.id = t.user_id
"#;

fn invoice_view_from_row(row: &Row) -> Result<InvoiceView, DomainError> {
    let invoice = Invoice {
        id: int(row, 0)?,
        student_id: int(row, 1)?,
        tutor_id: int(row, 2)?,
        amount: Money::from_cents(int(row, 3)?),
        status: parsed(row, 4)?,
        created_at: date(row, 5)?,
        due_date: opt_date(row, 6)?,
    };
    Ok(InvoiceView {
        overdue: invoice.is_overdue(Utc::now().date_naive()),
        invoice,
        student_user_id: int(row, 7)?,
        student_username: text(row, 8)?,
        tutor_user_id: int(row, 9)?,
        tutor_username: text(row, 10)?,
    })
}

#[async_trait::async_trait]
impl InvoiceRepo for SqliteRepo {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceView, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO invoices (student_id, tutor_id, amount_cents, status, created_at, due_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                invoice.student_id,
                invoice.tutor_id,
                invoice.amount.cents(),
                InvoiceStatus::Unpaid.as_str(),
                date_text(Utc::now().date_naive()),
                invoice.due_date.map(date_text)
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = conn.last_insert_rowid();
        info!(invoice_id = id, amount = %invoice.amount, "invoice stored");
        self.get_invoice(id)
            .await?
            .ok_or(DomainError::not_found("invoice", id))
    }

    async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceView>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{INVOICE_VIEW_SELECT} WHERE i.id = ?1");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => invoice_view_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<InvoiceView>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "{INVOICE_VIEW_SELECT} \
             WHERE (?1 IS NULL OR i.student_id = ?1) AND (?2 IS NULL OR i.status = ?2) \
             ORDER BY i.due_date IS NULL, i.due_date, i.id"
        );
        let mut rows = conn
            .query(
                &sql,
                params![filter.student_id, filter.status.map(|s| s.as_str())],
            )
            .await
            .map_err(repo_err)?;
        let mut invoices = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            invoices.push(invoice_view_from_row(&row)?);
        }
        Ok(invoices)
    }

    async fn set_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE invoices SET status = ?2 WHERE id = ?1",
                params![id, status.as_str()],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn delete_invoice(&self, id: i64) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM invoices WHERE id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }
}

fn feedback_from_row(row: &Row) -> Result<Feedback, DomainError> {
    Ok(Feedback {
        id: int(row, 0)?,
        name: text(row, 1)?,
        email: text(row, 2)?,
        message: text(row, 3)?,
        created_at: timestamp(row, 4)?,
    })
}

#[async_trait::async_trait]
impl FeedbackRepo for SqliteRepo {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, DomainError> {
        let created_at = Utc::now();
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO feedback (name, email, message, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                feedback.name.as_str(),
                feedback.email.as_str(),
                feedback.message.as_str(),
                ts_text(created_at)
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = conn.last_insert_rowid();
        info!(feedback_id = id, "feedback stored");
        let mut rows = conn
            .query(
                "SELECT id, name, email, message, created_at FROM feedback WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => feedback_from_row(&row),
            None => Err(DomainError::not_found("feedback", id)),
        }
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, name, email, message, created_at FROM feedback \
                 ORDER BY created_at DESC, id DESC",
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut feedback = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            feedback.push(feedback_from_row(&row)?);
        }
        Ok(feedback)
    }

    async fn count_feedback(&self) -> Result<u64, DomainError> {
        self.scalar("SELECT COUNT(*) FROM feedback", ())
            .await
            .map(count)
    }
}
