//! Invoices: admin creation, paid toggle, deletion, and per-party viewing.

use crate::domain::forms::InvoiceForm;
use crate::domain::{
    DomainError, FieldErrors, InvoiceStatus, InvoiceView, NewInvoice, StudentSummary,
    TutorSummary, User,
};
use crate::ports::{InvoiceFilter, InvoiceRepo, ProfileRepo};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const INVOICE_CREATED: &str = "Invoice created successfully!";
pub const INVOICE_DELETED: &str = "Invoice deleted successfully!";
pub const NOT_A_STUDENT: &str = "You are not registered as a student.";
const UNKNOWN_PROFILE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Flash text after toggling an invoice to `status`.
pub fn toggled_message(id: i64, status: InvoiceStatus) -> String {
    match status {
        InvoiceStatus::Paid => format!("Invoice {id} marked as paid."),
        InvoiceStatus::Unpaid => format!("Invoice {id} marked as Unpaid."),
    }
}

/// Everything the admin invoice page lists.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceOverview {
    pub invoices: Vec<InvoiceView>,
    pub students: Vec<StudentSummary>,
    pub tutors: Vec<TutorSummary>,
}

pub struct InvoiceService {
    invoices: Arc<dyn InvoiceRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl InvoiceService {
    pub fn new(invoices: Arc<dyn InvoiceRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { invoices, profiles }
    }

    pub async fn create_invoice(&self, form: &InvoiceForm) -> Result<InvoiceView, DomainError> {
        let draft = form.validate()?;
        let mut errors = FieldErrors::new();
        if self.profiles.get_student(draft.student_id).await?.is_none() {
            errors.add("student", UNKNOWN_PROFILE);
        }
        if self.profiles.get_tutor(draft.tutor_id).await?.is_none() {
            errors.add("tutor", UNKNOWN_PROFILE);
        }
        errors.into_result(())?;

        let view = self
            .invoices
            .insert_invoice(&NewInvoice {
                student_id: draft.student_id,
                tutor_id: draft.tutor_id,
                amount: draft.amount,
                due_date: draft.due_date,
            })
            .await?;
        info!(invoice_id = view.invoice.id, amount = %view.invoice.amount, "invoice created");
        Ok(view)
    }

    pub async fn invoice(&self, id: i64) -> Result<InvoiceView, DomainError> {
        self.invoices
            .get_invoice(id)
            .await?
            .ok_or(DomainError::not_found("invoice", id))
    }

    /// Unpaid becomes paid and paid becomes unpaid. Returns the new status.
    pub async fn toggle_paid(&self, id: i64) -> Result<InvoiceStatus, DomainError> {
        let current = self.invoice(id).await?.invoice.status;
        let next = current.toggled();
        if !self.invoices.set_invoice_status(id, next).await? {
            return Err(DomainError::not_found("invoice", id));
        }
        info!(invoice_id = id, from = %current, to = %next, "invoice status toggled");
        Ok(next)
    }

    pub async fn delete_invoice(&self, id: i64) -> Result<(), DomainError> {
        if !self.invoices.delete_invoice(id).await? {
            return Err(DomainError::not_found("invoice", id));
        }
        info!(invoice_id = id, "invoice deleted");
        Ok(())
    }

    /// Admins and the two invoiced parties may look at an invoice.
    pub async fn view_invoice(&self, user: &User, id: i64) -> Result<InvoiceView, DomainError> {
        let view = self.invoice(id).await?;
        if user.is_admin() || view.student_user_id == user.id || view.tutor_user_id == user.id {
            Ok(view)
        } else {
            Err(DomainError::PermissionDenied(format!(
                "user {} is not a party to invoice {id}",
                user.id
            )))
        }
    }

    /// Invoices billed to the user's student profile.
    pub async fn student_invoices(&self, user: &User) -> Result<Vec<InvoiceView>, DomainError> {
        let Some(student) = self.profiles.student_for_user(user.id).await? else {
            return Err(DomainError::InvalidState(NOT_A_STUDENT.to_string()));
        };
        self.invoices
            .list_invoices(InvoiceFilter {
                student_id: Some(student.id),
                status: None,
            })
            .await
    }

    pub async fn overview(&self) -> Result<InvoiceOverview, DomainError> {
        Ok(InvoiceOverview {
            invoices: self.invoices.list_invoices(InvoiceFilter::default()).await?,
            students: self.profiles.list_students().await?,
            tutors: self.profiles.list_tutors().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forms::INVOICE_PARTIES_MESSAGE;
    use crate::domain::NON_FIELD;
    use crate::usecases::testing::{Fixture, s};

    struct Parties {
        fx: Fixture,
        student: User,
        tutor: User,
        student_id: i64,
        tutor_id: i64,
    }

    async fn setup() -> Parties {
        let fx = Fixture::new().await;
        let student = fx.student("@charlie").await;
        let tutor = fx.tutor("@janedoe").await;
        let student_id = fx
            .services
            .accounts
            .student_profile(&student)
            .await
            .unwrap()
            .unwrap()
            .id;
        let tutor_id = fx
            .services
            .accounts
            .tutor_profile(&tutor)
            .await
            .unwrap()
            .unwrap()
            .id;
        Parties {
            fx,
            student,
            tutor,
            student_id,
            tutor_id,
        }
    }

    fn form(student: i64, tutor: i64, amount: &str) -> InvoiceForm {
        InvoiceForm {
            student: Some(student.to_string()),
            tutor: Some(tutor.to_string()),
            amount: s(amount),
            due_date: s("2030-12-31"),
        }
    }

    #[tokio::test]
    async fn create_and_toggle() {
        let p = setup().await;
        let invoices = &p.fx.services.invoices;
        let view = invoices
            .create_invoice(&form(p.student_id, p.tutor_id, "150.00"))
            .await
            .unwrap();
        assert_eq!(view.invoice.amount.to_string(), "150.00");
        assert_eq!(view.invoice.status, InvoiceStatus::Unpaid);

        let id = view.invoice.id;
        assert_eq!(invoices.toggle_paid(id).await.unwrap(), InvoiceStatus::Paid);
        assert_eq!(toggled_message(id, InvoiceStatus::Paid), format!("Invoice {id} marked as paid."));
        assert_eq!(invoices.toggle_paid(id).await.unwrap(), InvoiceStatus::Unpaid);
        assert_eq!(
            toggled_message(id, InvoiceStatus::Unpaid),
            format!("Invoice {id} marked as Unpaid.")
        );
        assert!(matches!(
            invoices.toggle_paid(9_999).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn create_validates_parties_and_amount() {
        let p = setup().await;
        let invoices = &p.fx.services.invoices;

        let missing = InvoiceForm {
            student: None,
            ..form(p.student_id, p.tutor_id, "10")
        };
        match invoices.create_invoice(&missing).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains(NON_FIELD, INVOICE_PARTIES_MESSAGE))
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        match invoices.create_invoice(&form(p.tutor_id + 50, p.tutor_id, "10")).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("student", UNKNOWN_PROFILE))
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        match invoices.create_invoice(&form(p.student_id, p.tutor_id, "abc")).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("amount", "Enter a number."))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(invoices.overview().await.unwrap().invoices.is_empty());
    }

    #[tokio::test]
    async fn parties_and_admin_can_view() {
        let p = setup().await;
        let invoices = &p.fx.services.invoices;
        let id = invoices
            .create_invoice(&form(p.student_id, p.tutor_id, "200"))
            .await
            .unwrap()
            .invoice
            .id;
        let admin = p.fx.admin("@johndoe").await;
        let outsider = p.fx.student("@outsider").await;

        for viewer in [&p.student, &p.tutor, &admin] {
            let view = invoices.view_invoice(viewer, id).await.unwrap();
            assert_eq!(view.student_username, "@charlie");
            assert_eq!(view.tutor_username, "@janedoe");
        }
        assert!(matches!(
            invoices.view_invoice(&outsider, id).await.unwrap_err(),
            DomainError::PermissionDenied(_)
        ));
        assert!(matches!(
            invoices.view_invoice(&admin, 9_999).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn student_invoices_need_student_profile() {
        let p = setup().await;
        let invoices = &p.fx.services.invoices;
        invoices
            .create_invoice(&form(p.student_id, p.tutor_id, "50"))
            .await
            .unwrap();
        assert_eq!(invoices.student_invoices(&p.student).await.unwrap().len(), 1);
        let err = invoices.student_invoices(&p.tutor).await.unwrap_err();
        assert_eq!(err.to_string(), NOT_A_STUDENT);
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let p = setup().await;
        let invoices = &p.fx.services.invoices;
        let id = invoices
            .create_invoice(&form(p.student_id, p.tutor_id, "50"))
            .await
            .unwrap()
            .invoice
            .id;
        invoices.delete_invoice(id).await.unwrap();
        assert!(matches!(
            invoices.delete_invoice(id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
        let overview = invoices.overview().await.unwrap();
        assert!(overview.invoices.is_empty());
        assert_eq!(overview.students.len(), 1);
        assert_eq!(overview.tutors.len(), 1);
    }
}
