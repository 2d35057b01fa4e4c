//! Accounts: sign-up, login, password and profile changes.
//!
//! Password hashing is CPU-bound and runs on the blocking pool via `spawn_blocking`.

use crate::domain::forms::{
    EMAIL_TAKEN_MESSAGE, PasswordForm, ProfileForm, SignUpForm, USERNAME_TAKEN_MESSAGE,
};
use crate::domain::{DomainError, FieldErrors, Role, Student, Tutor, User};
use crate::ports::{PasswordHasher, ProfileRepo, UserRepo};
use std::sync::Arc;
use tracing::{info, warn};

pub const INVALID_CREDENTIALS: &str = "The credentials provided were invalid!";
pub const INVALID_PASSWORD: &str = "Password is invalid";

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    profiles: Arc<dyn ProfileRepo>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        profiles: Arc<dyn ProfileRepo>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            profiles,
            hasher,
        }
    }

    pub(crate) async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::Repo(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::Repo(format!("verify task failed: {e}")))?
    }

    /// Field errors for a username or email another user already holds.
    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<i64>,
    ) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();
        if self.users.username_taken(username, except).await? {
            errors.add("username", USERNAME_TAKEN_MESSAGE);
        }
        if self.users.email_taken(email, except).await? {
            errors.add("email", EMAIL_TAKEN_MESSAGE);
        }
        errors.into_result(()).map_err(DomainError::from)
    }

    /// Creates the account; the store adds the profile its role needs (none for admins).
    pub async fn sign_up(&self, form: &SignUpForm, role: Role) -> Result<User, DomainError> {
        let sign_up = form.validate(role)?;
        self.ensure_unique(&sign_up.user.username, &sign_up.user.email, None)
            .await?;
        let hash = self.hash_password(sign_up.password).await?;
        let user = self.users.create_user(&sign_up.user, &hash).await?;
        info!(user_id = user.id, role = %role, "account signed up");
        Ok(user)
    }

    /// Console-only path to an admin account.
    pub async fn create_admin(&self, form: &SignUpForm) -> Result<User, DomainError> {
        self.sign_up(form, Role::Admin).await
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let invalid = || DomainError::Auth(INVALID_CREDENTIALS.to_string());
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            return Err(invalid());
        };
        match self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await
        {
            Ok(true) => {
                info!(user_id = user.id, "logged in");
                Ok(user)
            }
            Ok(false) => Err(invalid()),
            Err(e) => {
                warn!(user_id = user.id, error = %e, "stored password hash unreadable");
                Err(e)
            }
        }
    }

    pub async fn change_password(&self, user: &User, form: &PasswordForm) -> Result<(), DomainError> {
        let (current, new) = form.validate()?;
        let verified = self
            .verify_password(current, user.password_hash.clone())
            .await?;
        if !verified {
            return Err(FieldErrors::single("password", INVALID_PASSWORD).into());
        }
        let hash = self.hash_password(new).await?;
        if !self.users.set_password_hash(user.id, &hash).await? {
            return Err(DomainError::not_found("user", user.id));
        }
        info!(user_id = user.id, "password changed");
        Ok(())
    }

    pub async fn update_profile(&self, user: &User, form: &ProfileForm) -> Result<User, DomainError> {
        let update = form.validate()?;
        self.ensure_unique(&update.username, &update.email, Some(user.id))
            .await?;
        if !self.users.update_profile(user.id, &update).await? {
            return Err(DomainError::not_found("user", user.id));
        }
        info!(user_id = user.id, "profile updated");
        self.user(user.id).await
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        self.users.get_user(id).await
    }

    pub async fn user(&self, id: i64) -> Result<User, DomainError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(DomainError::not_found("user", id))
    }

    pub async fn student_profile(&self, user: &User) -> Result<Option<Student>, DomainError> {
        self.profiles.student_for_user(user.id).await
    }

    pub async fn tutor_profile(&self, user: &User) -> Result<Option<Tutor>, DomainError> {
        self.profiles.tutor_for_user(user.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forms::{CONFIRMATION_MESSAGE, PASSWORD_MESSAGE, USERNAME_MESSAGE};
    use crate::usecases::testing::Fixture;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn form(username: &str, email: &str) -> SignUpForm {
        SignUpForm {
            first_name: s("Jane"),
            last_name: s("Doe"),
            username: s(username),
            email: s(email),
            new_password: s("Password123"),
            password_confirmation: s("Password123"),
        }
    }

    fn field_errors(err: DomainError) -> FieldErrors {
        match err {
            DomainError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_up_creates_role_profile() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        let student = accounts
            .sign_up(&form("@charlie", "charlie@example.org"), Role::Student)
            .await
            .unwrap();
        let tutor = accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Tutor)
            .await
            .unwrap();
        assert!(student.password_hash.starts_with("$argon2id$"));
        assert!(accounts.student_profile(&student).await.unwrap().is_some());
        assert!(accounts.tutor_profile(&student).await.unwrap().is_none());
        let profile = accounts.tutor_profile(&tutor).await.unwrap().unwrap();
        assert_eq!(profile.subject, "Default Subject");
        assert_eq!(tutor.dashboard_path(), "/tutor/dashboard/");
    }

    #[tokio::test]
    async fn sign_up_reports_every_bad_field() {
        let fx = Fixture::new().await;
        let mut bad = form("janedoe", "not-an-email");
        bad.new_password = s("password");
        bad.password_confirmation = s("different");
        let errors = field_errors(
            fx.services
                .accounts
                .sign_up(&bad, Role::Student)
                .await
                .unwrap_err(),
        );
        assert!(errors.contains("username", USERNAME_MESSAGE));
        assert!(errors.contains("email", "Enter a valid email address."));
        assert!(errors.contains("new_password", PASSWORD_MESSAGE));
        assert!(errors.contains("password_confirmation", CONFIRMATION_MESSAGE));
    }

    #[tokio::test]
    async fn sign_up_rejects_taken_username_and_email() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Student)
            .await
            .unwrap();
        let errors = field_errors(
            accounts
                .sign_up(&form("@janedoe", "jane@example.org"), Role::Tutor)
                .await
                .unwrap_err(),
        );
        assert!(errors.contains("username", USERNAME_TAKEN_MESSAGE));
        assert!(errors.contains("email", EMAIL_TAKEN_MESSAGE));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        let user = accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Student)
            .await
            .unwrap();
        assert_eq!(
            accounts.authenticate("@janedoe", "Password123").await.unwrap().id,
            user.id
        );
        for (username, password) in [("@janedoe", "WrongPassword1"), ("@ghost", "Password123")] {
            let err = accounts.authenticate(username, password).await.unwrap_err();
            assert_eq!(err.to_string(), format!("Authentication failed: {INVALID_CREDENTIALS}"));
        }
    }

    #[tokio::test]
    async fn unreadable_stored_hash_is_a_store_error() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        let user = accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Student)
            .await
            .unwrap();
        fx.repo.set_password_hash(user.id, "not-a-hash").await.unwrap();
        assert!(matches!(
            accounts.authenticate("@janedoe", "Password123").await,
            Err(DomainError::Repo(_))
        ));
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        let user = accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Student)
            .await
            .unwrap();

        let wrong = PasswordForm {
            password: s("Nope1234"),
            new_password: s("NewPassword123"),
            password_confirmation: s("NewPassword123"),
        };
        let errors = field_errors(accounts.change_password(&user, &wrong).await.unwrap_err());
        assert!(errors.contains("password", INVALID_PASSWORD));

        let right = PasswordForm {
            password: s("Password123"),
            ..wrong
        };
        accounts.change_password(&user, &right).await.unwrap();
        assert!(accounts.authenticate("@janedoe", "NewPassword123").await.is_ok());
        assert!(accounts.authenticate("@janedoe", "Password123").await.is_err());
    }

    #[tokio::test]
    async fn update_profile_allows_own_username() {
        let fx = Fixture::new().await;
        let accounts = &fx.services.accounts;
        let jane = accounts
            .sign_up(&form("@janedoe", "jane@example.org"), Role::Student)
            .await
            .unwrap();
        accounts
            .sign_up(&form("@charlie", "charlie@example.org"), Role::Student)
            .await
            .unwrap();

        let keep = ProfileForm {
            first_name: s("Janet"),
            last_name: s("Doe"),
            username: s("@janedoe"),
            email: s("JANE@example.org"),
        };
        let updated = accounts.update_profile(&jane, &keep).await.unwrap();
        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.email, "jane@example.org");

        let steal = ProfileForm {
            username: s("@charlie"),
            ..keep
        };
        let errors = field_errors(accounts.update_profile(&jane, &steal).await.unwrap_err());
        assert!(errors.contains("username", USERNAME_TAKEN_MESSAGE));
    }
}
