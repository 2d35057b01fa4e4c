//! Users and their student/tutor profiles.

use super::sqlite_repo::{SqliteRepo, count, int, parsed, repo_err, text, timestamp, ts_text};
use crate::domain::forms::{EMAIL_TAKEN_MESSAGE, USERNAME_TAKEN_MESSAGE};
use crate::domain::{
    DomainError, FieldErrors, Money, NewUser, ProfileUpdate, Role, Student, StudentSummary, Tutor,
    TutorProfile, TutorSummary, User,
};
use crate::ports::{ProfileRepo, UserRepo};
use chrono::Utc;
use libsql::{Connection, Row, params};
use tracing::{info, warn};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, role, password_hash, date_joined";
const TUTOR_COLUMNS: &str = "id, user_id, subject, hourly_rate_cents, availability, hours_taught";

fn user_from_row(row: &Row) -> Result<User, DomainError> {
    Ok(User {
        id: int(row, 0)?,
        username: text(row, 1)?,
        first_name: text(row, 2)?,
        last_name: text(row, 3)?,
        email: text(row, 4)?,
        role: parsed(row, 5)?,
        password_hash: text(row, 6)?,
        date_joined: timestamp(row, 7)?,
    })
}

/// Reads a tutor starting at column `at`.
fn tutor_from_row(row: &Row, at: i32) -> Result<Tutor, DomainError> {
    Ok(Tutor {
        id: int(row, at)?,
        user_id: int(row, at + 1)?,
        subject: text(row, at + 2)?,
        hourly_rate: Money::from_cents(int(row, at + 3)?),
        availability: text(row, at + 4)?,
        hours_taught: int(row, at + 5)?,
    })
}

/// Turns a unique-constraint failure on users into the matching field error.
fn unique_violation(e: libsql::Error) -> DomainError {
    let message = e.to_string();
    if message.contains("users.username") {
        FieldErrors::single("username", USERNAME_TAKEN_MESSAGE).into()
    } else if message.contains("users.email") {
        FieldErrors::single("email", EMAIL_TAKEN_MESSAGE).into()
    } else {
        DomainError::Repo(message)
    }
}

impl SqliteRepo {
    async fn user_where(
        &self,
        clause: &str,
        value: impl Into<libsql::Value> + Send,
    ) -> Result<Option<User>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let mut rows = conn
            .query(&sql, params![value.into()])
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => user_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn student_where(&self, clause: &str, id: i64) -> Result<Option<Student>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT id, user_id FROM students WHERE {clause}");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Student {
                id: int(&row, 0)?,
                user_id: int(&row, 1)?,
            })),
            None => Ok(None),
        }
    }

    async fn tutor_where(&self, clause: &str, id: i64) -> Result<Option<Tutor>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {TUTOR_COLUMNS} FROM tutors WHERE {clause}");
        let mut rows = conn.query(&sql, params![id]).await.map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => tutor_from_row(&row, 0).map(Some),
            None => Ok(None),
        }
    }
}

/// Inserts the user row and the profile row its role needs (none for admins).
async fn insert_account(
    conn: &Connection,
    user: &NewUser,
    password_hash: &str,
) -> Result<i64, DomainError> {
    conn.execute(
        r#"
        INSERT INTO users (username, first_name, last_name, email, role, password_hash, date_joined)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            user.username.as_str(),
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.email.as_str(),
            user.role.as_str(),
            password_hash,
            ts_text(Utc::now())
        ],
    )
    .await
    .map_err(unique_violation)?;
    let id = conn.last_insert_rowid();
    match user.role {
        Role::Student => {
            conn.execute("INSERT INTO students (user_id) VALUES (?1)", params![id])
                .await
                .map_err(repo_err)?;
        }
        Role::Tutor => {
            let profile = TutorProfile::default();
            conn.execute(
                r#"
                INSERT INTO tutors (user_id, subject, hourly_rate_cents, availability, hours_taught)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    id,
                    profile.subject.as_str(),
                    profile.hourly_rate.cents(),
                    profile.availability.as_str(),
                    profile.hours_taught
                ],
            )
            .await
            .map_err(repo_err)?;
        }
        Role::Admin => {}
    }
    Ok(id)
}

#[async_trait::async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        let id = match insert_account(&tx, user, password_hash).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "account rollback failed");
                }
                return Err(e);
            }
        };
        tx.commit().await.map_err(repo_err)?;
        info!(user_id = id, username = %user.username, role = %user.role, "user created");
        self.get_user(id)
            .await?
            .ok_or(DomainError::not_found("user", id))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        self.user_where("id = ?1", id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.user_where("username = ?1", username.to_string()).await
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<i64>,
    ) -> Result<bool, DomainError> {
        let n = self
            .scalar(
                "SELECT COUNT(*) FROM users WHERE username = ?1 AND (?2 IS NULL OR id != ?2)",
                params![username, except],
            )
            .await?;
        Ok(n > 0)
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool, DomainError> {
        let n = self
            .scalar(
                "SELECT COUNT(*) FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2)",
                params![email, except],
            )
            .await?;
        Ok(n > 0)
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                r#"
                UPDATE users SET username = ?2, first_name = ?3, last_name = ?4, email = ?5
                WHERE id = ?1
                "#,
                params![
                    id,
                    update.username.as_str(),
                    update.first_name.as_str(),
                    update.last_name.as_str(),
                    update.email.as_str()
                ],
            )
            .await
            .map_err(unique_violation)?;
        Ok(changed > 0)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                params![id, password_hash],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn count_users(&self) -> Result<u64, DomainError> {
        self.scalar("SELECT COUNT(*) FROM users", ()).await.map(count)
    }
}

#[async_trait::async_trait]
impl ProfileRepo for SqliteRepo {
    async fn student_for_user(&self, user_id: i64) -> Result<Option<Student>, DomainError> {
        self.student_where("user_id = ?1", user_id).await
    }

    async fn tutor_for_user(&self, user_id: i64) -> Result<Option<Tutor>, DomainError> {
        self.tutor_where("user_id = ?1", user_id).await
    }

    async fn get_student(&self, id: i64) -> Result<Option<Student>, DomainError> {
        self.student_where("id = ?1", id).await
    }

    async fn get_tutor(&self, id: i64) -> Result<Option<Tutor>, DomainError> {
        self.tutor_where("id = ?1", id).await
    }

    async fn list_students(&self) -> Result<Vec<StudentSummary>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT s.id, s.user_id, u.username, u.first_name || ' ' || u.last_name
                FROM students s JOIN users u ON u.id = s.user_id
                ORDER BY u.last_name, u.first_name, s.id
                "#,
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut students = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            students.push(StudentSummary {
                student: Student {
                    id: int(&row, 0)?,
                    user_id: int(&row, 1)?,
                },
                username: text(&row, 2)?,
                full_name: text(&row, 3)?,
            });
        }
        Ok(students)
    }

    async fn list_tutors(&self) -> Result<Vec<TutorSummary>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT t.id, t.user_id, t.subject, t.hourly_rate_cents, t.availability,
                       t.hours_taught, u.username, u.first_name || ' ' || u.last_name
                FROM tutors t JOIN users u ON u.id = t.user_id
                ORDER BY u.last_name, u.first_name, t.id
                "#,
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut tutors = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            tutors.push(TutorSummary {
                tutor: tutor_from_row(&row, 0)?,
                username: text(&row, 6)?,
                full_name: text(&row, 7)?,
            });
        }
        Ok(tutors)
    }

    async fn count_students(&self) -> Result<u64, DomainError> {
        self.scalar("SELECT COUNT(*) FROM students", ())
            .await
            .map(count)
    }

    async fn count_tutors(&self) -> Result<u64, DomainError> {
        self.scalar("SELECT COUNT(*) FROM tutors", ()).await.map(count)
    }

    async fn total_hours_taught(&self) -> Result<i64, DomainError> {
        self.scalar("SELECT COALESCE(SUM(hours_taught), 0) FROM tutors", ())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_repo::testing;
    use super::*;

    async fn set_hours_taught(repo: &SqliteRepo, user_id: i64, hours: i64) {
        repo.conn()
            .await
            .unwrap()
            .execute(
                "UPDATE tutors SET hours_taught = ?2 WHERE user_id = ?1",
                params![user_id, hours],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let (_dir, repo) = testing::repo().await;
        let created = testing::user(&repo, "@charlie", Role::Student).await;
        assert_eq!(created.role, Role::Student);
        assert_eq!(created.password_hash, "hash");

        let found = repo.find_by_username("@charlie").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.find_by_username("@nobody").await.unwrap().is_none());
        assert!(repo.get_user(9_999).await.unwrap().is_none());
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let (_dir, repo) = testing::repo().await;
        testing::user(&repo, "@charlie", Role::Student).await;
        let dup = NewUser {
            username: "@charlie".into(),
            first_name: "Other".into(),
            last_name: "Person".into(),
            email: "other@example.org".into(),
            role: Role::Student,
        };
        match repo.create_user(&dup, "hash").await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("username", USERNAME_TAKEN_MESSAGE))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn taken_checks_exclude_self() {
        let (_dir, repo) = testing::repo().await;
        let user = testing::user(&repo, "@janedoe", Role::Tutor).await;
        assert!(repo.username_taken("@janedoe", None).await.unwrap());
        assert!(!repo.username_taken("@janedoe", Some(user.id)).await.unwrap());
        assert!(repo.email_taken("janedoe@example.org", None).await.unwrap());
        assert!(!repo.email_taken("free@example.org", None).await.unwrap());
    }

    #[tokio::test]
    async fn update_profile_and_password() {
        let (_dir, repo) = testing::repo().await;
        let user = testing::user(&repo, "@janedoe", Role::Tutor).await;
        let update = ProfileUpdate {
            username: "@jane".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.org".into(),
        };
        assert!(repo.update_profile(user.id, &update).await.unwrap());
        assert!(repo.set_password_hash(user.id, "new-hash").await.unwrap());
        let reloaded = repo.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.username, "@jane");
        assert_eq!(reloaded.full_name(), "Jane Doe");
        assert_eq!(reloaded.password_hash, "new-hash");
        assert!(!repo.set_password_hash(9_999, "x").await.unwrap());
    }

    #[tokio::test]
    async fn profiles_are_created_with_users() {
        let (_dir, repo) = testing::repo().await;
        let s_user = testing::user(&repo, "@charlie", Role::Student).await;
        let t_user = testing::user(&repo, "@janedoe", Role::Tutor).await;
        let admin = testing::user(&repo, "@johndoe", Role::Admin).await;
        set_hours_taught(&repo, t_user.id, 12).await;

        let student = repo.student_for_user(s_user.id).await.unwrap().unwrap();
        assert_eq!(repo.get_student(student.id).await.unwrap(), Some(student));
        let tutor = repo.tutor_for_user(t_user.id).await.unwrap().unwrap();
        assert_eq!(repo.get_tutor(tutor.id).await.unwrap(), Some(tutor.clone()));
        assert_eq!(tutor.hourly_rate.to_string(), "30.00");
        assert!(repo.tutor_for_user(s_user.id).await.unwrap().is_none());
        assert!(repo.student_for_user(admin.id).await.unwrap().is_none());
        assert!(repo.tutor_for_user(admin.id).await.unwrap().is_none());

        let tutors = repo.list_tutors().await.unwrap();
        assert_eq!(tutors.len(), 1);
        assert_eq!(tutors[0].username, "@janedoe");
        assert_eq!(repo.count_students().await.unwrap(), 1);
        assert_eq!(repo.count_tutors().await.unwrap(), 1);
        assert_eq!(repo.total_hours_taught().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn failed_profile_insert_leaves_no_user() {
        let (_dir, repo) = testing::repo().await;
        repo.conn()
            .await
            .unwrap()
            .execute(
                r#"
                CREATE TRIGGER students_closed BEFORE INSERT ON students
                BEGIN SELECT RAISE(ABORT, 'students closed'); END
                "#,
                (),
            )
            .await
            .unwrap();
        let user = NewUser {
            username: "@charlie".into(),
            first_name: "Charlie".into(),
            last_name: "Johnson".into(),
            email: "charlie@example.org".into(),
            role: Role::Student,
        };
        assert!(matches!(
            repo.create_user(&user, "hash").await,
            Err(DomainError::Repo(_))
        ));
        assert_eq!(repo.count_users().await.unwrap(), 0);
        assert!(!repo.username_taken("@charlie", None).await.unwrap());

        repo.conn()
            .await
            .unwrap()
            .execute("DROP TRIGGER students_closed", ())
            .await
            .unwrap();
        let created = repo.create_user(&user, "hash").await.unwrap();
        assert!(repo.student_for_user(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn students_list_by_last_then_first_name() {
        let (_dir, repo) = testing::repo().await;
        for (username, first, last) in [
            ("@zed", "Zed", "Adams"),
            ("@amy", "Amy", "Brown"),
            ("@bob", "Bob", "Adams"),
        ] {
            repo.create_user(
                &NewUser {
                    username: username.into(),
                    first_name: first.into(),
                    last_name: last.into(),
                    email: format!("{first}@example.org"),
                    role: Role::Student,
                },
                "hash",
            )
            .await
            .unwrap();
        }
        let names: Vec<String> = repo
            .list_students()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.full_name)
            .collect();
        assert_eq!(names, ["Bob Adams", "Zed Adams", "Amy Brown"]);
        assert_eq!(repo.total_hours_taught().await.unwrap(), 0);
    }
}
