//! Sample data: the three fixture accounts plus generated students up to a target user count.

use crate::domain::{DomainError, NewUser, Role, User};
use crate::ports::{PasswordHasher, UserRepo};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_PASSWORD: &str = "Password123";

struct FixtureUser {
    username: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
}

const FIXTURES: &[FixtureUser] = &[
    FixtureUser {
        username: "@johndoe",
        email: "john.doe@example.org",
        first_name: "John",
        last_name: "Doe",
        role: Role::Admin,
    },
    FixtureUser {
        username: "@janedoe",
        email: "jane.doe@example.org",
        first_name: "Jane",
        last_name: "Doe",
        role: Role::Tutor,
    },
    FixtureUser {
        username: "@charlie",
        email: "charlie.johnson@example.org",
        first_name: "Charlie",
        last_name: "Johnson",
        role: Role::Student,
    },
];

const FIRST_NAMES: &[&str] = &[
    "Oliver", "Amelia", "Harry", "Isla", "George", "Ava", "Noah", "Mia", "Jack", "Ivy", "Leo",
    "Lily", "Oscar", "Freya", "Archie", "Florence", "Henry", "Willow", "Theo", "Rosie", "Alfie",
    "Sophia", "Charlie", "Evie", "Freddie", "Grace", "Arthur", "Poppy", "Thomas", "Ella",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Davies", "Evans", "Thomas",
    "Roberts", "Walker", "Wright", "Thompson", "Robinson", "White", "Hughes", "Edwards", "Green",
    "Hall", "Wood", "Harris", "Lewis", "Martin", "Jackson", "Clarke", "Clark", "Turner", "Hill",
    "Scott", "Cooper",
];

/// The `n`th generated student. Names repeat once every pair is used, then gain a numeric suffix.
fn generated_user(n: usize) -> NewUser {
    let first_name = FIRST_NAMES[n % FIRST_NAMES.len()];
    let last_name = LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()];
    let round = n / (FIRST_NAMES.len() * LAST_NAMES.len());
    let suffix = if round == 0 {
        String::new()
    } else {
        round.to_string()
    };
    NewUser {
        username: format!(
            "@{}{}{suffix}",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        email: format!("{first_name}.{last_name}{suffix}@example.org").to_lowercase(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: Role::Student,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: u64,
    pub skipped: u64,
    pub total_users: u64,
}

pub struct SeedService {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
}

impl SeedService {
    pub fn new(users: Arc<dyn UserRepo>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Creates the fixtures, then students until `target` users exist. `progress` gets
    /// `(current, target)` after every attempt. Safe to re-run: existing users are skipped.
    pub async fn seed<F>(&self, target: u64, progress: F) -> Result<SeedReport, DomainError>
    where
        F: Fn(u64, u64) + Send + Sync,
    {
        let hasher = Arc::clone(&self.hasher);
        // One hash for every seeded account; salts only protect real passwords.
        let hash = tokio::task::spawn_blocking(move || hasher.hash(DEFAULT_PASSWORD))
            .await
            .map_err(|e| DomainError::Repo(format!("hashing task failed: {e}")))??;

        let mut report = SeedReport::default();
        for fixture in FIXTURES {
            let user = NewUser {
                username: fixture.username.to_string(),
                email: fixture.email.to_string(),
                first_name: fixture.first_name.to_string(),
                last_name: fixture.last_name.to_string(),
                role: fixture.role,
            };
            self.try_create(&user, &hash, &mut report).await?;
        }

        let mut total = self.users.count_users().await?;
        let mut n = 0usize;
        while total < target {
            let user = generated_user(n);
            n += 1;
            if self.try_create(&user, &hash, &mut report).await?.is_some() {
                total += 1;
            }
            progress(total, target);
        }
        report.total_users = total;
        info!(
            created = report.created,
            skipped = report.skipped,
            total = total,
            "seeding complete"
        );
        Ok(report)
    }

    /// `Ok(None)` when the username or email is already in use.
    async fn try_create(
        &self,
        user: &NewUser,
        hash: &str,
        report: &mut SeedReport,
    ) -> Result<Option<User>, DomainError> {
        let created = match self.users.create_user(user, hash).await {
            Ok(created) => created,
            Err(DomainError::Validation(errors)) => {
                warn!(username = %user.username, %errors, "seed user skipped");
                report.skipped += 1;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        report.created += 1;
        Ok(Some(created))
    }
}
