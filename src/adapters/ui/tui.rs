//! Implements InputPort. Inquire-based operator menu.

use crate::adapters::ui::progress::seed_bar;
use crate::domain::DomainError;
use crate::domain::forms::SignUpForm;
use crate::ports::{ConsoleOutcome, InputPort};
use crate::usecases::Services;
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{InquireError, Password, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Serve,
    Seed,
    CreateAdmin,
    Exit,
}

impl MenuItem {
    const ALL: [MenuItem; 4] = [
        MenuItem::Serve,
        MenuItem::Seed,
        MenuItem::CreateAdmin,
        MenuItem::Exit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Serve => "Start web server",
            MenuItem::Seed => "Seed sample data",
            MenuItem::CreateAdmin => "Create admin account",
            MenuItem::Exit => "Exit",
        })
    }
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::InvalidState(format!("prompt aborted: {e}"))
}

/// Cyan prompts with a magenta cursor.
pub fn apply_theme() {
    let mut config = RenderConfig::default();
    config.prompt_prefix = Styled::new("?").with_fg(Color::LightCyan);
    config.highlighted_option_prefix = Styled::new(">").with_fg(Color::LightMagenta);
    config.selected_option = Some(StyleSheet::new().with_fg(Color::LightCyan));
    inquire::set_global_render_config(config);
}

/// Console adapter over the application services.
pub struct ConsoleMenu {
    services: Arc<Services>,
    seed_target: u64,
}

impl ConsoleMenu {
    pub fn new(services: Arc<Services>, seed_target: u64) -> Self {
        Self {
            services,
            seed_target,
        }
    }

    fn admin_form() -> Result<SignUpForm, DomainError> {
        let first_name = Text::new("First name:").prompt().map_err(prompt_error)?;
        let last_name = Text::new("Last name:").prompt().map_err(prompt_error)?;
        let username = Text::new("Username:")
            .with_help_message("@ followed by at least three letters or digits")
            .prompt()
            .map_err(prompt_error)?;
        let email = Text::new("Email:").prompt().map_err(prompt_error)?;
        // inquire asks twice and compares; the form re-checks the pair.
        let password = Password::new("Password:")
            .with_help_message("needs an uppercase letter, a lowercase letter and a digit")
            .prompt()
            .map_err(prompt_error)?;
        Ok(SignUpForm {
            first_name: Some(first_name),
            last_name: Some(last_name),
            username: Some(username),
            email: Some(email),
            new_password: Some(password.clone()),
            password_confirmation: Some(password),
        })
    }
}

#[async_trait]
impl InputPort for ConsoleMenu {
    async fn run(&self) -> Result<ConsoleOutcome, DomainError> {
        loop {
            let choice = Select::new("What next?", MenuItem::ALL.to_vec())
                .prompt()
                .map_err(prompt_error)?;
            let result = match choice {
                MenuItem::Serve => return Ok(ConsoleOutcome::Serve),
                MenuItem::Exit => return Ok(ConsoleOutcome::Exit),
                MenuItem::Seed => self.seed(self.seed_target).await,
                MenuItem::CreateAdmin => self.create_admin().await,
            };
            // Operator mistakes are shown and the menu comes back.
            if let Err(e) = result {
                warn!(error = %e, action = %choice, "console action failed");
                println!("{e}");
            }
        }
    }

    async fn create_admin(&self) -> Result<(), DomainError> {
        let form = Self::admin_form()?;
        let admin = self.services.accounts.create_admin(&form).await?;
        println!("Admin {} created.", admin.username);
        Ok(())
    }

    async fn seed(&self, target: u64) -> Result<(), DomainError> {
        let bar = seed_bar(target);
        let report = self
            .services
            .seed
            .seed(target, |current, _| bar.set_position(current))
            .await;
        bar.finish_and_clear();
        let report = report?;
        println!(
            "Seeded {} users ({} already present); {} users in total.",
            report.created, report.skipped, report.total_users
        );
        Ok(())
    }
}
