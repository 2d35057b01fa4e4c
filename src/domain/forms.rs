//! Form input as submitted by browsers and its validation into domain commands.
//!
//! Every field arrives as an optional string; blank means missing. Validation collects
//! all field errors before failing so a form can be re-rendered with every message at once.

use crate::domain::entities::{
    LessonUpdate, NewFeedback, NewStudentRequest, NewTutorRequest, NewUser, ProfileUpdate,
};
use crate::domain::errors::{FieldErrors, NON_FIELD, REQUIRED};
use crate::domain::values::{
    parse_date, parse_time, DayOfWeek, Frequency, LessonStatus, Level, Money, Role, UnknownChoice,
};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::LazyLock;

pub const USERNAME_MESSAGE: &str =
    "Username must consist of @ followed by at least three alphanumericals";
pub const PASSWORD_MESSAGE: &str =
    "Password must contain an uppercase character, a lowercase character, and a number";
pub const CONFIRMATION_MESSAGE: &str = "Confirmation does not match password.";
pub const PAIR_FIELDS_MESSAGE: &str = "Please fill all fields.";
pub const INVOICE_PARTIES_MESSAGE: &str = "Both student and tutor are required.";
pub const AMOUNT_DIGITS_MESSAGE: &str = "Ensure that there are no more than 10 digits in total.";
pub const USERNAME_TAKEN_MESSAGE: &str = "User with this Username already exists.";
pub const EMAIL_TAKEN_MESSAGE: &str = "User with this Email already exists.";

const NAME_MAX: usize = 50;
const USERNAME_MAX: usize = 30;
const SHORT_TEXT_MAX: usize = 255;
const DEFAULT_LOCATION: &str = "Online";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\w{3,}$").expect("username pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

// ─────────────────────────────────────────────────────────────────────────────
// Field helpers
// ─────────────────────────────────────────────────────────────────────────────

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    match filled(value) {
        Some(v) => Some(v.to_string()),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn bounded(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    max: usize,
) -> Option<String> {
    let v = required(errors, field, value)?;
    if v.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters."),
        );
        return None;
    }
    Some(v)
}

fn optional_text(value: &Option<String>) -> String {
    filled(value).unwrap_or_default().to_string()
}

fn choice<T>(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<T>
where
    T: FromStr<Err = UnknownChoice>,
{
    let raw = required(errors, field, value)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

fn time(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<NaiveTime> {
    let raw = required(errors, field, value)?;
    let parsed = parse_time(&raw);
    if parsed.is_none() {
        errors.add(field, "Enter a valid time.");
    }
    parsed
}

fn optional_date(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
) -> Option<NaiveDate> {
    let raw = filled(value)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.add(field, "Enter a valid date.");
    }
    parsed
}

fn minutes(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<u32> {
    let raw = required(errors, field, value)?;
    match raw.parse::<u32>() {
        Ok(0) => {
            errors.add(field, "Ensure this value is greater than or equal to 1.");
            None
        }
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            None
        }
    }
}

fn id(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            errors.add(
                field,
                "Select a valid choice. That choice is not one of the available choices.",
            );
            None
        }
    }
}

fn email(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    let raw = bounded(errors, field, value, SHORT_TEXT_MAX)?;
    if !EMAIL_RE.is_match(&raw) {
        errors.add(field, "Enter a valid email address.");
        return None;
    }
    Some(raw.to_lowercase())
}

fn username(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    let raw = bounded(errors, field, value, USERNAME_MAX)?;
    if !USERNAME_RE.is_match(&raw) {
        errors.add(field, USERNAME_MESSAGE);
        return None;
    }
    Some(raw)
}

/// Uppercase, lowercase and a digit, anywhere in the password.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Shared `new_password` / `password_confirmation` check. Passwords are not trimmed.
fn new_password(
    errors: &mut FieldErrors,
    password: &Option<String>,
    confirmation: &Option<String>,
) -> Option<String> {
    let password = match password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => {
            errors.add("new_password", REQUIRED);
            return None;
        }
    };
    if !is_strong_password(password) {
        errors.add("new_password", PASSWORD_MESSAGE);
    }
    if confirmation.as_deref() != Some(password) {
        errors.add("password_confirmation", CONFIRMATION_MESSAGE);
    }
    Some(password.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogInForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub new_password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// A validated sign-up: the user to create and the plain password to hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub user: NewUser,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(&self, role: Role) -> Result<SignUp, FieldErrors> {
        let mut errors = FieldErrors::new();
        let first_name = bounded(&mut errors, "first_name", &self.first_name, NAME_MAX);
        let last_name = bounded(&mut errors, "last_name", &self.last_name, NAME_MAX);
        let username = username(&mut errors, "username", &self.username);
        let email = email(&mut errors, "email", &self.email);
        let password = new_password(&mut errors, &self.new_password, &self.password_confirmation);

        match (first_name, last_name, username, email, password) {
            (Some(first_name), Some(last_name), Some(username), Some(email), Some(password)) => {
                errors.into_result(SignUp {
                    user: NewUser {
                        username,
                        first_name,
                        last_name,
                        email,
                        role,
                    },
                    password,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordForm {
    pub password: Option<String>,
    pub new_password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl PasswordForm {
    /// Checks the new password pair. The current password is verified by the account service.
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let current = self.password.clone().filter(|p| !p.is_empty());
        if current.is_none() {
            errors.add("password", REQUIRED);
        }
        let new = new_password(&mut errors, &self.new_password, &self.password_confirmation);
        match (current, new) {
            (Some(current), Some(new)) => errors.into_result((current, new)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let first_name = bounded(&mut errors, "first_name", &self.first_name, NAME_MAX);
        let last_name = bounded(&mut errors, "last_name", &self.last_name, NAME_MAX);
        let username = username(&mut errors, "username", &self.username);
        let email = email(&mut errors, "email", &self.email);
        match (first_name, last_name, username, email) {
            (Some(first_name), Some(last_name), Some(username), Some(email)) => {
                errors.into_result(ProfileUpdate {
                    username,
                    first_name,
                    last_name,
                    email,
                })
            }
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentRequestForm {
    pub language: Option<String>,
    pub frequency: Option<String>,
    pub day_of_week: Option<String>,
    pub preferred_time: Option<String>,
    pub difficulty: Option<String>,
    pub additional_details: Option<String>,
}

impl StudentRequestForm {
    pub fn validate(&self) -> Result<NewStudentRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let language = bounded(&mut errors, "language", &self.language, SHORT_TEXT_MAX);
        let frequency = choice::<Frequency>(&mut errors, "frequency", &self.frequency);
        let day_of_week = choice::<DayOfWeek>(&mut errors, "day_of_week", &self.day_of_week);
        let preferred_time = time(&mut errors, "preferred_time", &self.preferred_time);
        let difficulty = choice::<Level>(&mut errors, "difficulty", &self.difficulty);
        match (language, frequency, day_of_week, preferred_time, difficulty) {
            (
                Some(language),
                Some(frequency),
                Some(day_of_week),
                Some(preferred_time),
                Some(difficulty),
            ) => errors.into_result(NewStudentRequest {
                language,
                frequency,
                day_of_week,
                preferred_time,
                difficulty,
                additional_details: optional_text(&self.additional_details),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorRequestForm {
    pub languages: Option<String>,
    pub day_of_week: Option<String>,
    pub available_time: Option<String>,
    pub level_can_teach: Option<String>,
    pub additional_details: Option<String>,
}

impl TutorRequestForm {
    pub fn validate(&self) -> Result<NewTutorRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let languages = bounded(&mut errors, "languages", &self.languages, SHORT_TEXT_MAX);
        let day_of_week = choice::<DayOfWeek>(&mut errors, "day_of_week", &self.day_of_week);
        let available_time = time(&mut errors, "available_time", &self.available_time);
        let level_can_teach = choice::<Level>(&mut errors, "level_can_teach", &self.level_can_teach);
        match (languages, day_of_week, available_time, level_can_teach) {
            (Some(languages), Some(day_of_week), Some(available_time), Some(level_can_teach)) => {
                errors.into_result(NewTutorRequest {
                    languages,
                    day_of_week,
                    available_time,
                    level_can_teach,
                    additional_details: optional_text(&self.additional_details),
                })
            }
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lessons
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairForm {
    pub tutor_request_id: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<String>,
    pub location: Option<String>,
}

/// Admin's choice of tutor slot and lesson timing for a pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCommand {
    pub tutor_request_id: i64,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub location: String,
}

impl PairForm {
    pub fn validate(&self) -> Result<PairCommand, FieldErrors> {
        let (Some(tutor_request_id), Some(_), Some(_)) = (
            filled(&self.tutor_request_id),
            filled(&self.start_time),
            filled(&self.duration),
        ) else {
            return Err(FieldErrors::single(NON_FIELD, PAIR_FIELDS_MESSAGE));
        };

        let mut errors = FieldErrors::new();
        let tutor_request_id = id(&mut errors, "tutor_request_id", tutor_request_id);
        let start_time = time(&mut errors, "start_time", &self.start_time);
        let duration = minutes(&mut errors, "duration", &self.duration);
        match (tutor_request_id, start_time, duration) {
            (Some(tutor_request_id), Some(start_time), Some(duration)) => {
                errors.into_result(PairCommand {
                    tutor_request_id,
                    start_time,
                    duration,
                    location: filled(&self.location)
                        .unwrap_or(DEFAULT_LOCATION)
                        .to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Lesson edit form. `student` and `tutor` are accepted but never applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonForm {
    pub student: Option<String>,
    pub tutor: Option<String>,
    pub subject: Option<String>,
    pub day_of_week: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<String>,
    pub frequency: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

impl LessonForm {
    pub fn validate(&self) -> Result<LessonUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let subject = bounded(&mut errors, "subject", &self.subject, SHORT_TEXT_MAX);
        let day_of_week = choice::<DayOfWeek>(&mut errors, "day_of_week", &self.day_of_week);
        let start_time = time(&mut errors, "start_time", &self.start_time);
        let duration = minutes(&mut errors, "duration", &self.duration);
        let frequency = choice::<Frequency>(&mut errors, "frequency", &self.frequency);
        let status = choice::<LessonStatus>(&mut errors, "status", &self.status);
        match (subject, day_of_week, start_time, duration, frequency, status) {
            (
                Some(subject),
                Some(day_of_week),
                Some(start_time),
                Some(duration),
                Some(frequency),
                Some(status),
            ) => errors.into_result(LessonUpdate {
                subject,
                day_of_week,
                start_time,
                duration,
                frequency,
                status,
                location: filled(&self.location)
                    .unwrap_or(DEFAULT_LOCATION)
                    .to_string(),
            }),
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invoices & feedback
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceForm {
    pub student: Option<String>,
    pub tutor: Option<String>,
    pub amount: Option<String>,
    pub due_date: Option<String>,
}

/// Invoice fields with profile ids not yet checked against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub student_id: i64,
    pub tutor_id: i64,
    pub amount: Money,
    pub due_date: Option<NaiveDate>,
}

impl InvoiceForm {
    pub fn validate(&self) -> Result<InvoiceDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let (student_id, tutor_id) = match (filled(&self.student), filled(&self.tutor)) {
            (Some(student), Some(tutor)) => {
                (id(&mut errors, "student", student), id(&mut errors, "tutor", tutor))
            }
            _ => {
                errors.add(NON_FIELD, INVOICE_PARTIES_MESSAGE);
                (None, None)
            }
        };
        let amount = match required(&mut errors, "amount", &self.amount) {
            Some(raw) => match raw.parse::<Money>() {
                Ok(amount) if amount > Money::MAX => {
                    errors.add("amount", AMOUNT_DIGITS_MESSAGE);
                    None
                }
                Ok(amount) if amount.is_positive() => Some(amount),
                Ok(_) => {
                    errors.add("amount", "Ensure this value is greater than 0.");
                    None
                }
                Err(_) => {
                    errors.add("amount", "Enter a number.");
                    None
                }
            },
            None => None,
        };
        let due_date = optional_date(&mut errors, "due_date", &self.due_date);
        match (student_id, tutor_id, amount) {
            (Some(student_id), Some(tutor_id), Some(amount)) => errors.into_result(InvoiceDraft {
                student_id,
                tutor_id,
                amount,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<NewFeedback, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = bounded(&mut errors, "name", &self.name, 100);
        let email = email(&mut errors, "email", &self.email);
        let message = required(&mut errors, "message", &self.message);
        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => errors.into_result(NewFeedback {
                name,
                email,
                message,
            }),
            _ => Err(errors),
        }
    }
}
