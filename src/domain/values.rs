//! Value types shared by entities and forms: choice sets, money, wall-clock parsing.
//!
//! Choice inputs are matched case-insensitively and always stored lowercase.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Input that is not part of a choice set. Display text is the user-facing field message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice(pub String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Select a valid choice. {} is not one of the available choices.",
            self.0
        )
    }
}

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                match trimmed.to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownChoice(trimmed.to_string())),
                }
            }
        }
    };
}

choice_enum!(
    /// Account role. Decides which dashboard a user lands on and which routes they may use.
    Role {
        Student => "student",
        Tutor => "tutor",
        Admin => "admin",
    }
);

choice_enum!(
    DayOfWeek {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
        Sunday => "sunday",
    }
);

choice_enum!(
    Frequency {
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
    }
);

choice_enum!(
    /// Difficulty a student asks for, or the level a tutor can teach.
    Level {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

choice_enum!(
    StudentRequestStatus {
        Pending => "pending",
        Approved => "approved",
        Cancelled => "cancelled",
    }
);

choice_enum!(
    TutorRequestStatus {
        Available => "available",
        Busy => "busy",
        Scheduled => "scheduled",
        Cancelled => "cancelled",
    }
);

choice_enum!(
    LessonStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

choice_enum!(
    InvoiceStatus {
        Unpaid => "unpaid",
        Paid => "paid",
    }
);

impl InvoiceStatus {
    /// The status a "mark paid" toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            InvoiceStatus::Unpaid => InvoiceStatus::Paid,
            InvoiceStatus::Paid => InvoiceStatus::Unpaid,
        }
    }
}

/// Monetary amount in minor units (pence/cents). Rendered with two decimals, e.g. `150.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Largest storable amount: ten digits, two of them after the point.
    pub const MAX: Money = Money(99_999_999_99);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rejected decimal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAmount;

impl FromStr for Money {
    type Err = InvalidAmount;

    /// Accepts `150`, `150.5` and `150.00`; at most two fraction digits, no sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(InvalidAmount);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(InvalidAmount);
        }
        let whole: i64 = whole.parse().map_err(|_| InvalidAmount)?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| InvalidAmount)? * 10,
            _ => frac.parse().map_err(|_| InvalidAmount)?,
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Money)
            .ok_or(InvalidAmount)
    }
}

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"];

/// Parses a wall-clock time as typed into a form (`10:00`, `10:00:00`, `2:00 PM`).
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
}

/// Parses an ISO calendar date (`2024-12-31`).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_are_case_insensitive() {
        assert_eq!("Monday".parse::<DayOfWeek>(), Ok(DayOfWeek::Monday));
        assert_eq!(" WEEKLY ".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!(DayOfWeek::Friday.to_string(), "friday");
    }

    #[test]
    fn unknown_choice_message() {
        let err = "InvalidDay".parse::<DayOfWeek>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Select a valid choice. InvalidDay is not one of the available choices."
        );
    }

    #[test]
    fn money_parses_and_renders_two_decimals() {
        assert_eq!("150.00".parse::<Money>().unwrap().to_string(), "150.00");
        assert_eq!("150".parse::<Money>().unwrap().cents(), 15_000);
        assert_eq!("99.5".parse::<Money>().unwrap().to_string(), "99.50");
        assert!("abc".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("-5".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn money_checked_add_detects_overflow() {
        let big = Money::from_cents(i64::MAX - 1);
        assert_eq!(big.checked_add(Money::from_cents(2)), None);
        assert_eq!(
            Money::MAX.checked_add(Money::from_cents(1)),
            Some(Money::from_cents(10_000_000_000))
        );
    }

    #[test]
    fn money_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(20_000)).unwrap();
        assert_eq!(json, "\"200.00\"");
    }

    #[test]
    fn time_formats() {
        assert_eq!(parse_time("10:00"), NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(parse_time("11:00:00"), NaiveTime::from_hms_opt(11, 0, 0));
        assert_eq!(parse_time("2:00 PM"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_time("25:00:00"), None);
    }

    #[test]
    fn invoice_status_toggles() {
        assert_eq!(InvoiceStatus::Unpaid.toggled(), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::Paid.toggled(), InvoiceStatus::Unpaid);
    }
}
