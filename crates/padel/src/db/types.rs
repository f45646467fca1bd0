/// Database record types for the club scheduling data

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Account role stored on a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    /// Parses a stored role value. Unknown values read back as students.
    pub fn parse(value: &str) -> Role {
        match value {
            "instructor" => Role::Instructor,
            _ => Role::Student,
        }
    }
}

/// Kind of event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Confirmation,
    Cancellation,
    Reminder,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Confirmation => "confirmation",
            EventKind::Cancellation => "cancellation",
            EventKind::Reminder => "reminder",
        }
    }

    /// Parses a stored event kind. Anything unrecognized falls back to Reminder.
    pub fn parse(value: &str) -> EventKind {
        match value {
            "confirmation" => EventKind::Confirmation,
            "cancellation" => EventKind::Cancellation,
            _ => EventKind::Reminder,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub skill_level: i64,
}

/// Input for creating a user row. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub role: Role,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub skill_level: i64,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueRecord {
    pub venue_id: i64,
    pub name: String,
    pub indoor_courts: i64,
    pub outdoor_courts: i64,
    /// Derived from `indoor_courts`, recomputed on every save.
    pub indoor: bool,
    pub surface: String,
    pub hourly_rate: i64,
}

#[derive(Debug, Clone)]
pub struct NewVenue<'a> {
    pub name: &'a str,
    pub indoor_courts: i64,
    pub outdoor_courts: i64,
    pub surface: &'a str,
    pub hourly_rate: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingTypeRecord {
    pub training_type_id: i64,
    pub name: String,
    pub category: String,
    pub duration_min: i64,
    pub min_skill: i64,
    pub max_skill: i64,
}

#[derive(Debug, Clone)]
pub struct NewTrainingType<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub duration_min: i64,
    pub min_skill: i64,
    pub max_skill: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassRecord {
    pub class_id: i64,
    pub description: String,
    pub instructor_id: i64,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    pub confirmed: bool,
    pub notified: bool,
    pub price: i64,
    pub training_type_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairingRecord {
    pub pairing_id: i64,
    pub description: String,
    pub class_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEntryRecord {
    pub entry_id: i64,
    pub description: String,
    pub venue_id: i64,
    pub user_id: i64,
    pub entry_date: NaiveDate,
    pub entry_time: NaiveTime,
    pub class_id: Option<i64>,
    pub pairing_id: Option<i64>,
}

impl WaitlistEntryRecord {
    /// An entry is unassigned while it references neither a class nor a pairing.
    pub fn is_unassigned(&self) -> bool {
        self.class_id.is_none() && self.pairing_id.is_none()
    }
}

/// Waitlist row joined with the display fields staff need when forming pairings.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEntryDetail {
    #[serde(flatten)]
    pub entry: WaitlistEntryRecord,
    pub student_name: String,
    pub student_email: String,
    pub venue_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub notification_id: i64,
    pub user_id: i64,
    pub event_kind: EventKind,
    pub class_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub sent_at: Option<NaiveDateTime>,
    pub sent: bool,
}

/// Class row joined with the names the notification templates need.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDetail {
    pub class_id: i64,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    pub price: i64,
    pub instructor_name: String,
    pub training_name: Option<String>,
}
